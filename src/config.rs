use std::time::Duration;

use crate::channel::InstrumentChannel;
use crate::measurement::MeasurementSetup;
use crate::proto::Result;
use crate::render::Renderer;
use crate::session::{Session, TimeoutPolicy};
use crate::window::{SampleWindow, WindowError};
use crate::{DEFAULT_BAUDRATE, DEFAULT_SETTLE_DELAY, DEFAULT_TIMEOUT, DEFAULT_TTY, DEFAULT_WINDOW};

/// Everything needed to open a measurement session. Fixed for its lifetime.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub port: String,
    pub baudrate: u32,
    pub timeout: Duration,
    pub settle: Duration,
    pub capacity: usize,
    pub setup: MeasurementSetup,
    pub on_timeout: TimeoutPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_TTY.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            timeout: DEFAULT_TIMEOUT,
            settle: DEFAULT_SETTLE_DELAY,
            capacity: DEFAULT_WINDOW,
            setup: MeasurementSetup::default(),
            on_timeout: TimeoutPolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Open the serial port with the configured timing.
    pub fn open_channel(&self) -> Result<InstrumentChannel> {
        Ok(InstrumentChannel::new(&self.port, self.baudrate, self.timeout)?
            .with_settle_delay(self.settle))
    }

    pub fn window(&self) -> std::result::Result<SampleWindow, WindowError> {
        SampleWindow::new(self.capacity)
    }

    /// Assemble a session around an already opened channel.
    pub fn session<R: Renderer>(
        &self,
        channel: InstrumentChannel,
        renderer: R,
    ) -> std::result::Result<Session<R>, WindowError> {
        Ok(Session::new(
            channel,
            self.window()?,
            self.setup,
            self.on_timeout,
            renderer,
        ))
    }
}
