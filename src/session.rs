use log::{info, warn};
use std::convert::Infallible;
use std::fmt;

use crate::channel::InstrumentChannel;
use crate::measurement::MeasurementSetup;
use crate::proto::{ReadError, Result};
use crate::render::{Frame, Renderer};
use crate::window::{Sample, SampleWindow};

/// What to do when a reading times out or comes back empty.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// Reset the device and restore remote mode and measurement setup.
    #[default]
    Reset,
    /// Just try again on the next cycle.
    Skip,
}

impl fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reset => f.write_str("reset"),
            Self::Skip => f.write_str("skip"),
        }
    }
}

impl clap::ValueEnum for TimeoutPolicy {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Reset, Self::Skip]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Reset => clap::builder::PossibleValue::new("reset"),
            Self::Skip => clap::builder::PossibleValue::new("skip"),
        })
    }
}

/// Result of a single poll cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// Reading stored and drawn.
    Sampled(Sample),
    /// No response; the timeout policy was applied.
    Missed,
    /// Response was not a usable number.
    Dropped,
    /// Reading was older than the latest sample.
    Rejected,
}

/// One measurement session: the channel, its sample window and where to draw.
pub struct Session<R> {
    channel: InstrumentChannel,
    window: SampleWindow,
    setup: MeasurementSetup,
    policy: TimeoutPolicy,
    renderer: R,
}

impl<R: Renderer> Session<R> {
    pub fn new(
        channel: InstrumentChannel,
        window: SampleWindow,
        setup: MeasurementSetup,
        policy: TimeoutPolicy,
        renderer: R,
    ) -> Self {
        Self {
            channel,
            window,
            setup,
            policy,
            renderer,
        }
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn channel(&mut self) -> &mut InstrumentChannel {
        &mut self.channel
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Bring the device into a known state and start with an empty window.
    pub async fn start(&mut self) -> Result<()> {
        self.prepare_device().await?;
        self.window.clear();
        info!(
            "Measuring {} ({} samples window)",
            self.setup.mode,
            self.window.capacity()
        );
        Ok(())
    }

    async fn prepare_device(&mut self) -> Result<()> {
        self.channel.reset().await?;
        self.channel.set_remote_mode().await?;
        self.channel.configure(&self.setup).await
    }

    /// Fetch one reading, store it and redraw.
    ///
    /// Only transport failures are returned; everything that costs a
    /// single sample is logged and reported as the outcome.
    pub async fn poll_once(&mut self) -> Result<PollOutcome> {
        let value = match self.channel.read_value().await {
            Ok(value) => value,
            Err(ReadError::Empty) => {
                warn!(
                    "Read error: no response from device within {:?}",
                    self.channel.timeout()
                );
                if self.policy == TimeoutPolicy::Reset {
                    self.prepare_device().await?;
                }
                return Ok(PollOutcome::Missed);
            }
            Err(err @ (ReadError::Parse { .. } | ReadError::Overload)) => {
                warn!("Dropped sample: {}", err);
                return Ok(PollOutcome::Dropped);
            }
            Err(ReadError::Proto(err)) => return Err(err),
        };

        let sample = Sample::now(value);
        if let Err(err) = self.window.push(sample) {
            warn!("Dropped sample: {}", err);
            return Ok(PollOutcome::Rejected);
        }
        log::debug!("value: {}", value);

        if let Some(frame) = Frame::from_window(&self.window, self.setup.mode) {
            if let Err(err) = self.renderer.render(&frame) {
                warn!("Redraw failed: {}", err);
            }
        }
        Ok(PollOutcome::Sampled(sample))
    }
}

/// Poll forever. Returns only if the transport fails.
pub async fn run<R: Renderer>(mut session: Session<R>) -> Result<Infallible> {
    session.start().await?;
    loop {
        session.poll_once().await?;
    }
}
