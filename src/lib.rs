//!
//! This library provides communication with a HP/Agilent 34401A digital multimeter
//! over its RS-232 port, and a live chart of the most recent readings.
//!
//! <br>
//!
//! # Details
//!
//! - You need a null-modem cable (or USB adapter) attached to the DMM, configured
//!   for 9600 baud, 8 data bits, no parity, two stop bits.
//!
//! - Basic setup and connection
//!
//!   ```no_run
//!   use hp34401ctrl::{InstrumentChannel, DEFAULT_BAUDRATE, DEFAULT_TIMEOUT};
//!   #[tokio::main]
//!   async fn main() -> hp34401ctrl::Result<()> {
//!       let path = "/dev/ttyUSB0".to_string();
//!       let mut channel = InstrumentChannel::new(&path, DEFAULT_BAUDRATE, DEFAULT_TIMEOUT)?;
//!       channel.set_remote_mode().await?;
//!       eprintln!("Connected to: {}\n", channel.ident().await?.model);
//!       Ok(())
//!   }
//!   ```
//!
//! # Supported devices
//!
//!  * HP 34401A
//!  * Agilent 34401A
//!

pub mod channel;
pub mod config;
pub mod measurement;
pub mod proto;
pub mod render;
pub mod session;
pub mod window;

pub use channel::InstrumentChannel;
pub use proto::{ProtoError, ReadError, Result};
pub use session::{run, Session};
pub use window::{Sample, SampleWindow};

use std::time::Duration;

#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/ttyUSB0";
#[cfg(windows)]
pub const DEFAULT_TTY: &str = "COM1";

/// Default Baudrate for the 34401A RS-232 interface.
pub const DEFAULT_BAUDRATE: u32 = 9600;

/// How long to wait for a single response line.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after reset and mode changes before the device accepts further commands.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Number of samples kept for the live chart.
pub const DEFAULT_WINDOW: usize = 500;
