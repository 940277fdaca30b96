use futures::{FutureExt, SinkExt, StreamExt};
use log::{debug, info, warn};
use std::{io, pin::Pin, time::Duration};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::{SerialPortBuilderExt, StopBits};
use tokio_util::codec::Decoder;

use crate::measurement::{MeasurementSetup, Mode};
use crate::proto::{
    codec::ScpiCodec,
    command::Command,
    response::{parse_reading, Ident},
    ProtoError, ReadError, Result,
};
use crate::DEFAULT_SETTLE_DELAY;

trait AsyncReadWrite<S>: futures::Sink<S> + futures::Stream {}

impl<T, S> AsyncReadWrite<S> for T where T: futures::Sink<S> + futures::Stream {}

/// Request/response channel to one SCPI instrument.
#[allow(clippy::type_complexity)]
pub struct InstrumentChannel {
    stream: Pin<
        Box<
            dyn AsyncReadWrite<
                Command,
                Error = io::Error,
                Item = std::result::Result<String, io::Error>,
            >,
        >,
    >,
    timeout: Duration,
    settle: Duration,
    mode: Option<Mode>,
}

impl InstrumentChannel {
    /// Open the serial port (8N2). Fails immediately if the port is missing
    /// or not accessible.
    pub fn new(com: impl AsRef<str>, baudrate: u32, timeout: Duration) -> Result<Self> {
        let mut port = tokio_serial::new(com.as_ref(), baudrate)
            .stop_bits(StopBits::Two)
            .timeout(timeout)
            .open_native_async()?;

        #[cfg(unix)]
        port.set_exclusive(false)?;

        info!("Opened {} at {} baud", com.as_ref(), baudrate);
        Ok(Self::from_transport(port, timeout))
    }

    /// Wrap any byte transport, e.g. a TCP serial bridge or a fake in tests.
    pub fn from_transport<T>(io: T, timeout: Duration) -> Self
    where
        T: AsyncRead + AsyncWrite + 'static,
    {
        let stream = ScpiCodec::default().framed(io);

        Self {
            stream: Box::pin(stream),
            timeout,
            settle: DEFAULT_SETTLE_DELAY,
            mode: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_faked(
        response_lines: &[&str],
    ) -> (Self, std::sync::Arc<std::sync::Mutex<Vec<u8>>>) {
        let fake = crate::proto::fake::FakeBuffer::with_lines(response_lines);
        let written = fake.written();
        let channel =
            Self::from_transport(fake, Duration::from_millis(20)).with_settle_delay(Duration::ZERO);
        (channel, written)
    }

    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Currently configured measurement function, `None` after reset.
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Write one command. For queries, wait for exactly one response line.
    pub async fn send(&mut self, command: Command) -> Result<Option<String>> {
        let expects_response = command.expects_response();
        debug!("-> {}", command);
        self.stream.send(command).await?;
        if !expects_response {
            return Ok(None);
        }
        match tokio::time::timeout(self.timeout, self.stream.next()).await {
            Ok(Some(Ok(line))) => {
                debug!("<- {:?}", line);
                Ok(Some(line))
            }
            Ok(Some(Err(ioerr))) => Err(ioerr.into()),
            Ok(None) => Err(ProtoError::Abort),
            Err(_elapsed) => Err(ProtoError::Timeout(self.timeout)),
        }
    }

    /// Send a query and insist on a response line.
    async fn query(&mut self, command: Command) -> Result<String> {
        self.send(command)
            .await?
            .ok_or_else(|| ProtoError::Unexpected(String::new()))
    }

    /// Query device identification
    pub async fn ident(&mut self) -> Result<Ident> {
        let line = self.query(Command::Ident).await?;
        Ident::try_from(line.as_str()).map_err(ProtoError::Unexpected)
    }

    /// Reset device and clear status, then wait for it to settle.
    ///
    /// The device returns to its power-on function, so the configured
    /// mode is forgotten. Late answers to earlier queries are discarded.
    pub async fn reset(&mut self) -> Result<()> {
        self.send(Command::Reset).await?;
        self.send(Command::ClearStatus).await?;
        self.mode = None;
        tokio::time::sleep(self.settle).await;
        self.discard_input();
        Ok(())
    }

    /// Drop every line already received, so the next query is paired
    /// with its own answer.
    fn discard_input(&mut self) {
        while let Some(item) = self.stream.next().now_or_never() {
            match item {
                Some(Ok(line)) => debug!("Discarding stale response {:?}", line),
                Some(Err(err)) => {
                    warn!("Discarding unreadable input: {}", err);
                    break;
                }
                None => break,
            }
        }
    }

    /// Lock the front panel; required before measuring over RS-232.
    pub async fn set_remote_mode(&mut self) -> Result<()> {
        self.send(Command::Remote).await?;
        tokio::time::sleep(self.settle).await;
        Ok(())
    }

    /// Hand control back to the front panel.
    pub async fn set_local_mode(&mut self) -> Result<()> {
        self.send(Command::Local).await?;
        Ok(())
    }

    /// Select the measurement function. Responses are not checked.
    pub async fn configure(&mut self, setup: &MeasurementSetup) -> Result<()> {
        self.send(Command::Configure {
            mode: setup.mode,
            range: setup.range,
            resolution: setup.resolution,
        })
        .await?;
        match setup.nplc {
            Some(cycles) if setup.mode.supports_nplc() => {
                self.send(Command::Nplc {
                    mode: setup.mode,
                    cycles,
                })
                .await?;
            }
            Some(_) => debug!("{} has no integration time, NPLC ignored", setup.mode),
            None => {}
        }
        self.mode = Some(setup.mode);
        Ok(())
    }

    /// Trigger and fetch one reading.
    pub async fn read_value(&mut self) -> std::result::Result<f64, ReadError> {
        match self.send(Command::Read).await {
            Ok(Some(line)) => parse_reading(&line),
            Ok(None) | Err(ProtoError::Timeout(_)) => Err(ReadError::Empty),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::Setting;
    use crate::proto::fake::written_lines;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_get_id() {
        let (mut channel, written) =
            InstrumentChannel::new_faked(&["HEWLETT-PACKARD,34401A,0,11-5-2"]);
        let id = channel.ident().await.unwrap();
        assert_eq!(id.model, "34401A");
        assert_eq!(written_lines(&written), vec!["*IDN?"]);
    }

    #[tokio::test]
    async fn test_get_id_garbled() {
        let (mut channel, _) = InstrumentChannel::new_faked(&["34401A"]);
        assert!(matches!(
            channel.ident().await,
            Err(ProtoError::Unexpected(_))
        ));
    }

    #[tokio::test]
    async fn test_read_scientific() {
        let (mut channel, written) = InstrumentChannel::new_faked(&["1.234500E+00"]);
        assert_eq!(channel.read_value().await.unwrap(), 1.2345);
        assert_eq!(written_lines(&written), vec![":READ?"]);
    }

    #[tokio::test]
    async fn test_read_empty_line() {
        let (mut channel, _) = InstrumentChannel::new_faked(&[""]);
        assert!(matches!(channel.read_value().await, Err(ReadError::Empty)));
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let (mut channel, _) = InstrumentChannel::new_faked(&[]);
        assert!(matches!(channel.read_value().await, Err(ReadError::Empty)));
        assert!(matches!(
            channel.send(Command::Ident).await,
            Err(ProtoError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_read_garbage_then_value() {
        let (mut channel, _) = InstrumentChannel::new_faked(&["\u{fffd}1.2x", "0.5"]);
        assert!(matches!(
            channel.read_value().await,
            Err(ReadError::Parse { .. })
        ));
        assert_eq!(channel.read_value().await.unwrap(), 0.5);
    }

    #[tokio::test]
    async fn test_setup_commands() {
        let (mut channel, written) = InstrumentChannel::new_faked(&[]);
        channel.reset().await.unwrap();
        channel.set_remote_mode().await.unwrap();
        channel.configure(&MeasurementSetup::default()).await.unwrap();
        assert_eq!(channel.mode(), Some(Mode::VoltageDc));
        assert_eq!(
            written_lines(&written),
            vec!["*RST", "*CLS", "SYST:REM", "CONF:VOLT:DC DEF,DEF", "VOLT:DC:NPLC 0.2"]
        );

        channel.reset().await.unwrap();
        assert_eq!(channel.mode(), None);
    }

    #[tokio::test]
    async fn test_configure_without_nplc() {
        let (mut channel, written) = InstrumentChannel::new_faked(&[]);
        let setup = MeasurementSetup {
            mode: Mode::Frequency,
            range: Setting::Value(10.0),
            resolution: Setting::Min,
            nplc: Some(10.0),
        };
        channel.configure(&setup).await.unwrap();
        assert_eq!(written_lines(&written), vec!["CONF:FREQ 10,MIN"]);
        assert_eq!(channel.mode(), Some(Mode::Frequency));
    }

    #[tokio::test]
    async fn test_reset_discards_late_response() {
        let (host, mut device) = tokio::io::duplex(1024);
        let mut channel = InstrumentChannel::from_transport(host, Duration::from_millis(50))
            .with_settle_delay(Duration::ZERO);

        assert!(matches!(channel.read_value().await, Err(ReadError::Empty)));
        // Answer to the timed out query arrives after all.
        device.write_all(b"1.000000E+00\r\n").await.unwrap();
        channel.reset().await.unwrap();

        device.write_all(b"2.000000E+00\r\n").await.unwrap();
        assert_eq!(channel.read_value().await.unwrap(), 2.0);
    }
}
