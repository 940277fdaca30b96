use hp34401ctrl::{
    measurement::MeasurementSetup, InstrumentChannel, ReadError, DEFAULT_BAUDRATE,
    DEFAULT_TIMEOUT,
};

#[tokio::main]
async fn main() -> hp34401ctrl::Result<()> {
    let path = "/dev/ttyUSB0".to_string();
    let mut channel = InstrumentChannel::new(&path, DEFAULT_BAUDRATE, DEFAULT_TIMEOUT)?;
    channel.reset().await?;
    channel.set_remote_mode().await?;
    channel.configure(&MeasurementSetup::default()).await?;

    loop {
        match channel.read_value().await {
            Ok(value) => println!("Value: {}", value),
            Err(ReadError::Proto(err)) => return Err(err),
            Err(err) => println!("NO_DATA ({})", err),
        }
    }
}
