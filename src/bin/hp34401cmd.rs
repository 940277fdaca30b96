#![deny(clippy::unwrap_used)]

use clap::builder::NonEmptyStringValueParser;
use clap::{arg, command, value_parser};
use hp34401ctrl::config::SessionConfig;
use hp34401ctrl::measurement::{MeasurementSetup, Mode, Setting};
use hp34401ctrl::proto::command::Command;
use hp34401ctrl::proto::{ReadError, Result};
use hp34401ctrl::render::TerminalRenderer;
use hp34401ctrl::session::TimeoutPolicy;
use hp34401ctrl::window::Sample;
use hp34401ctrl::{proto, run, InstrumentChannel, DEFAULT_BAUDRATE, DEFAULT_TTY};
use log::info;
use std::fmt;
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::process::exit;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Copy, Clone)]
pub enum OutputFormat {
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl clap::ValueEnum for OutputFormat {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Text, Self::Json]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Text => clap::builder::PossibleValue::new("text"),
            Self::Json => clap::builder::PossibleValue::new("json"),
        })
    }
}

fn mode_arg() -> clap::Arg {
    arg!(-m --mode <MODE> "Measurement function")
        .default_value("vdc")
        .value_parser(value_parser!(Mode))
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches =
        command!() // requires `cargo` feature
            .arg(
                arg!(
                    -p --device <PORT> "Port for RS-232 adapter"
                )
                .default_value(DEFAULT_TTY)
                .required(false)
                .value_parser(value_parser!(PathBuf)),
            )
            .arg(arg!(
                -d --debug ... "Turn debugging information on"
            ))
            .arg(
                arg!(
                    -b --baudrate <BAUDRATE> "Baudrate"
                )
                .default_value(DEFAULT_BAUDRATE.to_string())
                .value_parser(value_parser!(u32)),
            )
            .arg(
                arg!(
                    -t --timeout <MS> "Response timeout in milliseconds"
                )
                .default_value("10000")
                .value_parser(value_parser!(u64).range(1..)),
            )
            .subcommand(clap::Command::new("ident").about("Device identification"))
            .subcommand(clap::Command::new("reset").about("Reset device and clear status"))
            .subcommand(
                clap::Command::new("read")
                    .about("Take a single reading")
                    .arg(mode_arg())
                    .arg(
                        arg!(--"format" <fmt> "Output format")
                            .value_parser(value_parser!(OutputFormat)),
                    ),
            )
            .subcommand(
                clap::Command::new("scpi")
                    .about("Send a raw SCPI command, queries print the response")
                    .arg(
                        arg!(<command> "Command line, e.g. SYST:ERR?")
                            .value_parser(NonEmptyStringValueParser::new()),
                    ),
            )
            .subcommand(
                clap::Command::new("plot")
                    .about("Live chart of the most recent readings")
                    .arg(mode_arg())
                    .arg(
                        arg!(--range <RANGE> "Range: DEF (auto), MIN, MAX or a value")
                            .value_parser(Setting::from_str),
                    )
                    .arg(
                        arg!(--resolution <RES> "Resolution: DEF, MIN, MAX or a value")
                            .value_parser(Setting::from_str),
                    )
                    .arg(
                        arg!(--nplc <CYCLES> "Integration time in power line cycles")
                            .value_parser(value_parser!(f64)),
                    )
                    .arg(
                        arg!(-w --window <SAMPLES> "Number of samples shown")
                            .default_value("500")
                            .value_parser(value_parser!(usize)),
                    )
                    .arg(
                        arg!(--"on-timeout" <POLICY> "What to do when the device does not answer")
                            .default_value("reset")
                            .value_parser(value_parser!(TimeoutPolicy)),
                    )
                    .arg(
                        arg!(--width <COLS> "Chart width")
                            .default_value("140")
                            .value_parser(value_parser!(u32).range(32..)),
                    )
                    .arg(
                        arg!(--height <ROWS> "Chart height")
                            .default_value("40")
                            .value_parser(value_parser!(u32).range(3..)),
                    ),
            )
            .subcommand_required(true)
            .get_matches();

    init_logging(matches.get_count("debug"));

    match handle_args(&matches).await {
        Ok(()) => {}
        Err(e) => {
            let port = matches
                .get_one::<PathBuf>("device")
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            match e {
                proto::ProtoError::Serial(err) => {
                    if err.kind() == tokio_serial::ErrorKind::NoDevice
                        || matches!(err.kind(), tokio_serial::ErrorKind::Io(ErrorKind::NotFound))
                    {
                        eprintln!("{}: File not found", port);
                    } else {
                        eprintln!("I/O Error: {} [device: {}]", err, port);
                    }
                    exit(-1);
                }
                proto::ProtoError::Io(err) => {
                    if err.kind() == ErrorKind::NotFound {
                        eprintln!("{}: File not found", port);
                    } else {
                        eprintln!("I/O Error: {} [device: {}]", err, port);
                    }
                    exit(-1);
                }
                proto::ProtoError::Timeout(after) => {
                    eprintln!(
                        "No response from device within {:?}, check cable and baudrate",
                        after
                    );
                    exit(-2);
                }
                proto::ProtoError::Abort => {
                    eprintln!("Failed to communicate with device, aborting!");
                    exit(-1);
                }
                proto::ProtoError::Unexpected(line) => {
                    eprintln!(
                        "Received an unexpected response from device, aborting!: {:?}",
                        line
                    );
                    exit(-1);
                }
            }
        }
    }
}

fn init_logging(debug: u8) {
    let level = match debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn handle_args(matches: &clap::ArgMatches) -> Result<()> {
    let baud_rate = matches
        .get_one::<u32>("baudrate")
        .unwrap_or(&DEFAULT_BAUDRATE);
    let timeout = Duration::from_millis(*matches.get_one::<u64>("timeout").unwrap_or(&10000));

    if let Some(port_path) = matches.get_one::<PathBuf>("device") {
        let mut config = SessionConfig {
            port: port_path.to_string_lossy().to_string(),
            baudrate: *baud_rate,
            timeout,
            ..SessionConfig::default()
        };
        let mut channel = config.open_channel()?;

        info!("Connected to: {}", port_path.display());

        match matches.subcommand() {
            // Device ID
            Some(("ident", _args)) => {
                channel.set_remote_mode().await?;
                let ident = channel.ident().await?;
                channel.set_local_mode().await?;
                println!("Manufacturer: {}", ident.manufacturer);
                println!("Model: {}", ident.model);
                println!("Serial: {}", ident.serial);
                println!("Firmware: {}", ident.firmware);
            }
            // Reset
            Some(("reset", _)) => {
                channel.reset().await?;
                println!("OK");
            }
            // Single reading
            Some(("read", args)) => {
                let mode = *args.get_one::<Mode>("mode").unwrap_or(&Mode::VoltageDc);
                let format = args
                    .get_one::<OutputFormat>("format")
                    .unwrap_or(&OutputFormat::Text);
                read_once(&mut channel, mode, *format).await?;
            }
            // Raw command
            Some(("scpi", args)) => {
                if let Some(line) = args.get_one::<String>("command") {
                    channel.set_remote_mode().await?;
                    match channel.send(Command::Raw(line.clone())).await? {
                        Some(response) => println!("{}", response),
                        None => println!("OK"),
                    }
                }
            }
            // Live chart
            Some(("plot", args)) => {
                let mode = *args.get_one::<Mode>("mode").unwrap_or(&Mode::VoltageDc);
                let mut setup = if mode == Mode::VoltageDc {
                    MeasurementSetup::default()
                } else {
                    MeasurementSetup::new(mode)
                };
                if let Some(range) = args.get_one::<Setting>("range") {
                    setup.range = *range;
                }
                if let Some(resolution) = args.get_one::<Setting>("resolution") {
                    setup.resolution = *resolution;
                }
                if let Some(nplc) = args.get_one::<f64>("nplc") {
                    setup.nplc = Some(*nplc);
                }
                config.setup = setup;
                config.capacity = *args.get_one::<usize>("window").unwrap_or(&config.capacity);
                config.on_timeout = *args
                    .get_one::<TimeoutPolicy>("on-timeout")
                    .unwrap_or(&TimeoutPolicy::Reset);

                let renderer = TerminalRenderer::new(
                    *args.get_one::<u32>("width").unwrap_or(&140),
                    *args.get_one::<u32>("height").unwrap_or(&40),
                );
                let session = match config.session(channel, renderer) {
                    Ok(session) => session,
                    Err(err) => {
                        eprintln!("{}", err);
                        exit(-1);
                    }
                };
                match run(session).await? {}
            }
            _ => {
                eprintln!("Unknown subcommand");
            }
        }
    }

    Ok(())
}

async fn read_once(
    channel: &mut InstrumentChannel,
    mode: Mode,
    format: OutputFormat,
) -> Result<()> {
    channel.reset().await?;
    channel.set_remote_mode().await?;
    channel.configure(&MeasurementSetup::new(mode)).await?;
    let reading = channel.read_value().await;
    channel.set_local_mode().await?;

    let value = match reading {
        Ok(value) => value,
        Err(ReadError::Proto(err)) => return Err(err),
        Err(ReadError::Empty) => {
            eprintln!("No data returned");
            exit(-2);
        }
        Err(err) => {
            eprintln!("{}", err);
            exit(-2);
        }
    };

    let sample = Sample::now(value);
    match format {
        OutputFormat::Text => println!("{} {}", sample.value, mode.unit()),
        OutputFormat::Json => {
            let json = serde_json::to_string(&sample).map_err(io::Error::from)?;
            println!("{}", json);
        }
    }
    Ok(())
}
