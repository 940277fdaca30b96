use std::fmt::{self, Display};

use crate::measurement::{Mode, Setting};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ident,
    Reset,
    ClearStatus,
    Remote,
    Local,
    Configure {
        mode: Mode,
        range: Setting,
        resolution: Setting,
    },
    Nplc {
        mode: Mode,
        cycles: f64,
    },
    Read,
    /// Arbitrary SCPI line, sent verbatim.
    Raw(String),
}

impl Command {
    /// SCPI queries end in `?` and are answered with exactly one line.
    pub fn expects_response(&self) -> bool {
        match self {
            Command::Ident | Command::Read => true,
            Command::Raw(line) => line.trim_end().ends_with('?'),
            _ => false,
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Ident => f.write_str("*IDN?"),
            Command::Reset => f.write_str("*RST"),
            Command::ClearStatus => f.write_str("*CLS"),
            Command::Remote => f.write_str("SYST:REM"),
            Command::Local => f.write_str("SYST:LOC"),
            Command::Configure {
                mode,
                range,
                resolution,
            } => write!(f, "CONF:{} {},{}", mode.function(), range, resolution),
            Command::Nplc { mode, cycles } => write!(f, "{}:NPLC {}", mode.function(), cycles),
            Command::Read => f.write_str(":READ?"),
            Command::Raw(line) => f.write_str(line.trim()),
        }
    }
}
