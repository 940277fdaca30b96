use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

/// Measurement function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    VoltageDc,
    VoltageAc,
    CurrentDc,
    CurrentAc,
    Resistance,
    Frequency,
    Period,
}

impl Mode {
    /// SCPI function keyword, as used by `CONF:<function>`.
    pub fn function(&self) -> &'static str {
        match self {
            Mode::VoltageDc => "VOLT:DC",
            Mode::VoltageAc => "VOLT:AC",
            Mode::CurrentDc => "CURR:DC",
            Mode::CurrentAc => "CURR:AC",
            Mode::Resistance => "RES",
            Mode::Frequency => "FREQ",
            Mode::Period => "PER",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Mode::VoltageDc | Mode::VoltageAc => "V",
            Mode::CurrentDc | Mode::CurrentAc => "A",
            Mode::Resistance => "Ω",
            Mode::Frequency => "Hz",
            Mode::Period => "s",
        }
    }

    /// Integration time in power line cycles is only settable for
    /// the DC and resistance functions.
    pub fn supports_nplc(&self) -> bool {
        matches!(self, Mode::VoltageDc | Mode::CurrentDc | Mode::Resistance)
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::VoltageDc => f.write_str("V DC"),
            Mode::VoltageAc => f.write_str("V AC"),
            Mode::CurrentDc => f.write_str("A DC"),
            Mode::CurrentAc => f.write_str("A AC"),
            Mode::Resistance => f.write_str("Ohms"),
            Mode::Frequency => f.write_str("Frequency"),
            Mode::Period => f.write_str("Period"),
        }
    }
}

impl clap::ValueEnum for Mode {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            Self::VoltageDc,
            Self::VoltageAc,
            Self::CurrentDc,
            Self::CurrentAc,
            Self::Resistance,
            Self::Frequency,
            Self::Period,
        ]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::VoltageDc => clap::builder::PossibleValue::new("vdc"),
            Self::VoltageAc => clap::builder::PossibleValue::new("vac"),
            Self::CurrentDc => clap::builder::PossibleValue::new("adc"),
            Self::CurrentAc => clap::builder::PossibleValue::new("aac"),
            Self::Resistance => clap::builder::PossibleValue::new("ohms"),
            Self::Frequency => clap::builder::PossibleValue::new("freq"),
            Self::Period => clap::builder::PossibleValue::new("period"),
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid setting {0:?}, expected DEF, MIN, MAX or a number")]
pub struct ParseSettingError(String);

/// Numeric SCPI parameter for range and resolution hints.
///
/// `Default` selects autorange when used as range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Setting {
    #[default]
    Default,
    Min,
    Max,
    Value(f64),
}

impl Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Default => f.write_str("DEF"),
            Setting::Min => f.write_str("MIN"),
            Setting::Max => f.write_str("MAX"),
            Setting::Value(v) => write!(f, "{}", v),
        }
    }
}

impl FromStr for Setting {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEF" | "DEFAULT" | "AUTO" => Ok(Setting::Default),
            "MIN" => Ok(Setting::Min),
            "MAX" => Ok(Setting::Max),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0)
                .map(Setting::Value)
                .ok_or_else(|| ParseSettingError(s.to_string())),
        }
    }
}

/// Everything `configure` sends for one measurement session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementSetup {
    pub mode: Mode,
    pub range: Setting,
    pub resolution: Setting,
    /// Integration time in power line cycles, ignored for modes without NPLC.
    pub nplc: Option<f64>,
}

impl MeasurementSetup {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            range: Setting::Default,
            resolution: Setting::Default,
            nplc: None,
        }
    }
}

impl Default for MeasurementSetup {
    fn default() -> Self {
        Self {
            nplc: Some(0.2),
            ..Self::new(Mode::VoltageDc)
        }
    }
}
