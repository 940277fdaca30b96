use serde::Serialize;

use super::ReadError;

/// The 34401A reports an overloaded input as ±9.9E+37.
pub const OVERLOAD: f64 = 9.9e37;

/// Answer to `*IDN?`, e.g. `HEWLETT-PACKARD,34401A,0,11-5-2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ident {
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    pub firmware: String,
}

impl TryFrom<&str> for Ident {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let values: Vec<&str> = value.split(',').map(str::trim).collect();
        if values.len() == 4 && values.iter().all(|v| !v.is_empty()) {
            Ok(Self {
                manufacturer: String::from(values[0]),
                model: String::from(values[1]),
                serial: String::from(values[2]),
                firmware: String::from(values[3]),
            })
        } else {
            Err(value.to_string())
        }
    }
}

/// Parse one `:READ?` response line.
pub fn parse_reading(line: &str) -> Result<f64, ReadError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ReadError::Empty);
    }
    let value = line.parse::<f64>().map_err(|source| ReadError::Parse {
        line: line.to_string(),
        source,
    })?;
    if value.abs() >= OVERLOAD || !value.is_finite() {
        Err(ReadError::Overload)
    } else {
        Ok(value)
    }
}
