//! Intensity measure types.
//!
//! The actual ground-motion computation for an IMT is out of scope (it
//! belongs to a ground-motion-model implementation); this module only
//! carries the identifier and its canonical string form, since hazard
//! curves, GMFs and vulnerability functions are all keyed by it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Imt {
    Pga,
    Pgv,
    Sa(u32), // period in hundredths of a second, e.g. Sa(100) == SA(1.0)
}

impl Imt {
    pub fn period_seconds(self) -> f64 {
        match self {
            Imt::Pga | Imt::Pgv => 0.0,
            Imt::Sa(hundredths) => hundredths as f64 / 100.0,
        }
    }
}

impl fmt::Display for Imt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Imt::Pga => write!(f, "PGA"),
            Imt::Pgv => write!(f, "PGV"),
            Imt::Sa(hundredths) => write!(f, "SA({:.2})", *hundredths as f64 / 100.0),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized IMT string: {0}")]
pub struct ParseImtError(String);

impl FromStr for Imt {
    type Err = ParseImtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("PGA") {
            return Ok(Imt::Pga);
        }
        if s.eq_ignore_ascii_case("PGV") {
            return Ok(Imt::Pgv);
        }
        if let Some(inner) = s
            .strip_prefix("SA(")
            .or_else(|| s.strip_prefix("sa("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let period: f64 = inner.parse().map_err(|_| ParseImtError(s.to_string()))?;
            return Ok(Imt::Sa((period * 100.0).round() as u32));
        }
        Err(ParseImtError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_pga() {
        assert_eq!("PGA".parse::<Imt>().unwrap(), Imt::Pga);
        assert_eq!(Imt::Pga.to_string(), "PGA");
    }

    #[test]
    fn round_trips_sa_period() {
        let imt: Imt = "SA(0.3)".parse().unwrap();
        assert_eq!(imt, Imt::Sa(30));
        assert_eq!(imt.to_string(), "SA(0.30)");
        assert!((imt.period_seconds() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn rejects_unknown_imt() {
        assert!("BOGUS".parse::<Imt>().is_err());
    }
}
