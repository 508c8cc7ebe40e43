//! Green / Amber / Red risk bands

use crate::errors::{OutbreakError, Result};
use colored::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Three-level risk label attached to a district-week forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    Green,
    Amber,
    Red,
}

impl RiskBand {
    /// Display order used by every chart and count
    pub const ORDER: [RiskBand; 3] = [RiskBand::Green, RiskBand::Amber, RiskBand::Red];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Green => "Green",
            RiskBand::Amber => "Amber",
            RiskBand::Red => "Red",
        }
    }

    /// Terminal colour for this band
    pub fn color(&self) -> Color {
        match self {
            RiskBand::Green => Color::Green,
            RiskBand::Amber => Color::Yellow,
            RiskBand::Red => Color::Red,
        }
    }

    /// Position in [`RiskBand::ORDER`]
    pub fn index(&self) -> usize {
        match self {
            RiskBand::Green => 0,
            RiskBand::Amber => 1,
            RiskBand::Red => 2,
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskBand {
    type Err = OutbreakError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Ok(RiskBand::Green),
            "amber" => Ok(RiskBand::Amber),
            "red" => Ok(RiskBand::Red),
            _ => Err(OutbreakError::InvalidRiskBand(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("green".parse::<RiskBand>().unwrap(), RiskBand::Green);
        assert_eq!(" AMBER ".parse::<RiskBand>().unwrap(), RiskBand::Amber);
        assert_eq!("Red".parse::<RiskBand>().unwrap(), RiskBand::Red);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "Orange".parse::<RiskBand>().unwrap_err();
        assert!(err.to_string().contains("Orange"));
    }

    #[test]
    fn test_ordering_matches_display_order() {
        assert!(RiskBand::Green < RiskBand::Amber);
        assert!(RiskBand::Amber < RiskBand::Red);
        for (i, band) in RiskBand::ORDER.iter().enumerate() {
            assert_eq!(band.index(), i);
        }
    }

    #[test]
    fn test_json_uses_label() {
        let json = serde_json::to_string(&RiskBand::Amber).unwrap();
        assert_eq!(json, "\"Amber\"");
    }
}
