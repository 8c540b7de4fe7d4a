//! Chart resolution models

use std::fmt;
use std::str::FromStr;

/// Sampling density of a history series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Hourly,
    Daily,
}

/// Time span and density backing a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionConfig {
    pub days: u32,
    pub granularity: Granularity,
}

/// Requested chart span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    Month,
    Week,
    Day,
}

impl Resolution {
    pub fn config(self) -> ResolutionConfig {
        match self {
            Resolution::Month => ResolutionConfig { days: 30, granularity: Granularity::Daily },
            Resolution::Week => ResolutionConfig { days: 7, granularity: Granularity::Daily },
            Resolution::Day => ResolutionConfig { days: 1, granularity: Granularity::Hourly },
        }
    }

    /// Number of points a complete series at this resolution should carry
    pub fn expected_points(self) -> usize {
        let config = self.config();
        match config.granularity {
            Granularity::Hourly => config.days as usize * 24,
            Granularity::Daily => config.days as usize,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Month => "month",
            Resolution::Week => "week",
            Resolution::Day => "day",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "month" | "1m" | "30d" => Ok(Resolution::Month),
            "week" | "1w" | "7d" => Ok(Resolution::Week),
            "day" | "1d" | "24h" => Ok(Resolution::Day),
            _ => Err(format!("❌ Unknown resolution: '{}'. Supported: month, week, day", s)),
        }
    }
}
