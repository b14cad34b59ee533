use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical provider identifiers used in descriptors, reports and quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Sina,
    Kitco,
    Alphavantage,
    Finnhub,
    Yahoo,
}

impl ProviderId {
    pub const ALL: [Self; 5] = [
        Self::Sina,
        Self::Kitco,
        Self::Alphavantage,
        Self::Finnhub,
        Self::Yahoo,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sina => "sina",
            Self::Kitco => "kitco",
            Self::Alphavantage => "alphavantage",
            Self::Finnhub => "finnhub",
            Self::Yahoo => "yahoo",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sina" => Ok(Self::Sina),
            "kitco" => Ok(Self::Kitco),
            "alphavantage" | "alpha_vantage" => Ok(Self::Alphavantage),
            "finnhub" => Ok(Self::Finnhub),
            "yahoo" => Ok(Self::Yahoo),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
