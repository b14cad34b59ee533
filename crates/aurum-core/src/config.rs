//! Runtime configuration for acquisition cycles and provider credentials.
//!
//! Everything has a working default; environment variables overlay the
//! defaults through [`AcquisitionConfig::from_env`] and
//! [`ProviderCredentials::from_env`].

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::quality::QualityPolicy;
use crate::SeriesKey;

const DEFAULT_SERIES_KEY: &str = "xauusd-daily";
const DEFAULT_CACHE_DIR: &str = "data_cache";

/// Settings of one acquisition orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionConfig {
    pub series_key: SeriesKey,
    pub lookback_days: u32,
    pub cache_ttl: Duration,
    pub cache_dir: PathBuf,
    /// Upper bound on a single adapter call, network included.
    pub adapter_timeout: Duration,
    pub quality: QualityPolicy,
    /// A candidate scoring at least this ends the provider scan.
    pub early_exit_score: u8,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            series_key: SeriesKey::parse(DEFAULT_SERIES_KEY)
                .unwrap_or_else(|_| unreachable!("default series key is valid")),
            lookback_days: 365,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            adapter_timeout: Duration::from_secs(10),
            quality: QualityPolicy::default(),
            early_exit_score: 90,
        }
    }
}

impl AcquisitionConfig {
    /// Defaults overlaid with `AURUM_*` environment variables.
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = env_string("AURUM_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(hours) = env_parse::<u64>("AURUM_CACHE_TTL_HOURS") {
            config.cache_ttl = Duration::from_secs(hours.saturating_mul(3600));
        }
        if let Some(days) = env_parse::<u32>("AURUM_LOOKBACK_DAYS") {
            config.lookback_days = days;
        }
        if let Some(secs) = env_parse::<u64>("AURUM_ADAPTER_TIMEOUT_SECS") {
            config.adapter_timeout = Duration::from_secs(secs);
        }

        config
    }

    pub fn with_series_key(mut self, key: SeriesKey) -> Self {
        self.series_key = key;
        self
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    pub fn with_quality(mut self, quality: QualityPolicy) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_early_exit_score(mut self, score: u8) -> Self {
        self.early_exit_score = score.min(100);
        self
    }
}

/// API keys of the providers that need one.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub alphavantage_api_key: Option<String>,
    pub finnhub_api_key: Option<String>,
}

impl ProviderCredentials {
    /// Reads `AURUM_<PROVIDER>_API_KEY`, falling back to the provider's
    /// conventional variable name.
    pub fn from_env() -> Self {
        Self {
            alphavantage_api_key: env_string("AURUM_ALPHAVANTAGE_API_KEY")
                .or_else(|| env_string("ALPHA_VANTAGE_KEY")),
            finnhub_api_key: env_string("AURUM_FINNHUB_API_KEY")
                .or_else(|| env_string("FINNHUB_KEY")),
        }
    }

    pub fn with_alphavantage_key(mut self, key: impl Into<String>) -> Self {
        self.alphavantage_api_key = Some(key.into());
        self
    }

    pub fn with_finnhub_key(mut self, key: impl Into<String>) -> Self {
        self.finnhub_api_key = Some(key.into());
        self
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("alphavantage_api_key", &self.alphavantage_api_key.as_ref().map(|_| "<redacted>"))
            .field("finnhub_api_key", &self.finnhub_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = env_string(name)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring unparsable configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AcquisitionConfig::default();

        assert_eq!(config.series_key.as_str(), "xauusd-daily");
        assert_eq!(config.lookback_days, 365);
        assert_eq!(config.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(config.early_exit_score, 90);
        assert_eq!(config.quality.validity_floor, 60);
    }

    #[test]
    fn builder_clamps_early_exit_score() {
        let config = AcquisitionConfig::default().with_early_exit_score(250);
        assert_eq!(config.early_exit_score, 100);
    }

    #[test]
    fn credentials_debug_output_redacts_keys() {
        let credentials = ProviderCredentials::default().with_finnhub_key("secret-token");
        let rendered = format!("{credentials:?}");

        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
