use std::time::Duration;

use crate::ProviderId;

/// Request quota and transport timeout applied to one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub request_timeout: Duration,
}

impl ProviderPolicy {
    pub fn sina_default() -> Self {
        Self {
            provider_id: ProviderId::Sina,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
            request_timeout: Duration::from_secs(5),
        }
    }

    pub fn kitco_default() -> Self {
        Self {
            provider_id: ProviderId::Kitco,
            quota_window: Duration::from_secs(60),
            quota_limit: 30,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Free tier: 5 requests per minute.
    pub fn alphavantage_default() -> Self {
        Self {
            provider_id: ProviderId::Alphavantage,
            quota_window: Duration::from_secs(60),
            quota_limit: 5,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Free tier: 60 requests per minute.
    pub fn finnhub_default() -> Self {
        Self {
            provider_id: ProviderId::Finnhub,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn yahoo_default() -> Self {
        Self {
            provider_id: ProviderId::Yahoo,
            quota_window: Duration::from_secs(60),
            quota_limit: 30,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Sina => Self::sina_default(),
            ProviderId::Kitco => Self::kitco_default(),
            ProviderId::Alphavantage => Self::alphavantage_default(),
            ProviderId::Finnhub => Self::finnhub_default(),
            ProviderId::Yahoo => Self::yahoo_default(),
        }
    }
}
