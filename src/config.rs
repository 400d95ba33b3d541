//! Centralized configuration management for filingscope

use anyhow::{Context, Result};
use std::time::Duration;

/// Hard ceiling on page size; bounds document fan-out per request
pub const PAGE_SIZE_CEILING: usize = 50;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP client configuration
    pub http: HttpConfig,
    /// Upstream registry endpoints
    pub endpoints: Endpoints,
    /// Rate limiting configuration
    pub rate_limits: RateLimits,
    /// Document mining limits
    pub mining: MiningConfig,
    /// Resolver scoring thresholds
    pub resolver: ResolverConfig,
    /// Age after which the entity directory is reloaded (seconds)
    pub directory_ttl_seconds: u64,
    /// Largest page size a caller may request
    pub max_page_size: usize,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string; the registry requires a contact address in it
    pub user_agent: String,
}

/// Base URLs of the upstream registry hosts
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Host serving the entity directory and filing archives
    pub www_base: String,
    /// Host serving submissions indexes
    pub data_base: String,
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimits {
    /// Minimum delay between document downloads (milliseconds)
    pub document_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct MiningConfig {
    /// Deadline for a single document fetch (seconds)
    pub document_timeout_seconds: u64,
    /// Soft deadline for a whole mining batch (seconds)
    pub deadline_seconds: u64,
    /// Maximum number of filings scanned by a person search
    pub person_scan_limit: usize,
}

/// Scoring weights and thresholds for identifier resolution
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub ticker_exact: f64,
    pub ticker_prefix: f64,
    pub ticker_prefix_min: f64,
    pub ticker_prefix_step: f64,
    pub ticker_substring: f64,
    pub name_exact: f64,
    pub name_prefix: f64,
    pub name_prefix_min: f64,
    pub name_prefix_step: f64,
    pub name_substring: f64,
    pub name_token_overlap: f64,
    /// Runner-up within this distance of the top score makes a query ambiguous
    pub disambiguation_margin: f64,
    /// Candidates scoring below this are discarded
    pub relevance_floor: f64,
    /// Number of candidates returned (clamped to 5..=15)
    pub max_candidates: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "filingscope/0.1.0 (contact@example.com)".to_string(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            www_base: "https://www.sec.gov".to_string(),
            data_base: "https://data.sec.gov".to_string(),
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            document_delay_ms: 125,
        }
    }
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            document_timeout_seconds: 20,
            deadline_seconds: 60,
            person_scan_limit: 200,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ticker_exact: 100.0,
            ticker_prefix: 90.0,
            ticker_prefix_min: 60.0,
            ticker_prefix_step: 5.0,
            ticker_substring: 50.0,
            name_exact: 80.0,
            name_prefix: 70.0,
            name_prefix_min: 40.0,
            name_prefix_step: 0.5,
            name_substring: 30.0,
            name_token_overlap: 25.0,
            disambiguation_margin: 10.0,
            relevance_floor: 15.0,
            max_candidates: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            endpoints: Endpoints::default(),
            rate_limits: RateLimits::default(),
            mining: MiningConfig::default(),
            resolver: ResolverConfig::default(),
            directory_ttl_seconds: 6 * 60 * 60,
            max_page_size: PAGE_SIZE_CEILING,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let http = HttpConfig {
            timeout_seconds: parse_env_var("FILINGSCOPE_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.timeout_seconds),
            user_agent: std::env::var("FILINGSCOPE_USER_AGENT")
                .unwrap_or(defaults.http.user_agent),
        };

        let endpoints = Endpoints {
            www_base: std::env::var("FILINGSCOPE_WWW_BASE")
                .unwrap_or(defaults.endpoints.www_base),
            data_base: std::env::var("FILINGSCOPE_DATA_BASE")
                .unwrap_or(defaults.endpoints.data_base),
        };

        let rate_limits = RateLimits {
            document_delay_ms: parse_env_var("FILINGSCOPE_DOCUMENT_DELAY_MS")?
                .unwrap_or(defaults.rate_limits.document_delay_ms),
        };

        let mining = MiningConfig {
            document_timeout_seconds: parse_env_var("FILINGSCOPE_DOCUMENT_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.mining.document_timeout_seconds),
            deadline_seconds: parse_env_var("FILINGSCOPE_MINING_DEADLINE_SECONDS")?
                .unwrap_or(defaults.mining.deadline_seconds),
            person_scan_limit: parse_env_var("FILINGSCOPE_PERSON_SCAN_LIMIT")?
                .unwrap_or(defaults.mining.person_scan_limit),
        };

        let resolver = ResolverConfig {
            disambiguation_margin: parse_env_var("FILINGSCOPE_RESOLVER_MARGIN")?
                .unwrap_or(defaults.resolver.disambiguation_margin),
            relevance_floor: parse_env_var("FILINGSCOPE_RESOLVER_FLOOR")?
                .unwrap_or(defaults.resolver.relevance_floor),
            max_candidates: parse_env_var("FILINGSCOPE_RESOLVER_MAX_CANDIDATES")?
                .unwrap_or(defaults.resolver.max_candidates),
            ..defaults.resolver
        };

        Ok(Config {
            http,
            endpoints,
            rate_limits,
            mining,
            resolver,
            directory_ttl_seconds: parse_env_var("FILINGSCOPE_DIRECTORY_TTL_SECONDS")?
                .unwrap_or(defaults.directory_ttl_seconds),
            max_page_size: parse_env_var("FILINGSCOPE_MAX_PAGE_SIZE")?
                .unwrap_or(defaults.max_page_size),
        })
    }

    /// Get document download delay as Duration
    pub fn document_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limits.document_delay_ms)
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn document_timeout(&self) -> Duration {
        Duration::from_secs(self.mining.document_timeout_seconds)
    }

    pub fn mining_deadline(&self) -> Duration {
        Duration::from_secs(self.mining.deadline_seconds)
    }

    pub fn directory_ttl(&self) -> Duration {
        Duration::from_secs(self.directory_ttl_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // The registry's fair-access policy rejects anonymous clients
        if !self.http.user_agent.contains('@') {
            return Err(anyhow::anyhow!(
                "User agent must carry a contact address: '{}'",
                self.http.user_agent
            ));
        }

        if self.max_page_size == 0 || self.max_page_size > PAGE_SIZE_CEILING {
            return Err(anyhow::anyhow!(
                "Max page size must be between 1 and {}, got {}",
                PAGE_SIZE_CEILING,
                self.max_page_size
            ));
        }

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.rate_limits.document_delay_ms, 125);
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.directory_ttl(), Duration::from_secs(21600));
        assert_eq!(config.endpoints.data_base, "https://data.sec.gov");
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        config.validate().unwrap();

        let mut anonymous = Config::default();
        anonymous.http.user_agent = "filingscope/0.1.0".to_string();
        assert!(anonymous.validate().is_err());

        let mut oversized = Config::default();
        oversized.max_page_size = 500;
        assert!(oversized.validate().is_err());
    }
}
