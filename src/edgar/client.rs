//! HTTP transport for the registry hosts

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::{FilingError, Result};

/// Fetches a URL as text. Implemented over reqwest for production and by an
/// in-memory table in tests.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// reqwest client carrying the registry-mandated User-Agent
#[derive(Debug, Clone)]
pub struct EdgarClient {
    client: Client,
}

impl EdgarClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for EdgarClient {
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json,text/html,text/plain,*/*")
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FilingError::NotFound(url.to_string()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limited by registry while fetching {}", url);
        }
        if !status.is_success() {
            return Err(FilingError::UpstreamUnavailable(format!(
                "HTTP {} for {}",
                status, url
            )));
        }

        response.text().await.map_err(|e| transport_error(url, e))
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> FilingError {
    if err.is_timeout() {
        FilingError::Timeout(url.to_string())
    } else {
        FilingError::UpstreamUnavailable(format!("{}: {}", url, err))
    }
}
