//! HTTP boundary to the Overpass query API
//!
//! One query, one POST, parsed elements back. Never retries internally:
//! retry policy belongs to the batch and retry layers above.

use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};

use crate::core::error::{Error, Result};
use crate::core::model::{RawElement, WireElement, WireResponse};
use crate::core::query::EndpointConfig;

/// Global HTTP client shared by every query
static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(format!("cityprint/{}", env!("CITYPRINT_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
});

/// Client for the Overpass query API
#[derive(Debug, Clone, Default)]
pub struct OverpassClient {
    config: EndpointConfig,
}

impl OverpassClient {
    /// Create a client against the default public endpoint
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client with a custom endpoint configuration
    pub fn with_config(config: EndpointConfig) -> Self {
        Self { config }
    }

    pub fn endpoint(&self) -> &str {
        &self.config.interpreter_url
    }

    /// Submit one Overpass QL query and return its typed elements.
    ///
    /// Fails with [`Error::HttpError`] (status attached) on non-success
    /// responses, [`Error::TimeoutError`] when the request exceeds the
    /// configured cap, [`Error::NetworkError`] on transport failure and
    /// [`Error::JsonError`] on an unparseable payload.
    pub async fn query(&self, ql: &str) -> Result<Vec<RawElement>> {
        let response = GLOBAL_CLIENT
            .post(&self.config.interpreter_url)
            .header("Content-Type", "text/plain")
            .timeout(self.config.request_timeout)
            .body(ql.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError {
                status: Some(status.as_u16()),
                message: format!("query rejected by {}", self.config.interpreter_url),
            });
        }

        let body = response.text().await?;
        let parsed: WireResponse = serde_json::from_str(&body)?;

        Ok(parsed
            .elements
            .into_iter()
            .filter_map(WireElement::into_element)
            .collect())
    }
}
