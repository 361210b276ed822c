//! Network origin lookup over HTTP.
//!
//! Asks an echo service (ipify-compatible, `{"ip": "..."}`) for the public
//! address requests leave from. Caching and single-flight live in the domain
//! context cache; this client performs exactly one request per call.

use async_trait::async_trait;
use domain::services::NetworkOriginLookup;
use domain::LookupError;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct OriginResponse {
    ip: String,
}

pub struct HttpOriginLookup {
    client: Client,
    url: String,
}

impl HttpOriginLookup {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("org-audit/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

fn lookup_error(err: reqwest::Error) -> LookupError {
    if err.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Failed(err.to_string())
    }
}

#[async_trait]
impl NetworkOriginLookup for HttpOriginLookup {
    async fn lookup(&self) -> Result<String, LookupError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(lookup_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Failed(format!(
                "origin service returned {}",
                status
            )));
        }

        let body: OriginResponse = response.json().await.map_err(lookup_error)?;
        let ip = body.ip.trim();
        if ip.is_empty() {
            return Err(LookupError::Failed("empty address".to_string()));
        }

        tracing::debug!(origin = %ip, "Network origin resolved");
        Ok(ip.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds() {
        let lookup =
            HttpOriginLookup::new("https://api.ipify.org?format=json", Duration::from_secs(5));
        assert!(lookup.is_ok());
    }

    #[test]
    fn test_response_shape() {
        let body: OriginResponse = serde_json::from_str(r#"{"ip":"203.0.113.7"}"#).unwrap();
        assert_eq!(body.ip, "203.0.113.7");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_lookup_error() {
        let lookup =
            HttpOriginLookup::new("http://127.0.0.1:9/ip", Duration::from_millis(200)).unwrap();

        assert!(lookup.lookup().await.is_err());
    }
}
