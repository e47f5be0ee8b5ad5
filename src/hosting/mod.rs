//! Hosting facts lookup
//!
//! Green-hosting status and carbon.txt presence for a site's domain.
//! Lookups never fail a site: any network or decode problem degrades the
//! affected fact to `false` with a warning.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::models::HostingFacts;

/// Default green-hosting check endpoint; the domain is appended to it
pub const DEFAULT_GREEN_CHECK_ENDPOINT: &str = "https://api.thegreenwebfoundation.org/greencheck";

/// Source of hosting facts for a domain
pub trait HostingLookup: Send + Sync {
    fn lookup(&self, domain: &str) -> impl Future<Output = HostingFacts> + Send;
}

/// Response body of the green-hosting check
#[derive(Debug, Deserialize)]
struct GreenCheckResponse {
    #[serde(default)]
    green: bool,
}

/// Looks up hosting facts over HTTP
#[derive(Debug, Clone)]
pub struct HttpHostingLookup {
    client: reqwest::Client,
    green_check_endpoint: String,
}

impl HttpHostingLookup {
    pub fn new(green_check_endpoint: &str, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(format!("webfootprint/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            green_check_endpoint: green_check_endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn check_green(&self, domain: &str) -> bool {
        let url = format!("{}/{}", self.green_check_endpoint, domain);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Green hosting check failed for {}: {}", domain, e);
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                "Green hosting check for {} returned {}",
                domain,
                response.status()
            );
            return false;
        }

        match response.json::<GreenCheckResponse>().await {
            Ok(body) => body.green,
            Err(e) => {
                tracing::warn!("Unreadable green hosting response for {}: {}", domain, e);
                false
            }
        }
    }

    async fn check_carbon_txt(&self, domain: &str) -> bool {
        let url = format!("https://{}/carbon.txt", domain);

        match self.client.head(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("carbon.txt check failed for {}: {}", domain, e);
                false
            }
        }
    }
}

impl HostingLookup for HttpHostingLookup {
    async fn lookup(&self, domain: &str) -> HostingFacts {
        let (green_hosted, carbon_txt_found) =
            tokio::join!(self.check_green(domain), self.check_carbon_txt(domain));

        tracing::info!(
            "Hosting for {}: green={}, carbon.txt={}",
            domain,
            green_hosted,
            carbon_txt_found
        );

        HostingFacts {
            green_hosted,
            carbon_txt_found,
            ..HostingFacts::unknown(domain)
        }
    }
}

/// Skips the network and reports every domain as unknown (all `false`)
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLookup;

impl HostingLookup for OfflineLookup {
    async fn lookup(&self, domain: &str) -> HostingFacts {
        tracing::debug!("Hosting lookup skipped for {}", domain);
        HostingFacts::unknown(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_lookup_is_unknown() {
        let facts = OfflineLookup.lookup("giske.kommune.no").await;
        assert_eq!(facts.domain, "giske.kommune.no");
        assert!(!facts.green_hosted);
        assert!(!facts.carbon_txt_found);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades_to_false() {
        // Port 9 on localhost refuses connections, so both checks fail fast.
        let lookup = HttpHostingLookup::new("http://127.0.0.1:9/greencheck", 2).unwrap();
        assert!(!lookup.check_green("localhost").await);
    }

    #[test]
    fn test_green_check_response_parsing() {
        let body: GreenCheckResponse =
            serde_json::from_str(r#"{"url":"a.no","green":true,"hosted_by":"x"}"#).unwrap();
        assert!(body.green);

        let body: GreenCheckResponse = serde_json::from_str(r#"{"url":"a.no"}"#).unwrap();
        assert!(!body.green);
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let lookup = HttpHostingLookup::new("https://example.org/greencheck/", 5).unwrap();
        assert_eq!(lookup.green_check_endpoint, "https://example.org/greencheck");
    }
}
