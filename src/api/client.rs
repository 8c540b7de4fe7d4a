use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::models::{ApiError, ProxyRequest};

/// Outbound JSON fetch, the seam between the vendor clients and the network
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    async fn fetch_json(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone)]
enum FetchMode {
    Direct,
    /// POST `{url, headers}` to a read-url endpoint that performs the request for us
    Proxy { endpoint: String },
}

/// reqwest-backed fetcher
pub struct HttpFetcher {
    http_client: HttpClient,
    mode: FetchMode,
}

impl HttpFetcher {
    const TIMEOUT: Duration = Duration::from_secs(30);

    /// Request vendor URLs directly
    pub fn direct() -> Result<Self, ApiError> {
        Self::build(FetchMode::Direct)
    }

    /// Route every request through a read-url proxy endpoint
    pub fn via_proxy(endpoint: String) -> Result<Self, ApiError> {
        Self::build(FetchMode::Proxy { endpoint })
    }

    fn build(mode: FetchMode) -> Result<Self, ApiError> {
        let http_client = HttpClient::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| ApiError::Setup(e.to_string()))?;
        Ok(Self { http_client, mode })
    }

    fn transport_error(e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(e.to_string())
        }
    }

    /// Parse error response based on HTTP status code
    async fn handle_error_response(url: &str, status: reqwest::StatusCode, response: reqwest::Response) -> ApiError {
        let status_code = status.as_u16();
        let body_text = response.text().await.unwrap_or_default();

        match status_code {
            429 => {
                warn!("Rate limited fetching {}", url);
                ApiError::RateLimited(host_of(url))
            }
            _ => {
                error!("HTTP Error for {}: {} {}", url, status_code, body_text);
                let message = status.canonical_reason().unwrap_or("").to_string();
                ApiError::Http { status: status_code, message }
            }
        }
    }
}

#[async_trait]
impl PriceFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, ApiError> {
        let request = match &self.mode {
            FetchMode::Direct => headers
                .iter()
                .fold(self.http_client.get(url), |req, (name, value)| req.header(*name, *value)),
            FetchMode::Proxy { endpoint } => self.http_client.post(endpoint).json(&ProxyRequest {
                url,
                headers: headers.iter().copied().collect(),
            }),
        };

        debug!("Fetching {}", url);
        let response = request.send().await.map_err(Self::transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::handle_error_response(url, status, response).await);
        }

        let body = response.text().await.map_err(Self::transport_error)?;
        parse_body(url, &body)
    }
}

/// Decode a 200 body, surfacing an `{"Error": ...}` envelope as a vendor failure
pub fn parse_body(url: &str, body: &str) -> Result<Value, ApiError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        error!("Invalid JSON response for {}: {}", url, e);
        ApiError::Parse(e.to_string())
    })?;

    if let Some(message) = value.get("Error").and_then(Value::as_str) {
        error!("API Error for {}: {}", url, message);
        return Err(ApiError::Vendor(message.to_string()));
    }

    Ok(value)
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
