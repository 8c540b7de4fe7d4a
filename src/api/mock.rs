//! Canned-response fetcher for tests

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::client::PriceFetcher;
use super::models::ApiError;

/// Answers by the first registered URL fragment that matches, and records every URL asked for
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<Vec<(String, Result<Value, ApiError>)>>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url_fragment: &str, response: Result<Value, ApiError>) {
        self.responses
            .lock()
            .unwrap()
            .push((url_fragment.to_string(), response));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PriceFetcher for MockFetcher {
    async fn fetch_json(&self, url: &str, _headers: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| Err(ApiError::Network(format!("no canned response for {}", url))))
    }
}
