//! HTTP adapters for the external data sources behind the pipeline seams.

pub mod alpha_vantage;
pub mod error;
pub mod exa;
pub mod tavily;

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

pub use alpha_vantage::AlphaVantageFundamentals;
pub use error::SourceError;
pub use exa::ExaNewsSearch;
pub use tavily::TavilySearch;

/// HTTP client shared by the adapters, with a per-request timeout.
pub fn http_client(timeout: Duration) -> Result<Client, SourceError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Read an API key from the environment.
pub fn api_key(var: &str) -> Result<String, SourceError> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(SourceError::Config(format!(
            "{var} environment variable not set"
        ))),
    }
}

/// Decode a JSON body, mapping HTTP failures to provider errors.
async fn read_json<T: DeserializeOwned>(
    provider: &str,
    response: Response,
) -> Result<T, SourceError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(SourceError::RateLimited(provider.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::api(
            provider,
            format!("HTTP {status}: {}", body.chars().take(200).collect::<String>()),
        ));
    }
    Ok(response.json().await?)
}
