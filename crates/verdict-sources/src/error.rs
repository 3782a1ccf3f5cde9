use thiserror::Error;
use verdict_agents::AgentError;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error: {message}")]
    Api { provider: String, message: String },

    #[error("{0} rate limit reached")]
    RateLimited(String),

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SourceError {
    pub fn api(provider: &str, message: impl Into<String>) -> Self {
        SourceError::Api {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

impl From<SourceError> for AgentError {
    fn from(err: SourceError) -> Self {
        let provider = match &err {
            SourceError::Api { provider, .. } => provider.clone(),
            SourceError::RateLimited(provider) => provider.clone(),
            SourceError::Http(_) => "http".to_string(),
            SourceError::MissingData(_) | SourceError::Config(_) => "source".to_string(),
        };
        AgentError::provider(provider, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_provider_error() {
        let err: AgentError = SourceError::RateLimited("alpha_vantage".to_string()).into();
        match err {
            AgentError::Provider { provider, message } => {
                assert_eq!(provider, "alpha_vantage");
                assert!(message.contains("rate limit"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
