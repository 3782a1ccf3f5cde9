use std::fmt;

use thiserror::Error;

/// Analysis stages whose failure fails the whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fundamentals,
    Sentiment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fundamentals => f.write_str("fundamentals"),
            Stage::Sentiment => f.write_str("sentiment"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Claude CLI error: {0}")]
    Cli(String),

    #[error("Model response parse error: {0}")]
    Parse(String),

    #[error("Model call timed out after {0} seconds")]
    Timeout(u64),

    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },

    #[error("{stage} stage failed: {message}")]
    Stage { stage: Stage, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        AgentError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Wrap any error as a failure of the given stage.
    pub fn stage(stage: Stage, source: impl fmt::Display) -> Self {
        AgentError::Stage {
            stage,
            message: source.to_string(),
        }
    }
}
