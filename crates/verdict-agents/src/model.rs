use std::time::Duration;

use async_trait::async_trait;
use verdict_models::SentimentMode;

use crate::claude_cli::{invoke_claude, ClaudeCliConfig};
use crate::error::AgentError;
use crate::parser::extract_string_list;
use crate::prompts;
use crate::providers::{QueryPlanner, RatingModel, SentimentModel, SummarizationModel};

/// A language model reached through the Claude CLI.
///
/// One instance serves one role; the same type implements every model seam
/// so roles differ only in the configured model name.
pub struct ClaudeModel {
    pub cli_config: ClaudeCliConfig,
    /// Upper bound handed to the query planner prompt.
    pub max_queries: usize,
}

impl ClaudeModel {
    pub fn new(model: String, timeout: Duration) -> Self {
        Self {
            cli_config: ClaudeCliConfig { model, timeout },
            max_queries: 3,
        }
    }

    pub fn with_max_queries(mut self, max_queries: usize) -> Self {
        self.max_queries = max_queries;
        self
    }
}

#[async_trait]
impl QueryPlanner for ClaudeModel {
    async fn plan(&self, subject: &str, context: &str) -> Result<Vec<String>, AgentError> {
        let system_prompt = prompts::query_planner_system_prompt(self.max_queries);
        let user_prompt = prompts::query_planner_prompt(subject, context);
        let raw_output = invoke_claude(&system_prompt, &user_prompt, &self.cli_config).await?;
        extract_string_list(&raw_output)
    }
}

#[async_trait]
impl SummarizationModel for ClaudeModel {
    async fn summarize(&self, title: &str, body: &str) -> Result<String, AgentError> {
        let system_prompt = prompts::summary_system_prompt();
        let user_prompt = prompts::summary_prompt(title, body);
        invoke_claude(&system_prompt, &user_prompt, &self.cli_config).await
    }
}

#[async_trait]
impl SentimentModel for ClaudeModel {
    async fn score(
        &self,
        corpus: &str,
        mode: SentimentMode,
        target_name: &str,
    ) -> Result<String, AgentError> {
        let system_prompt = prompts::sentiment_system_prompt(mode);
        let user_prompt = prompts::sentiment_prompt(corpus, mode, target_name);
        invoke_claude(&system_prompt, &user_prompt, &self.cli_config).await
    }
}

#[async_trait]
impl RatingModel for ClaudeModel {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
        let system_prompt = prompts::rating_system_prompt();
        invoke_claude(&system_prompt, prompt, &self.cli_config).await
    }
}
