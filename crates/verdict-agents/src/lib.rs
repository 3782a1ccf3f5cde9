pub mod batch;
pub mod claude_cli;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod providers;
pub mod rating;
pub mod sentiment;

pub mod test_support;

pub use batch::{BatchExecutor, BatchProgress};
pub use error::{AgentError, Stage};
pub use model::ClaudeModel;
pub use orchestrator::AnalysisOrchestrator;
pub use providers::{
    ContextSearchProvider, FundamentalsProvider, NewsSearchProvider, QueryPlanner, RatingModel,
    SentimentModel, SummarizationModel,
};
pub use rating::{RatedVerdict, RatingEngine};
pub use sentiment::{SentimentProvider, SentimentSnapshot, SentimentSources};
