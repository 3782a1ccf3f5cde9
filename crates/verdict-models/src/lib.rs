pub mod analysis;
pub mod config;
pub mod news;
pub mod rating;

pub use analysis::AnalysisRecord;
pub use config::{
    BatchConfig, ExportConfig, ExportFormat, ModelsConfig, SentimentConfig, SourcesConfig,
    VerdictConfig,
};
pub use news::{NewsArticle, NewsHit, SentimentMode};
pub use rating::{ExtractionTier, Rating, RatingVerdict};
