pub mod analysis;
pub mod config;
pub mod db;
pub mod enrich;
pub mod error;
pub mod gaps;
pub mod market;
pub mod models;
pub mod opportunity;
pub mod report;
pub mod sentiment;
pub mod text;
pub mod themes;

pub use analysis::{analyze_reviews, AnalysisStore, Pipeline, ReviewSource};
pub use error::{AnalysisError, EnrichmentError};
pub use market::identify_market_gaps;
pub use models::{AnalysisResult, AppAnalysis, Gap, MarketGapReport, Review, Theme};
