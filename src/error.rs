use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot analyze an empty review set")]
    NoReviews,
    #[error("no reviews found for app {0}")]
    NoReviewsForApp(String),
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("enrichment request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("enrichment service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("enrichment service returned no completion")]
    EmptyCompletion,
}
