use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info};

use crate::enrich::{self, Enricher, EnrichmentRequest};
use crate::error::AnalysisError;
use crate::gaps;
use crate::market;
use crate::models::{AnalysisResult, AppAnalysis, MarketGapReport, Review};
use crate::sentiment;
use crate::themes;

#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn reviews(&self, app_id: &str) -> Result<Vec<Review>>;
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn load(&self, app_id: &str) -> Result<Option<AnalysisResult>>;

    async fn save(&self, app_id: &str, result: &AnalysisResult) -> Result<()>;
}

/// Deterministic part of a single app's analysis. `ai_insights` is left
/// empty.
pub fn analyze_reviews(
    reviews: &[Review],
    now: DateTime<Utc>,
) -> Result<AnalysisResult, AnalysisError> {
    let sentiment_analysis = sentiment::bucket_reviews(reviews)?;
    let buckets = sentiment::partition(reviews);
    let positive_themes = themes::extract_themes(&buckets.positive);
    let negative_themes = themes::extract_themes(&buckets.negative);
    let market_gaps = gaps::identify_gaps(&positive_themes, &negative_themes);

    Ok(AnalysisResult {
        sentiment_analysis,
        positive_themes,
        negative_themes,
        market_gaps,
        ai_insights: None,
        review_count: reviews.len(),
        last_updated: now,
    })
}

pub struct Pipeline<'a> {
    source: &'a dyn ReviewSource,
    store: &'a dyn AnalysisStore,
    enricher: Option<&'a dyn Enricher>,
    ai_timeout: Duration,
    ai_sample_size: usize,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a dyn ReviewSource, store: &'a dyn AnalysisStore) -> Self {
        Self {
            source,
            store,
            enricher: None,
            ai_timeout: Duration::from_secs(30),
            ai_sample_size: 50,
        }
    }

    pub fn with_enricher(
        mut self,
        enricher: Option<&'a dyn Enricher>,
        timeout: Duration,
        sample_size: usize,
    ) -> Self {
        self.enricher = enricher;
        self.ai_timeout = timeout;
        self.ai_sample_size = sample_size;
        self
    }

    /// Cached analysis for `app_id`, recomputed when nothing is cached or
    /// `force_refresh` is set. Fresh results are written back to the store.
    pub async fn analyze_app<R: Rng>(
        &self,
        app_id: &str,
        force_refresh: bool,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<AppAnalysis> {
        if !force_refresh {
            if let Some(result) = self.store.load(app_id).await? {
                debug!(app_id, "analysis cache hit");
                return Ok(AppAnalysis {
                    app_id: app_id.to_string(),
                    result,
                });
            }
        }

        let reviews = self
            .source
            .reviews(app_id)
            .await
            .with_context(|| format!("failed to load reviews for {app_id}"))?;
        if reviews.is_empty() {
            return Err(AnalysisError::NoReviewsForApp(app_id.to_string()).into());
        }

        let analysis = analyze_reviews(&reviews, now)?;
        let ai_insights = match self.enricher {
            Some(enricher) => {
                let request = EnrichmentRequest::build(
                    &reviews,
                    &analysis.positive_themes,
                    &analysis.negative_themes,
                    self.ai_sample_size,
                    rng,
                );
                enrich::enrich_or_none(Some(enricher), &request, self.ai_timeout).await
            }
            None => None,
        };
        let result = AnalysisResult {
            ai_insights,
            ..analysis
        };

        info!(
            app_id,
            reviews = result.review_count,
            positive_themes = result.positive_themes.len(),
            negative_themes = result.negative_themes.len(),
            gaps = result.market_gaps.len(),
            enriched = result.ai_insights.is_some(),
            "app analyzed"
        );

        self.store
            .save(app_id, &result)
            .await
            .with_context(|| format!("failed to cache analysis for {app_id}"))?;

        Ok(AppAnalysis {
            app_id: app_id.to_string(),
            result,
        })
    }

    pub async fn analyze_apps<R: Rng>(
        &self,
        app_ids: &[String],
        force_refresh: bool,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Vec<AppAnalysis>> {
        let mut analyses = Vec::with_capacity(app_ids.len());
        for app_id in app_ids {
            analyses.push(self.analyze_app(app_id, force_refresh, rng, now).await?);
        }
        Ok(analyses)
    }

    pub async fn market_report<R: Rng>(
        &self,
        app_ids: &[String],
        force_refresh: bool,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<MarketGapReport> {
        let analyses = self.analyze_apps(app_ids, force_refresh, rng, now).await?;
        Ok(market::identify_market_gaps(&analyses, now))
    }
}
