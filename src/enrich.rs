//! Optional AI enrichment of a single app's analysis.
//!
//! The pipeline only ever sees the [`Enricher`] port. When no enricher is
//! configured, or the call fails or times out, `aiInsights` stays `None` and
//! the rest of the analysis is unaffected.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EnrichmentError;
use crate::models::{AiInsights, Review, StructuredInsights, Theme};

const MAX_SAMPLE_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRequest {
    pub review_sample: Vec<String>,
    pub positive_theme_words: Vec<String>,
    pub negative_theme_words: Vec<String>,
}

impl EnrichmentRequest {
    pub fn build<R: Rng + ?Sized>(
        reviews: &[Review],
        positive: &[Theme],
        negative: &[Theme],
        sample_size: usize,
        rng: &mut R,
    ) -> Self {
        Self {
            review_sample: sample_reviews(reviews, sample_size, rng),
            positive_theme_words: positive.iter().map(|t| t.word.clone()).collect(),
            negative_theme_words: negative.iter().map(|t| t.word.clone()).collect(),
        }
    }
}

/// Random subset of reviews rendered as `[rating★] title text`. Seed the rng
/// for reproducible samples.
pub fn sample_reviews<R: Rng + ?Sized>(
    reviews: &[Review],
    sample_size: usize,
    rng: &mut R,
) -> Vec<String> {
    reviews
        .choose_multiple(rng, sample_size)
        .map(|review| {
            let document: String = review
                .document()
                .trim()
                .chars()
                .take(MAX_SAMPLE_CHARS)
                .collect();
            format!("[{}★] {}", review.rating, document)
        })
        .collect()
}

#[async_trait]
pub trait Enricher: Send + Sync {
    fn name(&self) -> &str;

    async fn enrich(&self, request: &EnrichmentRequest) -> Result<AiInsights, EnrichmentError>;
}

/// Runs the enricher if there is one. Errors and timeouts are logged and
/// swallowed.
pub async fn enrich_or_none(
    enricher: Option<&dyn Enricher>,
    request: &EnrichmentRequest,
    timeout: Duration,
) -> Option<AiInsights> {
    let enricher = enricher?;
    debug!(
        enricher = enricher.name(),
        sample = request.review_sample.len(),
        "requesting ai insights"
    );

    match tokio::time::timeout(timeout, enricher.enrich(request)).await {
        Ok(Ok(insights)) => {
            info!(enricher = enricher.name(), "ai insights received");
            Some(insights)
        }
        Ok(Err(error)) => {
            warn!(enricher = enricher.name(), error = %error, "ai enrichment failed");
            None
        }
        Err(_) => {
            warn!(
                enricher = enricher.name(),
                timeout_secs = timeout.as_secs_f32(),
                "ai enrichment timed out"
            );
            None
        }
    }
}

/// Structured insights when the completion is a JSON object carrying at least
/// one known field, otherwise the raw text.
pub fn parse_insights(content: &str) -> AiInsights {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    match serde_json::from_str::<StructuredInsights>(body) {
        Ok(insights) if !insights.is_empty() => AiInsights::Structured(insights),
        _ => AiInsights::Raw {
            raw_insights: content.to_string(),
        },
    }
}

pub fn build_prompt(request: &EnrichmentRequest) -> String {
    format!(
        r#"You are a product strategist. Analyze these app store reviews and themes.

Return a JSON object with:
{{
  "painPoints": ["..."],
  "lovedFeatures": ["..."],
  "marketGaps": ["..."],
  "exploitableFeatures": ["..."],
  "recommendations": ["..."],
  "opportunityScore": 1-10,
  "scoreJustification": "..."
}}

POSITIVE THEMES: {positive}
NEGATIVE THEMES: {negative}

REVIEWS:
{reviews}"#,
        positive = request.positive_theme_words.join(", "),
        negative = request.negative_theme_words.join(", "),
        reviews = request.review_sample.join("\n"),
    )
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Chat-completions client for OpenAI and compatible endpoints.
pub struct OpenAiEnricher {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiEnricher {
    pub fn new(config: OpenAiConfig) -> Result<Self, EnrichmentError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[async_trait]
impl Enricher for OpenAiEnricher {
    fn name(&self) -> &str {
        "openai"
    }

    async fn enrich(&self, request: &EnrichmentRequest) -> Result<AiInsights, EnrichmentError> {
        let start = std::time::Instant::now();
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(request),
            }],
            temperature: 0.3,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(EnrichmentError::EmptyCompletion)?;

        debug!(
            model = %self.config.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            response_length = content.len(),
            "chat completion finished"
        );

        Ok(parse_insights(&content))
    }
}
