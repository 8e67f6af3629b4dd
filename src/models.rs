use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub rating: u8,
    pub title: Option<String>,
    pub text: Option<String>,
    pub date: DateTime<Utc>,
}

impl Review {
    /// Title and body joined with a space; missing parts count as empty.
    pub fn document(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or(""),
            self.text.as_deref().unwrap_or("")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentStats {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub total: usize,
    pub average_score: f64,
    pub sentiment_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    pub feature: String,
    pub pain_point: String,
    pub count: usize,
    pub opportunity_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_impact: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_spread: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition_gap: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_apps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_competitor_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub user_mentions: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredInsights {
    #[serde(default)]
    pub pain_points: Vec<serde_json::Value>,
    #[serde(default)]
    pub loved_features: Vec<serde_json::Value>,
    #[serde(default)]
    pub market_gaps: Vec<serde_json::Value>,
    #[serde(default)]
    pub exploitable_features: Vec<serde_json::Value>,
    #[serde(default)]
    pub recommendations: Vec<serde_json::Value>,
    #[serde(default)]
    pub opportunity_score: Option<f64>,
    #[serde(default)]
    pub score_justification: Option<String>,
}

impl StructuredInsights {
    /// True when none of the known fields were filled in.
    pub fn is_empty(&self) -> bool {
        self.pain_points.is_empty()
            && self.loved_features.is_empty()
            && self.market_gaps.is_empty()
            && self.exploitable_features.is_empty()
            && self.recommendations.is_empty()
            && self.opportunity_score.is_none()
            && self.score_justification.is_none()
    }
}

// Raw must come first: every field of StructuredInsights is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AiInsights {
    Raw {
        #[serde(rename = "rawInsights")]
        raw_insights: String,
    },
    Structured(StructuredInsights),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub sentiment_analysis: SentimentStats,
    pub positive_themes: Vec<Theme>,
    pub negative_themes: Vec<Theme>,
    pub market_gaps: Vec<Gap>,
    pub ai_insights: Option<AiInsights>,
    pub review_count: usize,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppAnalysis {
    pub app_id: String,
    pub result: AnalysisResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MvpOpportunityScore {
    pub score: u8,
    pub reasoning: String,
    pub base_features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub name: String,
    pub description: String,
    pub opportunity_score: u8,
    pub pain_point: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MvpFeatures {
    pub core: Vec<Feature>,
    pub differentiators: Vec<Feature>,
    pub potential: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketGapReport {
    pub market_gaps: Vec<Gap>,
    pub analysis_date: DateTime<Utc>,
    pub apps_analyzed: usize,
    pub mvp_opportunity_score: MvpOpportunityScore,
    pub mvp_recommended_features: MvpFeatures,
}
