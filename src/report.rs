use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::models::{AppAnalysis, MarketGapReport, Theme};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentComparison {
    pub app_id: String,
    pub positive_pct: f64,
    pub neutral_pct: f64,
    pub negative_pct: f64,
    pub average_score: f64,
    pub review_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeComparison {
    pub word: String,
    pub total: usize,
    pub mentions: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppComparison {
    pub sentiment: Vec<SentimentComparison>,
    pub positive_themes: Vec<ThemeComparison>,
    pub negative_themes: Vec<ThemeComparison>,
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64 * 1000.0).round() / 10.0
    }
}

fn theme_table<'a, F>(apps: &'a [AppAnalysis], themes_of: F) -> Vec<ThemeComparison>
where
    F: Fn(&'a AppAnalysis) -> &'a [Theme],
{
    let mut table: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for app in apps {
        for theme in themes_of(app) {
            *table
                .entry(theme.word.clone())
                .or_default()
                .entry(app.app_id.clone())
                .or_insert(0) += theme.count;
        }
    }

    let mut rows: Vec<ThemeComparison> = table
        .into_iter()
        .map(|(word, mentions)| ThemeComparison {
            total: mentions.values().sum(),
            word,
            mentions,
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.word.cmp(&b.word)));
    rows
}

pub fn compare_apps(apps: &[AppAnalysis]) -> AppComparison {
    let mut sentiment: Vec<SentimentComparison> = apps
        .iter()
        .map(|app| {
            let stats = &app.result.sentiment_analysis;
            SentimentComparison {
                app_id: app.app_id.clone(),
                positive_pct: percentage(stats.positive, stats.total),
                neutral_pct: percentage(stats.neutral, stats.total),
                negative_pct: percentage(stats.negative, stats.total),
                average_score: stats.average_score,
                review_count: stats.total,
            }
        })
        .collect();
    sentiment.sort_by(|a, b| a.app_id.cmp(&b.app_id));

    AppComparison {
        sentiment,
        positive_themes: theme_table(apps, |app| app.result.positive_themes.as_slice()),
        negative_themes: theme_table(apps, |app| app.result.negative_themes.as_slice()),
    }
}

pub fn build_report(apps: &[AppAnalysis], gaps: &MarketGapReport) -> String {
    let comparison = compare_apps(apps);
    let mut output = String::new();

    let _ = writeln!(output, "# Market Gap Report");
    let _ = writeln!(
        output,
        "Generated {} across {} apps",
        gaps.analysis_date.format("%Y-%m-%d %H:%M UTC"),
        gaps.apps_analyzed
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Sentiment");

    if comparison.sentiment.is_empty() {
        let _ = writeln!(output, "No apps analyzed.");
    } else {
        for row in &comparison.sentiment {
            let _ = writeln!(
                output,
                "- {}: {:.1}% positive, {:.1}% neutral, {:.1}% negative (avg {:.2} over {} reviews)",
                row.app_id,
                row.positive_pct,
                row.neutral_pct,
                row.negative_pct,
                row.average_score,
                row.review_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Complaints");

    if comparison.negative_themes.is_empty() {
        let _ = writeln!(output, "No recurring complaints.");
    } else {
        for row in comparison.negative_themes.iter().take(10) {
            let breakdown: Vec<String> = row
                .mentions
                .iter()
                .map(|(app_id, count)| format!("{app_id} {count}"))
                .collect();
            let _ = writeln!(
                output,
                "- {} ({} mentions: {})",
                row.word,
                row.total,
                breakdown.join(", ")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Market Gaps");

    for gap in &gaps.market_gaps {
        let _ = writeln!(
            output,
            "- {} (score {}/10): {}",
            gap.feature, gap.opportunity_score, gap.pain_point
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## MVP Opportunity: {}/10",
        gaps.mvp_opportunity_score.score
    );
    let _ = writeln!(output, "{}", gaps.mvp_opportunity_score.reasoning);

    let features = &gaps.mvp_recommended_features;
    for (heading, tier) in [
        ("Core", &features.core),
        ("Differentiators", &features.differentiators),
        ("Potential", &features.potential),
    ] {
        if tier.is_empty() {
            continue;
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "### {heading}");
        for feature in tier {
            let _ = writeln!(output, "- {}: {}", feature.name, feature.description);
        }
    }

    output
}
