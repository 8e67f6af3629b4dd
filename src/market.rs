use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::gaps::MAX_GAPS;
use crate::models::{AppAnalysis, Gap, MarketGapReport};
use crate::opportunity;

const MEDIUM_SCORE: u8 = 5;
const FALLBACK_GAPS: usize = 5;
const NEUTRAL_RATING: f64 = 3.0;

type MarketStrategy = fn(&[AppAnalysis]) -> Vec<Gap>;

/// Tried in order; the first strategy that yields any gap wins. The last one
/// always does.
const STRATEGIES: &[(&str, MarketStrategy)] = &[
    ("shared_complaints", shared_complaints),
    ("per_app_gaps", per_app_gaps),
    ("liked_but_improvable", liked_but_improvable),
    ("default_gap", default_gap),
];

#[derive(Debug, Default)]
struct MergedTheme {
    total_count: usize,
    mentions: BTreeMap<String, usize>,
    // keyed by app so the mean does not depend on input order
    ratings: BTreeMap<String, f64>,
}

impl MergedTheme {
    fn app_count(&self) -> usize {
        self.mentions.len()
    }
}

pub fn identify_market_gaps(apps: &[AppAnalysis], analysis_date: DateTime<Utc>) -> MarketGapReport {
    let apps_analyzed = distinct_apps(apps);
    let mut market_gaps = Vec::new();

    for (name, strategy) in STRATEGIES {
        market_gaps = strategy(apps);
        if !market_gaps.is_empty() {
            info!(
                strategy = *name,
                apps = apps_analyzed,
                gaps = market_gaps.len(),
                "market gaps identified"
            );
            break;
        }
        debug!(strategy = *name, "market gap strategy produced nothing");
    }

    market_gaps.sort_by(rank);
    market_gaps.truncate(MAX_GAPS);

    MarketGapReport {
        mvp_opportunity_score: opportunity::mvp_opportunity_score(&market_gaps, apps_analyzed),
        mvp_recommended_features: opportunity::mvp_features(&market_gaps),
        market_gaps,
        analysis_date,
        apps_analyzed,
    }
}

fn distinct_apps(apps: &[AppAnalysis]) -> usize {
    apps.iter()
        .map(|app| app.app_id.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

fn rank(a: &Gap, b: &Gap) -> Ordering {
    b.opportunity_score
        .cmp(&a.opportunity_score)
        .then_with(|| b.count.cmp(&a.count))
        .then_with(|| a.feature.cmp(&b.feature))
        .then_with(|| a.affected_apps.cmp(&b.affected_apps))
}

fn round_score(value: f64) -> u8 {
    value.round().clamp(0.0, 10.0) as u8
}

fn merge_negative_themes(apps: &[AppAnalysis]) -> HashMap<String, MergedTheme> {
    let mut merged: HashMap<String, MergedTheme> = HashMap::new();

    for app in apps {
        for theme in &app.result.negative_themes {
            let entry = merged.entry(theme.word.clone()).or_default();
            entry.total_count += theme.count;
            *entry.mentions.entry(app.app_id.clone()).or_insert(0) += theme.count;
            entry
                .ratings
                .insert(app.app_id.clone(), app.result.sentiment_analysis.average_score);
        }
    }

    merged
}

pub fn shared_complaints(apps: &[AppAnalysis]) -> Vec<Gap> {
    let mut merged: Vec<(String, MergedTheme)> = merge_negative_themes(apps).into_iter().collect();
    merged.sort_by(|a, b| b.1.total_count.cmp(&a.1.total_count).then_with(|| a.0.cmp(&b.0)));

    if distinct_apps(apps) >= 2 {
        if merged.iter().any(|(_, theme)| theme.app_count() >= 2) {
            merged.retain(|(_, theme)| theme.app_count() >= 2);
        } else {
            debug!("no complaint shared by two apps, keeping all complaints");
        }
    }

    merged
        .into_iter()
        .map(|(word, theme)| score_merged(word, theme))
        .collect()
}

fn score_merged(word: String, theme: MergedTheme) -> Gap {
    let app_count = theme.app_count();
    let user_impact = round_score(theme.total_count as f64 / 3.0);
    let market_spread = round_score(app_count as f64 * 2.5);
    let avg_rating = if theme.ratings.is_empty() {
        NEUTRAL_RATING
    } else {
        theme.ratings.values().sum::<f64>() / theme.ratings.len() as f64
    };
    let rating_factor = (5.0 - avg_rating) / 2.0;
    let opportunity_score = round_score(
        f64::from(user_impact) * 0.5 + f64::from(market_spread) * 0.2 + rating_factor * 3.0,
    )
    .max(MEDIUM_SCORE);
    let competition_gap = round_score(app_count as f64 * 2.0);

    let pain_point = if app_count > 1 {
        format!("Users of {app_count} competing apps complain about \"{word}\"")
    } else {
        format!("Users complain about \"{word}\"")
    };

    Gap {
        pain_point,
        count: theme.total_count,
        opportunity_score,
        user_impact: Some(user_impact),
        market_spread: Some(market_spread),
        competition_gap: Some(competition_gap),
        affected_apps: theme.mentions.keys().cloned().collect(),
        avg_competitor_rating: Some(avg_rating),
        user_mentions: theme.mentions,
        feature: word,
    }
}

pub fn per_app_gaps(apps: &[AppAnalysis]) -> Vec<Gap> {
    apps.iter()
        .flat_map(|app| {
            app.result.market_gaps.iter().map(move |gap| Gap {
                user_impact: Some(MEDIUM_SCORE),
                market_spread: Some(MEDIUM_SCORE),
                competition_gap: Some(MEDIUM_SCORE),
                affected_apps: vec![app.app_id.clone()],
                avg_competitor_rating: Some(app.result.sentiment_analysis.average_score),
                user_mentions: BTreeMap::from([(app.app_id.clone(), gap.count)]),
                ..gap.clone()
            })
        })
        .collect()
}

pub fn liked_but_improvable(apps: &[AppAnalysis]) -> Vec<Gap> {
    let mut merged: BTreeMap<String, (usize, BTreeMap<String, usize>)> = BTreeMap::new();
    for app in apps {
        for theme in &app.result.positive_themes {
            let (count, mentions) = merged.entry(theme.word.clone()).or_default();
            *count += theme.count;
            *mentions.entry(app.app_id.clone()).or_insert(0) += theme.count;
        }
    }

    let mut gaps: Vec<Gap> = merged
        .into_iter()
        .map(|(word, (count, mentions))| {
            let occurrences = mentions.len();
            Gap {
                pain_point: format!("Users like \"{word}\" but it could be improved"),
                count,
                opportunity_score: round_score(count as f64 / 3.0 * occurrences as f64),
                affected_apps: mentions.keys().cloned().collect(),
                user_mentions: mentions,
                feature: word,
                ..Gap::default()
            }
        })
        .collect();
    gaps.sort_by(rank);
    gaps.truncate(FALLBACK_GAPS);
    gaps
}

pub fn default_gap(_apps: &[AppAnalysis]) -> Vec<Gap> {
    vec![Gap {
        feature: "usability".to_string(),
        pain_point: "Users want a simpler, more reliable experience".to_string(),
        count: 0,
        opportunity_score: 7,
        user_impact: Some(MEDIUM_SCORE),
        market_spread: Some(MEDIUM_SCORE),
        competition_gap: Some(MEDIUM_SCORE),
        ..Gap::default()
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, SentimentStats, Theme};
    use chrono::TimeZone;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn themes(pairs: &[(&str, usize)]) -> Vec<Theme> {
        pairs
            .iter()
            .map(|(word, count)| Theme {
                word: word.to_string(),
                count: *count,
            })
            .collect()
    }

    fn app(
        app_id: &str,
        average_score: f64,
        positive: &[(&str, usize)],
        negative: &[(&str, usize)],
    ) -> AppAnalysis {
        let positive_themes = themes(positive);
        let negative_themes = themes(negative);
        AppAnalysis {
            app_id: app_id.to_string(),
            result: AnalysisResult {
                sentiment_analysis: SentimentStats {
                    positive: 1,
                    negative: 1,
                    neutral: 0,
                    total: 2,
                    average_score,
                    sentiment_ratio: 1.0,
                },
                market_gaps: crate::gaps::identify_gaps(&positive_themes, &negative_themes),
                positive_themes,
                negative_themes,
                ai_insights: None,
                review_count: 2,
                last_updated: date(),
            },
        }
    }

    #[test]
    fn shared_complaint_is_scored_across_apps() {
        let apps = vec![
            app("notes-a", 3.0, &[], &[("pricing", 4), ("ads", 9)]),
            app("notes-b", 3.0, &[], &[("pricing", 6), ("login", 2)]),
        ];
        let report = identify_market_gaps(&apps, date());
        assert_eq!(report.apps_analyzed, 2);
        assert_eq!(report.market_gaps.len(), 1);

        let gap = &report.market_gaps[0];
        assert_eq!(gap.feature, "pricing");
        assert_eq!(gap.count, 10);
        assert_eq!(gap.user_impact, Some(3));
        assert_eq!(gap.market_spread, Some(5));
        assert_eq!(gap.competition_gap, Some(4));
        assert_eq!(gap.opportunity_score, 6);
        assert_eq!(gap.affected_apps, vec!["notes-a", "notes-b"]);
        assert_eq!(gap.user_mentions.get("notes-b"), Some(&6));
        assert!(gap.pain_point.contains("2 competing apps"));
    }

    #[test]
    fn disjoint_complaints_keep_everything() {
        let apps = vec![
            app("notes-a", 2.0, &[], &[("ads", 9)]),
            app("notes-b", 4.0, &[], &[("login", 2)]),
        ];
        let report = identify_market_gaps(&apps, date());
        let features: Vec<&str> = report.market_gaps.iter().map(|g| g.feature.as_str()).collect();
        assert_eq!(features, vec!["ads", "login"]);
        // impact 3, spread 3, rating factor 1.5
        assert_eq!(report.market_gaps[0].opportunity_score, 7);
        assert_eq!(report.market_gaps[1].opportunity_score, 5);
        assert!(report.market_gaps[1].pain_point.starts_with("Users complain"));
    }

    #[test]
    fn single_app_never_filters_by_spread() {
        let apps = vec![app("solo", 1.0, &[], &[("crashes", 30), ("sync", 3)])];
        let report = identify_market_gaps(&apps, date());
        assert_eq!(report.apps_analyzed, 1);
        assert_eq!(report.market_gaps.len(), 2);
        // impact 10, spread 3, rating factor 2
        assert_eq!(report.market_gaps[0].opportunity_score, 10);
        assert_eq!(report.market_gaps[1].opportunity_score, 7);
    }

    #[test]
    fn scores_never_drop_below_medium() {
        let apps = vec![app("loved", 5.0, &[], &[("tiny", 1)])];
        let report = identify_market_gaps(&apps, date());
        assert_eq!(report.market_gaps[0].opportunity_score, MEDIUM_SCORE);
    }

    #[test]
    fn no_complaints_falls_back_to_per_app_gaps() {
        let apps = vec![
            app("calm-a", 4.5, &[("widgets", 6)], &[]),
            app("calm-b", 4.8, &[("themes", 2)], &[]),
        ];
        let report = identify_market_gaps(&apps, date());
        let features: Vec<&str> = report.market_gaps.iter().map(|g| g.feature.as_str()).collect();
        assert_eq!(features, vec!["widgets", "themes"]);
        let gap = &report.market_gaps[0];
        assert_eq!(gap.opportunity_score, 8);
        assert_eq!(gap.user_impact, Some(MEDIUM_SCORE));
        assert_eq!(gap.affected_apps, vec!["calm-a"]);
    }

    #[test]
    fn positive_fallback_weights_by_occurrences() {
        let mut a = app("calm-a", 4.5, &[("widgets", 3)], &[]);
        let mut b = app("calm-b", 4.5, &[("widgets", 3), ("offline", 3)], &[]);
        a.result.market_gaps.clear();
        b.result.market_gaps.clear();

        assert!(per_app_gaps(&[a.clone(), b.clone()]).is_empty());
        let gaps = liked_but_improvable(&[a, b]);
        assert_eq!(gaps[0].feature, "widgets");
        assert_eq!(gaps[0].count, 6);
        assert_eq!(gaps[0].opportunity_score, 4);
        assert_eq!(gaps[1].feature, "offline");
        assert_eq!(gaps[1].opportunity_score, 1);
    }

    #[test]
    fn nothing_to_analyze_yields_the_default_gap() {
        let report = identify_market_gaps(&[], date());
        assert_eq!(report.apps_analyzed, 0);
        assert_eq!(report.market_gaps.len(), 1);
        assert_eq!(report.market_gaps[0].feature, "usability");
        assert_eq!(report.market_gaps[0].opportunity_score, 7);
    }

    #[test]
    fn app_order_does_not_change_the_report() {
        let a = app("notes-a", 2.5, &[("fast", 2)], &[("pricing", 4), ("ads", 4)]);
        let b = app("notes-b", 3.5, &[], &[("ads", 4), ("pricing", 4), ("sync", 7)]);
        let forward = identify_market_gaps(&[a.clone(), b.clone()], date());
        let reverse = identify_market_gaps(&[b, a], date());
        assert_eq!(forward, reverse);
    }

    #[test]
    fn result_is_capped() {
        let negative: Vec<(String, usize)> = (0..15).map(|i| (format!("issue{i}x"), 3)).collect();
        let pairs: Vec<(&str, usize)> = negative.iter().map(|(w, c)| (w.as_str(), *c)).collect();
        let apps = vec![app("a", 2.0, &[], &pairs), app("b", 2.0, &[], &pairs)];
        let report = identify_market_gaps(&apps, date());
        assert_eq!(report.market_gaps.len(), MAX_GAPS);
    }
}
