use crate::models::{Feature, Gap, MvpFeatures, MvpOpportunityScore};

const WEIGHTS: [u32; 5] = [5, 4, 3, 2, 1];
const DEFAULT_SCORE: u8 = 6;
const SCORE_FLOOR: u8 = 5;
const DEFAULT_FEATURES: [&str; 3] = [
    "Intuitive onboarding",
    "Reliable core workflow",
    "Responsive support",
];

const CORE_TIER: std::ops::Range<usize> = 0..3;
const DIFFERENTIATOR_TIER: std::ops::Range<usize> = 3..5;
const POTENTIAL_TIER: std::ops::Range<usize> = 5..10;

pub fn mvp_opportunity_score(gaps: &[Gap], apps_analyzed: usize) -> MvpOpportunityScore {
    if gaps.is_empty() {
        return MvpOpportunityScore {
            score: DEFAULT_SCORE,
            reasoning: "Limited data available, so a moderate opportunity is assumed until more reviews are analyzed.".to_string(),
            base_features: DEFAULT_FEATURES.iter().map(|f| f.to_string()).collect(),
        };
    }

    let (weighted_sum, weight_total) = gaps
        .iter()
        .zip(WEIGHTS)
        .fold((0u32, 0u32), |(sum, total), (gap, weight)| {
            (sum + u32::from(gap.opportunity_score) * weight, total + weight)
        });
    let score = (f64::from(weighted_sum) / f64::from(weight_total))
        .round()
        .clamp(f64::from(SCORE_FLOOR), 10.0) as u8;

    MvpOpportunityScore {
        score,
        reasoning: format!(
            "{} Based on {} identified {} across {} analyzed {}.",
            band(score),
            gaps.len(),
            plural(gaps.len(), "gap", "gaps"),
            apps_analyzed,
            plural(apps_analyzed, "app", "apps"),
        ),
        base_features: gaps.iter().take(3).map(|gap| gap.feature.clone()).collect(),
    }
}

fn band(score: u8) -> &'static str {
    match score {
        8.. => "Strong market opportunity: competitors leave significant user needs unmet.",
        6..=7 => "Good market opportunity: several recurring complaints are not handled well.",
        4..=5 => "Moderate market opportunity: some user needs could be served better.",
        _ => "Limited market opportunity: existing apps cover most user needs.",
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

pub fn mvp_features(gaps: &[Gap]) -> MvpFeatures {
    let tier = |range: std::ops::Range<usize>, describe: fn(&Gap) -> String| -> Vec<Feature> {
        gaps.iter()
            .enumerate()
            .filter(|(rank, _)| range.contains(rank))
            .map(|(_, gap)| Feature {
                name: gap.feature.clone(),
                description: describe(gap),
                opportunity_score: gap.opportunity_score,
                pain_point: gap.pain_point.clone(),
            })
            .collect()
    };

    MvpFeatures {
        core: tier(CORE_TIER, |gap| {
            format!(
                "Addresses a key pain point: {} (opportunity score {}/10)",
                gap.pain_point, gap.opportunity_score
            )
        }),
        differentiators: tier(DIFFERENTIATOR_TIER, |gap| {
            format!(
                "Stand out by handling \"{}\" better than existing apps",
                gap.feature
            )
        }),
        potential: tier(POTENTIAL_TIER, |_| {
            "Consider for a future release".to_string()
        }),
    }
}
