use crate::error::AnalysisError;
use crate::models::{Review, SentimentStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Positive,
    Neutral,
    Negative,
}

pub fn bucket_for(rating: u8) -> Bucket {
    match rating {
        4.. => Bucket::Positive,
        3 => Bucket::Neutral,
        _ => Bucket::Negative,
    }
}

/// Reviews split by rating bucket, borrowed from the input.
#[derive(Debug, Default)]
pub struct Buckets<'a> {
    pub positive: Vec<&'a Review>,
    pub neutral: Vec<&'a Review>,
    pub negative: Vec<&'a Review>,
}

pub fn partition(reviews: &[Review]) -> Buckets<'_> {
    let mut buckets = Buckets::default();
    for review in reviews {
        match bucket_for(review.rating) {
            Bucket::Positive => buckets.positive.push(review),
            Bucket::Neutral => buckets.neutral.push(review),
            Bucket::Negative => buckets.negative.push(review),
        }
    }
    buckets
}

pub fn bucket_reviews(reviews: &[Review]) -> Result<SentimentStats, AnalysisError> {
    if reviews.is_empty() {
        return Err(AnalysisError::NoReviews);
    }

    let buckets = partition(reviews);
    let total = reviews.len();
    let rating_sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    let positive = buckets.positive.len();
    let negative = buckets.negative.len();

    Ok(SentimentStats {
        positive,
        negative,
        neutral: buckets.neutral.len(),
        total,
        average_score: rating_sum as f64 / total as f64,
        sentiment_ratio: positive as f64 / negative.max(1) as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rated(ratings: &[u8]) -> Vec<Review> {
        ratings
            .iter()
            .enumerate()
            .map(|(i, &rating)| Review {
                id: format!("r{i}"),
                rating,
                title: None,
                text: None,
                date: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn buckets_follow_rating_bands() {
        assert_eq!(bucket_for(5), Bucket::Positive);
        assert_eq!(bucket_for(4), Bucket::Positive);
        assert_eq!(bucket_for(3), Bucket::Neutral);
        assert_eq!(bucket_for(2), Bucket::Negative);
        assert_eq!(bucket_for(1), Bucket::Negative);
    }

    #[test]
    fn stats_summarize_the_review_set() {
        let stats = bucket_reviews(&rated(&[5, 4, 3, 2, 1, 1])).unwrap();
        assert_eq!(stats.positive, 2);
        assert_eq!(stats.neutral, 1);
        assert_eq!(stats.negative, 3);
        assert_eq!(stats.total, 6);
        assert!((stats.average_score - 16.0 / 6.0).abs() < 0.001);
        assert!((stats.sentiment_ratio - 2.0 / 3.0).abs() < 0.001);
    }

    #[test]
    fn ratio_denominator_is_floored_at_one() {
        let stats = bucket_reviews(&rated(&[5, 5, 4])).unwrap();
        assert_eq!(stats.negative, 0);
        assert!((stats.sentiment_ratio - 3.0).abs() < 0.001);
    }

    #[test]
    fn empty_review_set_is_rejected() {
        assert!(matches!(bucket_reviews(&[]), Err(AnalysisError::NoReviews)));
    }

    #[test]
    fn partition_keeps_input_order() {
        let reviews = rated(&[1, 5, 2, 4]);
        let buckets = partition(&reviews);
        let negative_ids: Vec<&str> = buckets.negative.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(negative_ids, vec!["r0", "r2"]);
        assert!(buckets.neutral.is_empty());
    }
}
