use std::borrow::Borrow;
use std::collections::HashMap;

use crate::models::{Review, Theme};
use crate::text;

pub const MAX_THEMES: usize = 30;

/// How often a word has to appear before it counts as a theme. Small samples
/// get a lower bar so they still surface something.
pub fn min_mentions(review_count: usize) -> usize {
    match review_count {
        0..=5 => 1,
        6..=20 => 2,
        _ => 3,
    }
}

pub fn extract_themes<R: Borrow<Review>>(reviews: &[R]) -> Vec<Theme> {
    let corpus = reviews
        .iter()
        .map(|review| review.borrow().document())
        .collect::<Vec<_>>()
        .join(" ");

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut themes: Vec<Theme> = Vec::new();

    for token in text::tokenize(&corpus) {
        match index.get(&token) {
            Some(&position) => themes[position].count += 1,
            None => {
                index.insert(token.clone(), themes.len());
                themes.push(Theme {
                    word: token,
                    count: 1,
                });
            }
        }
    }

    let threshold = min_mentions(reviews.len());
    themes.retain(|theme| theme.count >= threshold);
    // stable: ties stay in first-seen order
    themes.sort_by(|a, b| b.count.cmp(&a.count));
    themes.truncate(MAX_THEMES);
    themes
}
