use std::collections::HashSet;

use once_cell::sync::Lazy;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // english
        "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her",
        "was", "one", "our", "out", "has", "him", "his", "how", "its", "may", "new", "now",
        "old", "see", "two", "who", "did", "she", "too", "own", "off", "yet", "why", "let",
        "put", "say", "get", "got", "via", "per", "also", "been", "from", "have", "into",
        "just", "like", "more", "most", "much", "only", "over", "same", "some", "such",
        "than", "that", "them", "then", "there", "these", "they", "this", "those", "very",
        "what", "when", "where", "which", "while", "will", "with", "would", "could",
        "should", "about", "after", "again", "against", "because", "before", "being",
        "below", "between", "both", "down", "during", "each", "even", "ever", "every",
        "few", "further", "here", "hers", "herself", "himself", "itself", "myself",
        "nor", "once", "other", "ours", "ourselves", "their", "theirs", "themselves",
        "through", "under", "until", "upon", "were", "your", "yours", "yourself",
        "yourselves", "does", "doing", "done", "don", "didn", "doesn", "isn", "wasn",
        "aren", "weren", "won", "wouldn", "couldn", "shouldn", "haven", "hasn", "hadn",
        "mustn", "needn", "shan", "ain", "really", "still", "well",
        "way", "thing", "things", "make", "makes", "made", "want", "need", "lot", "lots",
        "many", "something", "anything", "nothing", "everything", "going", "know", "think",
        // review noise
        "app", "apps", "application", "use", "used", "using", "uses", "time", "times",
        "day", "days", "phone", "iphone", "ipad", "please", "update", "version", "review",
        "star", "stars", "one", "two", "five",
    ]
    .into_iter()
    .collect()
});

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Lowercased word tokens of `text`, minus stopwords, tokens of two chars or
/// fewer and pure numbers. Apostrophes split words, so contractions reduce to
/// their stems ("couldn't" -> "couldn").
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 2)
        .filter(|token| !token.chars().all(|c| c.is_numeric()))
        .filter(|token| !is_stopword(token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_drops_short_tokens() {
        assert_eq!(tokenize("Sync IS Broken"), vec!["sync", "broken"]);
    }

    #[test]
    fn drops_stopwords_and_domain_noise() {
        assert_eq!(
            tokenize("I use this app every day and the export fails"),
            vec!["export", "fails"]
        );
    }

    #[test]
    fn drops_pure_numbers_but_keeps_mixed_tokens() {
        assert_eq!(tokenize("crashed 1000 times on ios17"), vec!["crashed", "ios17"]);
    }

    #[test]
    fn splits_on_punctuation() {
        assert_eq!(
            tokenize("great,sync!feature...broken?"),
            vec!["great", "sync", "feature", "broken"]
        );
    }

    #[test]
    fn contractions_reduce_to_stopword_stems() {
        assert_eq!(tokenize("it doesn't load"), vec!["load"]);
        assert_eq!(tokenize("couldn't sync, you're kidding"), vec!["sync", "kidding"]);
        assert_eq!(
            tokenize("wouldn't, shouldn't, haven't, aren't, weren't, hasn't, they're, that's, there's, i'll"),
            Vec::<String>::new()
        );
        assert_eq!(tokenize("'quoted' widgets"), vec!["quoted", "widgets"]);
    }

    #[test]
    fn empty_text_yields_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }
}
