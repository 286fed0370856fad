//! Keyword research from a post title.

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "for", "from", "how", "in", "is", "of", "on", "or", "the", "to",
    "with", "your",
];

/// Core keywords plus a handful of long-tail variants.
pub fn research_keywords(title: &str) -> Vec<String> {
    let base = extract_keywords(title);
    let mut long_tail: Vec<String> = base
        .iter()
        .map(|kw| format!("{kw} for beginners"))
        .chain(base.iter().map(|kw| format!("{kw} guide")))
        .chain(
            base.iter()
                .filter(|kw| !kw.contains("how"))
                .map(|kw| format!("how to {kw}")),
        )
        .collect();
    long_tail.truncate(5);

    let mut keywords = base;
    keywords.extend(long_tail);
    keywords
}

/// Main keywords: lowercased title words minus stop words, capped at 10.
pub fn extract_keywords(title: &str) -> Vec<String> {
    let mut keywords: Vec<String> = title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
        .map(String::from)
        .collect();
    keywords.dedup();
    keywords.truncate(10);
    keywords
}
