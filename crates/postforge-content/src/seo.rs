//! SEO analysis of generated articles.
//!
//! Pure functions over the markdown body — heading structure, keyword
//! density, readability, a composite 0–100 score, and operator-facing
//! recommendations.

use std::collections::BTreeMap;

use postforge_core::types::{HeadingCounts, KeywordStats, Readability, SeoReport, SeoSettings};

pub fn analyze(body: &str, title: &str, keywords: &[String], settings: &SeoSettings) -> SeoReport {
    let word_count = body.split_whitespace().count();
    let headings = heading_counts(body);
    let readability = readability(body);
    let keyword_stats = keyword_density(body, title, keywords);
    let score = score(word_count, &headings, &readability, &keyword_stats, settings);
    let recommendations = recommendations(word_count, &headings, &readability, &keyword_stats, settings);

    SeoReport {
        score,
        word_count,
        headings,
        readability,
        keyword_stats,
        recommendations,
    }
}

/// Counts both markdown (`#`) and inline HTML (`<hN`) headings.
fn heading_counts(body: &str) -> HeadingCounts {
    let mut counts = HeadingCounts::default();
    for line in body.lines() {
        let line = line.trim_start();
        if line.starts_with("### ") {
            counts.h3 += 1;
        } else if line.starts_with("## ") {
            counts.h2 += 1;
        } else if line.starts_with("# ") {
            counts.h1 += 1;
        }
    }
    let lower = body.to_lowercase();
    counts.h1 += lower.matches("<h1").count();
    counts.h2 += lower.matches("<h2").count();
    counts.h3 += lower.matches("<h3").count();
    counts
}

fn readability(body: &str) -> Readability {
    let words: Vec<&str> = body.split_whitespace().collect();
    let sentences = body
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1);

    let avg_sentence_length = words.len() as f64 / sentences as f64;
    let avg_word_length = if words.is_empty() {
        0.0
    } else {
        words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / words.len() as f64
    };

    let level = if avg_sentence_length > 20.0 {
        "hard"
    } else if avg_sentence_length >= 15.0 {
        "medium"
    } else {
        "easy"
    };

    Readability {
        avg_sentence_length,
        avg_word_length,
        level: level.to_string(),
    }
}

/// Density of each keyword, in occurrences per hundred words. Keywords fall
/// back to significant title words when none were supplied.
fn keyword_density(
    body: &str,
    title: &str,
    keywords: &[String],
) -> BTreeMap<String, KeywordStats> {
    let fallback: Vec<String> = title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .take(5)
        .map(String::from)
        .collect();
    let keywords = if keywords.is_empty() { &fallback } else { keywords };

    let body_lower = body.to_lowercase();
    let total_words = body_lower.split_whitespace().count().max(1);

    keywords
        .iter()
        .map(|kw| {
            let count = body_lower.matches(&kw.to_lowercase()).count();
            let density = count as f64 / total_words as f64 * 100.0;
            (kw.clone(), KeywordStats { count, density })
        })
        .collect()
}

fn score(
    word_count: usize,
    headings: &HeadingCounts,
    readability: &Readability,
    keyword_stats: &BTreeMap<String, KeywordStats>,
    settings: &SeoSettings,
) -> u32 {
    let mut score = 0u32;

    if word_count >= 1000 {
        score += 25;
    } else if word_count >= 500 {
        score += 15;
    }

    if headings.h2 >= 3 {
        score += 20;
    }

    if readability.level == "medium" {
        score += 25;
    } else if readability.level == "easy" {
        score += 15;
    }

    let in_range = keyword_stats
        .values()
        .filter(|s| s.density >= settings.keyword_density_min && s.density <= settings.keyword_density_max)
        .count() as u32;
    score += (in_range * 10).min(30);

    score.min(100)
}

fn recommendations(
    word_count: usize,
    headings: &HeadingCounts,
    readability: &Readability,
    keyword_stats: &BTreeMap<String, KeywordStats>,
    settings: &SeoSettings,
) -> Vec<String> {
    let mut recs = Vec::new();

    if word_count < 1000 {
        recs.push("Extend the article to at least 1000 words".to_string());
    }
    if headings.h2 < 3 {
        recs.push("Add more subheadings (H2)".to_string());
    }
    if readability.avg_sentence_length > 25.0 {
        recs.push("Shorten sentences to improve readability".to_string());
    }
    for (keyword, stats) in keyword_stats {
        if stats.density < settings.keyword_density_min {
            recs.push(format!("Increase usage of keyword '{keyword}'"));
        } else if stats.density > settings.keyword_density_max {
            recs.push(format!("Reduce overuse of keyword '{keyword}'"));
        }
    }

    recs
}
