//! Bulk title import from operator-supplied CSV or TXT files.
//!
//! TXT: one title per line, `#` comments and blank lines skipped.
//! CSV: delimiter auto-detected, header row scanned for a title column and
//! an optional keyword column; keywords are comma-separated within the cell.

use std::path::Path;

use postforge_core::error::{PostforgeError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTitle {
    pub title: String,
    pub keywords: Vec<String>,
}

/// Parse a title file, dispatching on extension.
pub fn parse_file(path: &Path) -> Result<Vec<ParsedTitle>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let content = std::fs::read_to_string(path)?;
    match ext.as_str() {
        "txt" => Ok(parse_txt(&content)),
        "csv" => Ok(parse_csv(&content)),
        other => Err(PostforgeError::Other(format!(
            "unsupported title file type '{other}' — use .csv or .txt"
        ))),
    }
}

pub fn parse_txt(content: &str) -> Vec<ParsedTitle> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| ParsedTitle {
            title: line.to_string(),
            keywords: Vec::new(),
        })
        .collect()
}

pub fn parse_csv(content: &str) -> Vec<ParsedTitle> {
    let mut lines = content.lines();
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let delimiter = detect_delimiter(header_line);
    let headers = split_row(header_line, delimiter);

    // Title defaults to the first column; keyword column is optional.
    let mut title_idx = 0;
    let mut keyword_idx = None;
    for (i, header) in headers.iter().enumerate() {
        let header = header.to_lowercase();
        if ["title", "post", "article"].iter().any(|k| header.contains(k)) {
            title_idx = i;
        } else if header.contains("keyword") {
            keyword_idx = Some(i);
        }
    }

    let mut parsed = Vec::new();
    for (row_num, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = split_row(line, delimiter);
        let Some(title) = row.get(title_idx).map(|t| t.trim()) else {
            tracing::warn!("Row {}: no title column, skipping", row_num + 2);
            continue;
        };
        if title.is_empty() {
            tracing::warn!("Row {}: empty title, skipping", row_num + 2);
            continue;
        }
        let keywords = keyword_idx
            .and_then(|i| row.get(i))
            .map(|cell| {
                cell.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        parsed.push(ParsedTitle {
            title: title.to_string(),
            keywords,
        });
    }
    parsed
}

/// Pick the delimiter that occurs most often in the header line.
fn detect_delimiter(first_line: &str) -> char {
    let mut best = ',';
    let mut max_count = 0;
    for candidate in [',', ';', '\t', '|'] {
        let count = first_line.matches(candidate).count();
        if count > max_count {
            max_count = count;
            best = candidate;
        }
    }
    best
}

/// Minimal quote-aware field split: double quotes protect embedded
/// delimiters, `""` inside a quoted field is a literal quote.
fn split_row(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' && field.is_empty() {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(c);
        }
    }
    fields.push(field);
    fields
}
