//! Model Output Parsing
//!
//! Free-form completion text into structured steps/questions/findings.
//! Parsing is fallible by nature, so every extractor has a lower-quality
//! fallback path instead of hard failure.

use regex::Regex;

/// Lines like "1. Do something" or "2) Other" with the marker stripped.
pub fn parse_numbered_lines(text: &str) -> Vec<String> {
    let re = Regex::new(r"^\s*\d+[.)]\s+(.+)$").unwrap();
    text.lines()
        .filter_map(|line| {
            re.captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Bullet lines ("- x", "* x", "• x") with the marker stripped.
pub fn parse_bullet_lines(text: &str) -> Vec<String> {
    let re = Regex::new(r"^\s*[-*•]\s+(.+)$").unwrap();
    text.lines()
        .filter_map(|line| {
            re.captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Numbered list first, bullets second, otherwise plain non-empty lines.
pub fn parse_list_lines(text: &str) -> Vec<String> {
    let numbered = parse_numbered_lines(text);
    if !numbered.is_empty() {
        return numbered;
    }
    let bullets = parse_bullet_lines(text);
    if !bullets.is_empty() {
        return bullets;
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Keyword fallback when a findings response has no recognizable list shape:
/// keeps lines that mention a finding-like term.
pub fn keyword_finding_lines(text: &str) -> Vec<String> {
    const KEYWORDS: [&str; 4] = ["finding", "recommend", "insight", "suggest"];
    text.lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_lowercase();
            KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .map(String::from)
        .collect()
}

/// Contents of fenced code blocks, used as step artifacts.
pub fn extract_fenced_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("```") {
        let after_open = &rest[start + 3..];
        // Skip the language tag line when present
        let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_open[body_start..];
        match body.find("```") {
            Some(end) => {
                let block = body[..end].trim();
                if !block.is_empty() {
                    blocks.push(block.to_string());
                }
                rest = &body[end + 3..];
            }
            None => break,
        }
    }
    blocks
}
