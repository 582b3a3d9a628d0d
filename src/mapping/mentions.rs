//! Informal `@Name` character mentions in free text (regex-based).

use std::sync::OnceLock;

use regex::Regex;

use crate::enrich::RelationRef;

fn mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // One or two capitalised words after '@'.
    RE.get_or_init(|| {
        Regex::new(r"@([A-Z][\w'’-]*(?:[ \t]+[A-Z][\w'’-]*)?)").expect("Invalid regex pattern")
    })
}

/// Distinct mentioned names in order of first appearance.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cap in mention_regex().captures_iter(text) {
        let name = cap[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Character references for a timeline event.
///
/// Structured relation data always wins; mentions are parsed from `texts` only
/// when `structured` is empty. Mention-derived refs carry no id.
pub fn characters_or_mentions(structured: Vec<RelationRef>, texts: &[&str]) -> Vec<RelationRef> {
    if !structured.is_empty() {
        return structured;
    }
    let mut names: Vec<String> = Vec::new();
    for text in texts {
        for name in extract_mentions(text) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
        .into_iter()
        .map(|name| RelationRef { id: None, name })
        .collect()
}
