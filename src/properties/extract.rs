//! Typed extraction from single property values.
//!
//! Every extractor takes whatever the bag held for a field (possibly nothing,
//! possibly a value of the wrong shape) and returns a default-safe result.

use crate::notion::page::concat_plain_text;
use crate::notion::PropertyValue;

/// Concatenated plain text of a title value; "" when absent or not text.
pub fn extract_title(value: Option<&PropertyValue>) -> String {
    match value {
        Some(PropertyValue::Title { title }) => concat_plain_text(title),
        Some(PropertyValue::RichText { rich_text }) => concat_plain_text(rich_text),
        _ => String::new(),
    }
}

/// Concatenated plain text of a rich-text value; "" when absent or not text.
pub fn extract_rich_text(value: Option<&PropertyValue>) -> String {
    match value {
        Some(PropertyValue::RichText { rich_text }) => concat_plain_text(rich_text),
        Some(PropertyValue::Title { title }) => concat_plain_text(title),
        _ => String::new(),
    }
}

pub fn extract_select(value: Option<&PropertyValue>) -> Option<String> {
    match value {
        Some(PropertyValue::Select { select: Some(option) }) => Some(option.name.clone()),
        _ => None,
    }
}

/// Choice labels in upstream order.
pub fn extract_multi_select(value: Option<&PropertyValue>) -> Vec<String> {
    match value {
        Some(PropertyValue::MultiSelect { multi_select }) => {
            multi_select.iter().map(|option| option.name.clone()).collect()
        }
        _ => Vec::new(),
    }
}

/// Related page ids in upstream order.
pub fn extract_relation(value: Option<&PropertyValue>) -> Vec<String> {
    match value {
        Some(PropertyValue::Relation { relation }) => {
            relation.iter().map(|target| target.id.clone()).collect()
        }
        _ => Vec::new(),
    }
}

/// First related id, for fields that hold at most one relation.
pub fn extract_single_relation(value: Option<&PropertyValue>) -> Option<String> {
    match value {
        Some(PropertyValue::Relation { relation }) => relation.first().map(|r| r.id.clone()),
        _ => None,
    }
}

/// Start date string of a date value.
pub fn extract_date(value: Option<&PropertyValue>) -> Option<String> {
    match value {
        Some(PropertyValue::Date { date: Some(date) }) => Some(date.start.clone()),
        _ => None,
    }
}

/// Numeric value; zero is a value, only absence is `None`.
pub fn extract_number(value: Option<&PropertyValue>) -> Option<f64> {
    match value {
        Some(PropertyValue::Number { number }) => *number,
        _ => None,
    }
}

pub fn extract_url(value: Option<&PropertyValue>) -> Option<String> {
    match value {
        Some(PropertyValue::Url { url: Some(url) }) if !url.is_empty() => Some(url.clone()),
        _ => None,
    }
}
