//! Memory-token directives embedded in element descriptions.
//!
//! Memory tokens carry their game data as bracketed directives inside the free
//! text description:
//!
//! ```text
//! SF_RFID: [ABC123]
//! SF_ValueRating: [4]
//! SF_MemoryType: [Core]
//! SF_Group: [Ephemeral Echo (x2.5)]
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Parsed directive values of one memory token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_sf_rfid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sf_value_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sf_memory_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sf_group: Option<String>,
    pub sf_group_multiplier: f64,
}

impl Default for MemoryProperties {
    fn default() -> Self {
        Self {
            parsed_sf_rfid: None,
            sf_value_rating: None,
            sf_memory_type: None,
            sf_group: None,
            sf_group_multiplier: 1.0,
        }
    }
}

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(SF_[A-Za-z]+)\s*:\s*\[([^\]\n]*)\]").expect("Invalid regex pattern")
    })
}

fn multiplier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\(\s*x\s*(\d+(?:\.\d+)?)\s*\)\s*$").expect("Invalid regex pattern")
    })
}

/// True when an element's basic type names a memory-token category.
pub fn is_memory_token(basic_type: Option<&str>) -> bool {
    basic_type
        .map(|t| t.to_ascii_lowercase().contains("memory"))
        .unwrap_or(false)
}

/// Parse every recognised directive out of `description`. Unknown directives are ignored.
pub fn parse_memory_fields(description: &str) -> MemoryProperties {
    let mut props = MemoryProperties::default();

    for cap in directive_regex().captures_iter(description) {
        let key = cap[1].to_ascii_uppercase();
        let value = cap[2].trim();
        if value.is_empty() {
            continue;
        }
        match key.as_str() {
            "SF_RFID" => props.parsed_sf_rfid = Some(value.to_string()),
            "SF_VALUERATING" => props.sf_value_rating = value.parse::<f64>().ok(),
            "SF_MEMORYTYPE" => props.sf_memory_type = Some(value.to_string()),
            "SF_GROUP" => {
                props.sf_group_multiplier = multiplier_regex()
                    .captures(value)
                    .and_then(|m| m[1].parse::<f64>().ok())
                    .unwrap_or(1.0);
                props.sf_group = Some(value.to_string());
            }
            _ => {}
        }
    }

    props
}

/// Directive block for an element, or `None` when the element is not a memory token.
pub fn memory_properties_for(basic_type: Option<&str>, description: &str) -> Option<MemoryProperties> {
    if is_memory_token(basic_type) {
        Some(parse_memory_fields(description))
    } else {
        None
    }
}
