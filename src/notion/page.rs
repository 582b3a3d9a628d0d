//! Upstream page model.
//!
//! Pages arrive as loosely-typed JSON. Each property value is converted into a
//! closed [`PropertyValue`] at the boundary; the conversion is total, so one
//! malformed property never fails a whole page.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field name -> typed property value, as found on one page.
pub type PropertyBag = HashMap<String, PropertyValue>;

/// A page returned by the upstream workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyBag>,
}

impl Page {
    /// Page carrying only an id, as returned for stubs and trimmed payloads.
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: None,
            last_edited_time: None,
            properties: None,
        }
    }

    /// Text of the first title-typed property, or "" when there is none.
    pub fn title(&self) -> String {
        self.properties
            .as_ref()
            .and_then(|bag| {
                bag.values().find_map(|value| match value {
                    PropertyValue::Title { title } => Some(concat_plain_text(title)),
                    _ => None,
                })
            })
            .unwrap_or_default()
    }
}

/// One run of formatted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichText {
    pub plain_text: String,
}

/// A select / multi-select / status choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

/// Target of a relation property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationId {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Closed set of property shapes this service understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title { title: Vec<RichText> },
    RichText { rich_text: Vec<RichText> },
    Select { select: Option<SelectOption> },
    MultiSelect { multi_select: Vec<SelectOption> },
    Relation { relation: Vec<RelationId> },
    Date { date: Option<DateValue> },
    Number { number: Option<f64> },
    Url { url: Option<String> },
    Unsupported,
}

const KNOWN_KINDS: &[&str] = &[
    "title",
    "rich_text",
    "select",
    "status",
    "multi_select",
    "relation",
    "date",
    "number",
    "url",
];

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        // Payloads without a "type" tag are classified by whichever known key they carry.
        let kind = match value.get("type").and_then(Value::as_str) {
            Some(kind) => kind.to_string(),
            None => KNOWN_KINDS
                .iter()
                .find(|k| value.get(**k).is_some())
                .map(|k| k.to_string())
                .unwrap_or_default(),
        };
        let payload = value.get(kind.as_str()).unwrap_or(&Value::Null);

        match kind.as_str() {
            "title" => PropertyValue::Title {
                title: rich_text_runs(payload),
            },
            "rich_text" => PropertyValue::RichText {
                rich_text: rich_text_runs(payload),
            },
            "select" | "status" => PropertyValue::Select {
                select: select_option(payload),
            },
            "multi_select" => PropertyValue::MultiSelect {
                multi_select: payload
                    .as_array()
                    .map(|items| items.iter().filter_map(select_option).collect())
                    .unwrap_or_default(),
            },
            "relation" => PropertyValue::Relation {
                relation: payload
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|item| item.get("id").and_then(Value::as_str))
                            .map(|id| RelationId { id: id.to_string() })
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            "date" => PropertyValue::Date {
                date: payload
                    .get("start")
                    .and_then(Value::as_str)
                    .map(|start| DateValue {
                        start: start.to_string(),
                        end: payload
                            .get("end")
                            .and_then(Value::as_str)
                            .map(String::from),
                    }),
            },
            "number" => PropertyValue::Number {
                number: payload.as_f64(),
            },
            "url" => PropertyValue::Url {
                url: payload.as_str().map(String::from),
            },
            _ => PropertyValue::Unsupported,
        }
    }
}

fn rich_text_runs(payload: &Value) -> Vec<RichText> {
    let Some(items) = payload.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            item.get("plain_text")
                .and_then(Value::as_str)
                .or_else(|| {
                    item.get("text")
                        .and_then(|t| t.get("content"))
                        .and_then(Value::as_str)
                })
                .map(|text| RichText {
                    plain_text: text.to_string(),
                })
        })
        .collect()
}

fn select_option(payload: &Value) -> Option<SelectOption> {
    payload
        .get("name")
        .and_then(Value::as_str)
        .map(|name| SelectOption {
            name: name.to_string(),
        })
}

pub(crate) fn concat_plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|run| run.plain_text.as_str()).collect()
}
