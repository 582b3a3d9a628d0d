//! Logical field name -> actual bag key resolution.
//!
//! Workspaces spell the same field several ways ("Owned Elements",
//! "Owned_Elements", "Sub-Puzzles" / "Sub_Puzzles"). Candidates are tried in a
//! fixed order and the first key present on the bag wins.

use std::fmt;

use crate::notion::{PropertyBag, PropertyValue};

use super::extract;

/// Ordered candidate transforms applied to a logical name.
const CANDIDATE_TRANSFORMS: &[fn(&str) -> String] = &[exact, spaces_to_underscores, hyphens_to_underscores];

fn exact(name: &str) -> String {
    name.to_string()
}

fn spaces_to_underscores(name: &str) -> String {
    name.replace(' ', "_")
}

fn hyphens_to_underscores(name: &str) -> String {
    name.replace('-', "_")
}

/// Keys to try for `name`, in priority order, without duplicates.
///
/// Names containing '/' are matched literally only.
pub fn candidate_keys(name: &str) -> Vec<String> {
    if name.contains('/') {
        return vec![name.to_string()];
    }
    let mut keys: Vec<String> = Vec::with_capacity(CANDIDATE_TRANSFORMS.len());
    for transform in CANDIDATE_TRANSFORMS {
        let key = transform(name);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// A field that matched none of its candidate keys.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMiss {
    pub name: String,
    pub tried: Vec<String>,
    pub available: Vec<String>,
}

impl fmt::Display for PropertyMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "property '{}' not found (tried {:?}; available {:?})",
            self.name, self.tried, self.available
        )
    }
}

/// Resolve `name` to the key actually present on `bag`.
pub fn resolve_key<'a>(bag: &'a PropertyBag, name: &str) -> Result<&'a str, PropertyMiss> {
    let tried = candidate_keys(name);
    for key in &tried {
        if let Some((found, _)) = bag.get_key_value(key.as_str()) {
            return Ok(found.as_str());
        }
    }
    let mut available: Vec<String> = bag.keys().cloned().collect();
    available.sort();
    Err(PropertyMiss {
        name: name.to_string(),
        tried,
        available,
    })
}

/// Look up a property by logical name, handing any miss to `on_miss`.
pub fn get_property_or_report<'a, F>(bag: &'a PropertyBag, name: &str, on_miss: F) -> Option<&'a PropertyValue>
where
    F: FnOnce(&PropertyMiss),
{
    match resolve_key(bag, name) {
        Ok(key) => bag.get(key),
        Err(miss) => {
            on_miss(&miss);
            None
        }
    }
}

/// Look up a property by logical name; logs a warning and returns `None` on a miss.
pub fn get_property<'a>(bag: &'a PropertyBag, name: &str) -> Option<&'a PropertyValue> {
    get_property_or_report(bag, name, |miss| log::warn!("{}", miss))
}

pub fn extract_title_by_name(bag: &PropertyBag, name: &str) -> String {
    extract::extract_title(get_property(bag, name))
}

pub fn extract_rich_text_by_name(bag: &PropertyBag, name: &str) -> String {
    extract::extract_rich_text(get_property(bag, name))
}

pub fn extract_select_by_name(bag: &PropertyBag, name: &str) -> Option<String> {
    extract::extract_select(get_property(bag, name))
}

pub fn extract_multi_select_by_name(bag: &PropertyBag, name: &str) -> Vec<String> {
    extract::extract_multi_select(get_property(bag, name))
}

pub fn extract_relation_by_name(bag: &PropertyBag, name: &str) -> Vec<String> {
    extract::extract_relation(get_property(bag, name))
}

pub fn extract_single_relation_by_name(bag: &PropertyBag, name: &str) -> Option<String> {
    extract::extract_single_relation(get_property(bag, name))
}

pub fn extract_date_by_name(bag: &PropertyBag, name: &str) -> Option<String> {
    extract::extract_date(get_property(bag, name))
}

pub fn extract_number_by_name(bag: &PropertyBag, name: &str) -> Option<f64> {
    extract::extract_number(get_property(bag, name))
}

pub fn extract_url_by_name(bag: &PropertyBag, name: &str) -> Option<String> {
    extract::extract_url(get_property(bag, name))
}
