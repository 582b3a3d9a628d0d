//! Property extraction: typed readers over single values, and name resolution
//! that tolerates the workspace's inconsistent field spellings.

pub mod extract;
pub mod resolve;

pub use extract::{
    extract_date, extract_multi_select, extract_number, extract_relation, extract_rich_text,
    extract_select, extract_single_relation, extract_title, extract_url,
};
pub use resolve::{
    candidate_keys, extract_date_by_name, extract_multi_select_by_name, extract_number_by_name,
    extract_relation_by_name, extract_rich_text_by_name, extract_select_by_name,
    extract_single_relation_by_name, extract_title_by_name, extract_url_by_name, get_property,
    get_property_or_report, resolve_key, PropertyMiss,
};
