//! Display-ready models produced by the mapping layer.

use serde::Serialize;

/// One row of the catalog list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub id: u32,
    pub name: String,
    pub image_url: String,
}

/// Everything the detail page renders, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailItem {
    /// `#` followed by the id zero-padded to three digits, e.g. `#001`.
    pub display_id: String,
    pub name: String,
    pub description: String,
    /// e.g. `6.9 KG`
    pub weight: String,
    /// e.g. `0.7 M`
    pub height: String,
    pub color: String,
    pub image_url: String,
    /// `(ability name, is hidden)`
    pub abilities: Vec<(String, bool)>,
    /// `(stat name, base value)`
    pub stats: Vec<(String, i32)>,
    pub types: Vec<String>,
}
