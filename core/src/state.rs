//! Screen states and the pure reducer that applies a search query.

use serde::Serialize;

use crate::error::Failure;
use crate::model::{DetailItem, ListItem};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ListUiState {
    Loading,
    Error { message: String },
    Success { items: Vec<ListItem>, is_refreshing: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailUiState {
    Loading,
    Error { message: String },
    Success { detail: DetailItem },
}

impl ListUiState {
    pub fn error(failure: impl Into<Failure>) -> Self {
        ListUiState::Error {
            message: failure.into().to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ListUiState::Loading => "loading",
            ListUiState::Error { .. } => "error",
            ListUiState::Success { .. } => "success",
        }
    }

    /// Items of a success state, empty otherwise.
    pub fn items(&self) -> &[ListItem] {
        match self {
            ListUiState::Success { items, .. } => items,
            _ => &[],
        }
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self, ListUiState::Success { is_refreshing: true, .. })
    }
}

impl DetailUiState {
    pub fn error(failure: impl Into<Failure>) -> Self {
        DetailUiState::Error {
            message: failure.into().to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DetailUiState::Loading => "loading",
            DetailUiState::Error { .. } => "error",
            DetailUiState::Success { .. } => "success",
        }
    }
}

/// The displayed list state for a base state and an applied query.
///
/// A blank query, or any non-success state, passes through untouched.
/// Otherwise the items are narrowed to those whose name contains the query,
/// ignoring case and keeping their order.
pub fn filter_state(base: &ListUiState, query: &str) -> ListUiState {
    match base {
        ListUiState::Success { items, is_refreshing } if !query.trim().is_empty() => {
            let needle = query.to_lowercase();
            ListUiState::Success {
                items: items
                    .iter()
                    .filter(|item| item.name.to_lowercase().contains(&needle))
                    .cloned()
                    .collect(),
                is_refreshing: *is_refreshing,
            }
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkFailure;
    use crate::mapping::image_url;
    use pretty_assertions::assert_eq;

    fn item(id: u32, name: &str) -> ListItem {
        ListItem {
            id,
            name: name.to_string(),
            image_url: image_url(id),
        }
    }

    fn catalog() -> ListUiState {
        ListUiState::Success {
            items: vec![
                item(1, "bulbasaur"),
                item(2, "ivysaur"),
                item(3, "venusaur"),
                item(4, "charmander"),
            ],
            is_refreshing: false,
        }
    }

    #[test]
    fn blank_query_passes_state_through() {
        assert_eq!(filter_state(&catalog(), ""), catalog());
        assert_eq!(filter_state(&catalog(), "   "), catalog());
    }

    #[test]
    fn query_keeps_matching_items_in_order() {
        let filtered = filter_state(&catalog(), "SAUR");
        let names: Vec<&str> = filtered.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["bulbasaur", "ivysaur", "venusaur"]);
    }

    #[test]
    fn every_survivor_contains_the_query() {
        for query in ["a", "Saur", "char", "zzz", "IVY"] {
            let filtered = filter_state(&catalog(), query);
            for survivor in filtered.items() {
                assert!(survivor.name.to_lowercase().contains(&query.to_lowercase()));
            }
        }
    }

    #[test]
    fn query_iv_selects_ivysaur() {
        let filtered = filter_state(&catalog(), "iv");
        assert_eq!(filtered.items(), &[item(2, "ivysaur")]);
    }

    #[test]
    fn filtering_keeps_refresh_flag() {
        let refreshing = ListUiState::Success {
            items: vec![item(1, "bulbasaur")],
            is_refreshing: true,
        };
        assert!(filter_state(&refreshing, "bulba").is_refreshing());
    }

    #[test]
    fn non_success_states_ignore_query() {
        assert_eq!(filter_state(&ListUiState::Loading, "iv"), ListUiState::Loading);
        let error = ListUiState::error(NetworkFailure::NoConnectivity);
        assert_eq!(filter_state(&error, "iv"), error);
    }

    #[test]
    fn states_serialize_with_a_tag() {
        let json = serde_json::to_value(ListUiState::Loading).unwrap();
        assert_eq!(json["state"], "loading");

        let json = serde_json::to_value(DetailUiState::error(NetworkFailure::RequestTimeout)).unwrap();
        assert_eq!(json["state"], "error");
        assert_eq!(json["message"], "The request timed out");
    }
}
