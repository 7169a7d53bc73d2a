//! Wire DTOs for the PokeAPI endpoints the client consumes.
//!
//! # Design
//! These types mirror the JSON served by PokeAPI (and by the mock-server)
//! but are defined independently; integration tests catch schema drift.
//! Only the fields the client reads or that tests assert on are modelled.
//! Unknown fields are ignored and collection fields default to empty, so
//! additive API changes do not break decoding.

use serde::{Deserialize, Serialize};

/// A `{ name, url }` reference to another API resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

/// One page of `GET /pokemon`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PokemonPage {
    pub count: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<NamedResource>,
}

/// `GET /pokemon/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PokemonDetail {
    pub id: u32,
    pub name: String,
    pub height: u32,
    pub weight: u32,
    #[serde(default)]
    pub base_experience: Option<u32>,
    pub species: NamedResource,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AbilitySlot {
    pub ability: NamedResource,
    pub is_hidden: bool,
    pub slot: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatEntry {
    pub base_stat: i32,
    #[serde(default)]
    pub effort: i32,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

/// `GET /pokemon-species/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PokemonSpecies {
    pub id: u32,
    pub name: String,
    pub color: NamedResource,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorTextEntry>,
    #[serde(default)]
    pub habitat: Option<NamedResource>,
    #[serde(default)]
    pub is_baby: bool,
    #[serde(default)]
    pub names: Vec<LocalizedName>,
    #[serde(default)]
    pub shape: Option<NamedResource>,
    #[serde(default)]
    pub varieties: Vec<Variety>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlavorTextEntry {
    pub flavor_text: String,
    pub language: NamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalizedName {
    pub language: NamedResource,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variety {
    pub is_default: bool,
    pub pokemon: NamedResource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_tolerates_missing_results_and_extra_fields() {
        let page: PokemonPage =
            serde_json::from_str(r#"{"count":0,"next":null,"previous":null,"extra":true}"#).unwrap();
        assert!(page.results.is_empty());
    }

    #[test]
    fn type_slot_reads_reserved_field_name() {
        let slot: TypeSlot = serde_json::from_str(
            r#"{"slot":1,"type":{"name":"grass","url":"https://pokeapi.co/api/v2/type/12/"}}"#,
        )
        .unwrap();
        assert_eq!(slot.kind.name, "grass");

        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["type"]["name"], "grass");
    }

    #[test]
    fn detail_rejects_missing_species() {
        let result: Result<PokemonDetail, _> =
            serde_json::from_str(r#"{"id":1,"name":"bulbasaur","height":7,"weight":69}"#);
        assert!(result.is_err());
    }

    #[test]
    fn species_defaults_optional_sections() {
        let species: PokemonSpecies = serde_json::from_str(
            r#"{"id":1,"name":"bulbasaur","color":{"name":"green","url":"https://pokeapi.co/api/v2/pokemon-color/5/"},"habitat":null}"#,
        )
        .unwrap();
        assert!(species.flavor_text_entries.is_empty());
        assert!(species.habitat.is_none());
        assert!(!species.is_baby);
    }
}
