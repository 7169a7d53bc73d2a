//! Pure conversions from wire DTOs to display models.
//!
//! A resource URL whose trailing segment is not a positive integer breaks
//! the API contract; it surfaces as [`MappingError`] rather than as a
//! [`Failure`](crate::error::Failure).

use crate::error::MappingError;
use crate::model::{DetailItem, ListItem};
use crate::types::{NamedResource, PokemonDetail, PokemonSpecies};

const ARTWORK_BASE_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork/shiny";

/// Parse the id from a resource URL such as `https://pokeapi.co/api/v2/pokemon/25/`.
pub fn id_from_url(url: &str) -> Result<u32, MappingError> {
    url.split('/')
        .filter(|segment| !segment.trim().is_empty())
        .next_back()
        .and_then(|segment| segment.parse::<u32>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| MappingError::InvalidResourceUrl(url.to_string()))
}

pub fn image_url(id: u32) -> String {
    format!("{ARTWORK_BASE_URL}/{id}.png")
}

pub fn display_id(id: u32) -> String {
    format!("#{id:03}")
}

/// Weight arrives in hectograms.
pub fn format_weight(weight: u32) -> String {
    format!("{:.1} KG", f64::from(weight) / 10.0)
}

/// Height arrives in decimetres.
pub fn format_height(height: u32) -> String {
    format!("{:.1} M", f64::from(height) / 10.0)
}

impl TryFrom<&NamedResource> for ListItem {
    type Error = MappingError;

    fn try_from(resource: &NamedResource) -> Result<Self, Self::Error> {
        let id = id_from_url(&resource.url)?;
        Ok(ListItem {
            id,
            name: resource.name.clone(),
            image_url: image_url(id),
        })
    }
}

/// Map every record of a list page, stopping at the first broken URL.
pub fn list_items(results: &[NamedResource]) -> Result<Vec<ListItem>, MappingError> {
    results.iter().map(ListItem::try_from).collect()
}

impl DetailItem {
    /// Combine the core record and the species record fetched for one id.
    pub fn from_responses(detail: &PokemonDetail, species: &PokemonSpecies) -> Result<Self, MappingError> {
        let id = id_from_url(&detail.species.url)?;
        let description = species
            .flavor_text_entries
            .first()
            .map(|entry| entry.flavor_text.replace('\n', " ").trim().to_string())
            .unwrap_or_default();

        Ok(DetailItem {
            display_id: display_id(id),
            name: detail.species.name.clone(),
            description,
            weight: format_weight(detail.weight),
            height: format_height(detail.height),
            color: species.color.name.clone(),
            image_url: image_url(id),
            abilities: detail
                .abilities
                .iter()
                .map(|slot| (slot.ability.name.clone(), slot.is_hidden))
                .collect(),
            stats: detail
                .stats
                .iter()
                .map(|entry| (entry.stat.name.clone(), entry.base_stat))
                .collect(),
            types: detail.types.iter().map(|slot| slot.kind.name.clone()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AbilitySlot, FlavorTextEntry, Sprites, StatEntry, TypeSlot};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn resource(name: &str, url: &str) -> NamedResource {
        NamedResource {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    fn bulbasaur() -> PokemonDetail {
        PokemonDetail {
            id: 1,
            name: "bulbasaur".to_string(),
            height: 7,
            weight: 69,
            base_experience: Some(64),
            species: resource("bulbasaur", "https://pokeapi.co/api/v2/pokemon-species/1/"),
            sprites: Sprites::default(),
            abilities: vec![
                AbilitySlot {
                    ability: resource("overgrow", "https://pokeapi.co/api/v2/ability/65/"),
                    is_hidden: false,
                    slot: 1,
                },
                AbilitySlot {
                    ability: resource("chlorophyll", "https://pokeapi.co/api/v2/ability/34/"),
                    is_hidden: true,
                    slot: 3,
                },
            ],
            stats: vec![
                StatEntry {
                    base_stat: 45,
                    effort: 0,
                    stat: resource("hp", "https://pokeapi.co/api/v2/stat/1/"),
                },
                StatEntry {
                    base_stat: 49,
                    effort: 0,
                    stat: resource("attack", "https://pokeapi.co/api/v2/stat/2/"),
                },
            ],
            types: vec![
                TypeSlot {
                    slot: 1,
                    kind: resource("grass", "https://pokeapi.co/api/v2/type/12/"),
                },
                TypeSlot {
                    slot: 2,
                    kind: resource("poison", "https://pokeapi.co/api/v2/type/4/"),
                },
            ],
        }
    }

    fn bulbasaur_species() -> PokemonSpecies {
        PokemonSpecies {
            id: 1,
            name: "bulbasaur".to_string(),
            color: resource("green", "https://pokeapi.co/api/v2/pokemon-color/5/"),
            flavor_text_entries: vec![FlavorTextEntry {
                flavor_text: "A strange seed was\nplanted on its\nback at birth.\n".to_string(),
                language: resource("en", "https://pokeapi.co/api/v2/language/9/"),
            }],
            habitat: None,
            is_baby: false,
            names: Vec::new(),
            shape: None,
            varieties: Vec::new(),
        }
    }

    #[rstest]
    #[case("https://pokeapi.co/api/v2/pokemon/1/", 1)]
    #[case("https://pokeapi.co/api/v2/pokemon/25", 25)]
    #[case("https://pokeapi.co/api/v2/pokemon-species/1010//", 1010)]
    fn parses_trailing_segment(#[case] url: &str, #[case] expected: u32) {
        assert_eq!(id_from_url(url).unwrap(), expected);
    }

    #[rstest]
    #[case("https://pokeapi.co/api/v2/pokemon/pikachu/")]
    #[case("https://pokeapi.co/api/v2/pokemon/0/")]
    #[case("https://pokeapi.co/api/v2/pokemon/-4/")]
    #[case("")]
    fn rejects_non_positive_or_non_numeric_ids(#[case] url: &str) {
        assert_eq!(
            id_from_url(url),
            Err(MappingError::InvalidResourceUrl(url.to_string()))
        );
    }

    #[rstest]
    #[case(1, "#001")]
    #[case(25, "#025")]
    #[case(151, "#151")]
    fn display_id_is_zero_padded(#[case] id: u32, #[case] expected: &str) {
        let formatted = display_id(id);
        assert_eq!(formatted, expected);
        assert_eq!(formatted.len(), 4);
    }

    #[rstest]
    #[case(69, "6.9 KG")]
    #[case(1000, "100.0 KG")]
    #[case(5, "0.5 KG")]
    fn weight_has_one_decimal(#[case] weight: u32, #[case] expected: &str) {
        assert_eq!(format_weight(weight), expected);
    }

    #[test]
    fn height_has_one_decimal() {
        assert_eq!(format_height(7), "0.7 M");
        assert_eq!(format_height(20), "2.0 M");
    }

    #[test]
    fn list_item_carries_id_into_image_url() {
        let item = ListItem::try_from(&resource("ivysaur", "https://pokeapi.co/api/v2/pokemon/2/")).unwrap();
        assert_eq!(item.id, 2);
        assert_eq!(item.name, "ivysaur");
        assert!(item.image_url.ends_with("/2.png"));
    }

    #[test]
    fn list_items_stop_at_broken_url() {
        let results = vec![
            resource("bulbasaur", "https://pokeapi.co/api/v2/pokemon/1/"),
            resource("missingno", "https://pokeapi.co/api/v2/pokemon/"),
        ];
        assert!(list_items(&results).is_err());
    }

    #[test]
    fn detail_item_combines_both_records() {
        let item = DetailItem::from_responses(&bulbasaur(), &bulbasaur_species()).unwrap();
        assert_eq!(
            item,
            DetailItem {
                display_id: "#001".to_string(),
                name: "bulbasaur".to_string(),
                description: "A strange seed was planted on its back at birth.".to_string(),
                weight: "6.9 KG".to_string(),
                height: "0.7 M".to_string(),
                color: "green".to_string(),
                image_url: image_url(1),
                abilities: vec![("overgrow".to_string(), false), ("chlorophyll".to_string(), true)],
                stats: vec![("hp".to_string(), 45), ("attack".to_string(), 49)],
                types: vec!["grass".to_string(), "poison".to_string()],
            }
        );
    }

    #[test]
    fn detail_description_is_empty_without_flavor_text() {
        let species = PokemonSpecies {
            flavor_text_entries: Vec::new(),
            ..bulbasaur_species()
        };
        let item = DetailItem::from_responses(&bulbasaur(), &species).unwrap();
        assert_eq!(item.description, "");
    }

    #[test]
    fn detail_rejects_broken_species_url() {
        let detail = PokemonDetail {
            species: resource("bulbasaur", "https://pokeapi.co/api/v2/pokemon-species/bulbasaur/"),
            ..bulbasaur()
        };
        assert!(DetailItem::from_responses(&detail, &bulbasaur_species()).is_err());
    }
}
