//! Stateless HTTP request builder and response parser for the PokeAPI.
//!
//! # Design
//! `PokedexClient` holds only a `base_url` and the page size, and carries no
//! mutable state between calls. Each endpoint is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. Executing the round-trip belongs to a transport, which
//! keeps this layer deterministic and free of I/O.

use serde::de::DeserializeOwned;

use crate::classifier::server_error_message;
use crate::error::{FetchResult, NetworkFailure};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{PokemonDetail, PokemonPage, PokemonSpecies};

/// Server error reported when a successful response has nothing in it.
pub const EMPTY_BODY_MESSAGE: &str = "Empty body";

#[derive(Debug, Clone)]
pub struct PokedexClient {
    base_url: String,
    page_limit: u32,
}

impl PokedexClient {
    pub fn new(base_url: &str, page_limit: u32) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            page_limit,
        }
    }

    pub fn build_list_pokemon(&self) -> HttpRequest {
        self.get(format!("{}/pokemon?limit={}&offset=0", self.base_url, self.page_limit))
    }

    pub fn build_get_pokemon(&self, id: u32) -> HttpRequest {
        self.get(format!("{}/pokemon/{id}", self.base_url))
    }

    pub fn build_get_species(&self, id: u32) -> HttpRequest {
        self.get(format!("{}/pokemon-species/{id}", self.base_url))
    }

    pub fn parse_list_pokemon(&self, response: HttpResponse) -> FetchResult<PokemonPage> {
        parse_body(response)
    }

    pub fn parse_get_pokemon(&self, response: HttpResponse) -> FetchResult<PokemonDetail> {
        parse_body(response)
    }

    pub fn parse_get_species(&self, response: HttpResponse) -> FetchResult<PokemonSpecies> {
        parse_body(response)
    }

    fn get(&self, url: String) -> HttpRequest {
        HttpRequest {
            url,
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }
}

/// Turn a response into exactly one result: the server-error path for
/// non-2xx, a fixed server error for an empty 2xx, otherwise the decoded body.
fn parse_body<T: DeserializeOwned>(response: HttpResponse) -> FetchResult<T> {
    if !response.is_success() {
        return Err(NetworkFailure::ServerError(Some(server_error_message(&response))));
    }
    if !response.has_body() {
        return Err(NetworkFailure::server_error(EMPTY_BODY_MESSAGE));
    }
    serde_json::from_str(&response.body).map_err(|e| {
        tracing::warn!(error = %e, "response body did not match the expected schema");
        NetworkFailure::Serialization
    })
}
