//! Client core for a PokeAPI-backed Pokédex.
//!
//! # Overview
//! Everything below the UI lives here: building requests, executing them
//! through a [`Transport`], classifying failures, mapping wire DTOs into
//! display models and driving the list and detail screen states.
//!
//! # Design
//! - `PokedexClient` keeps the host-does-IO split: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse`, no network access.
//! - `PokemonRepository` awaits an async `Transport` and returns one
//!   `FetchResult` per resource. Dropping the future cancels the request.
//! - Controllers own `watch` channels and a task scope; dropping a
//!   controller cancels its work.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod classifier;
pub mod client;
pub mod config;
pub mod detail;
pub mod error;
pub mod http;
pub mod list;
pub mod mapping;
pub mod model;
pub mod repository;
mod scope;
pub mod sharing;
pub mod state;
pub mod transport;
pub mod types;

pub use client::PokedexClient;
pub use config::ClientConfig;
pub use detail::PokemonDetailController;
pub use error::{Failure, FetchResult, LocalFailure, MappingError, NetworkFailure, TransportError};
pub use http::{HttpRequest, HttpResponse};
pub use list::PokemonListController;
pub use model::{DetailItem, ListItem};
pub use repository::PokemonRepository;
pub use sharing::{SharedState, Subscription};
pub use state::{DetailUiState, ListUiState};
pub use transport::{ReqwestTransport, Transport};
