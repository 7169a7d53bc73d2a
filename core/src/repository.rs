//! Async repository over the PokeAPI.
//!
//! Every operation yields exactly one [`FetchResult`]. Transport failures
//! are classified here and never escape as raw errors. Retrying is the
//! caller's decision; nothing here retries.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::classifier::classify;
use crate::client::PokedexClient;
use crate::config::ClientConfig;
use crate::error::{FetchResult, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{PokemonDetail, PokemonPage, PokemonSpecies};

#[derive(Clone)]
pub struct PokemonRepository {
    client: PokedexClient,
    transport: Arc<dyn Transport>,
}

impl PokemonRepository {
    pub fn new(client: PokedexClient, transport: Arc<dyn Transport>) -> Self {
        Self { client, transport }
    }

    /// Repository backed by a fresh pooled `reqwest` transport.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::new(
            PokedexClient::new(&config.base_url, config.page_limit),
            Arc::new(ReqwestTransport::new(config)?),
        ))
    }

    pub async fn pokemon_list(&self) -> FetchResult<PokemonPage> {
        let response = self.execute(self.client.build_list_pokemon()).await?;
        self.client.parse_list_pokemon(response)
    }

    pub async fn pokemon_details(&self, id: u32) -> FetchResult<PokemonDetail> {
        let response = self.execute(self.client.build_get_pokemon(id)).await?;
        self.client.parse_get_pokemon(response)
    }

    pub async fn pokemon_species(&self, id: u32) -> FetchResult<PokemonSpecies> {
        let response = self.execute(self.client.build_get_species(id)).await?;
        self.client.parse_get_species(response)
    }

    /// Dropping the returned future drops the transport call with it.
    async fn execute(&self, request: HttpRequest) -> FetchResult<HttpResponse> {
        let url = request.url.clone();
        debug!(%url, "sending request");

        match self.transport.execute(request).await {
            Ok(response) => {
                debug!(%url, status = response.status, "received response");
                Ok(response)
            }
            Err(err) => {
                let failure = classify(&err);
                warn!(%url, error = %err, ?failure, "request failed");
                Err(failure)
            }
        }
    }
}
