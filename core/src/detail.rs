//! Detail page controller.
//!
//! A load runs the detail and species fetches concurrently. The first
//! failure observed ends the load with an error; when both are ready in the
//! same poll the detail fetch is reported, since it is polled first.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, error, info};

use crate::model::DetailItem;
use crate::repository::PokemonRepository;
use crate::scope::{lock, Latest, TaskScope};
use crate::state::DetailUiState;

pub struct PokemonDetailController {
    repository: Arc<PokemonRepository>,
    state: Arc<watch::Sender<DetailUiState>>,
    latest: Arc<Latest>,
    last_id: Mutex<Option<u32>>,
    in_flight: Mutex<Option<AbortHandle>>,
    scope: TaskScope,
}

impl PokemonDetailController {
    /// Must be called within a Tokio runtime. Nothing is fetched until
    /// [`load`](Self::load).
    pub fn new(repository: Arc<PokemonRepository>) -> Self {
        let (state, _) = watch::channel(DetailUiState::Loading);
        Self {
            repository,
            state: Arc::new(state),
            latest: Arc::new(Latest::default()),
            last_id: Mutex::new(None),
            in_flight: Mutex::new(None),
            scope: TaskScope::current(),
        }
    }

    pub fn state(&self) -> DetailUiState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailUiState> {
        self.state.subscribe()
    }

    pub fn load(&self, id: u32) {
        *lock(&self.last_id) = Some(id);

        let ticket = self.latest.begin();
        self.latest.publish(ticket, &self.state, DetailUiState::Loading);

        let repository = Arc::clone(&self.repository);
        let state = Arc::clone(&self.state);
        let latest = Arc::clone(&self.latest);

        let task = self.scope.spawn(async move {
            let fetched = tokio::try_join!(
                repository.pokemon_details(id),
                repository.pokemon_species(id)
            );
            let next = match fetched {
                Ok((detail, species)) => match DetailItem::from_responses(&detail, &species) {
                    Ok(detail) => DetailUiState::Success { detail },
                    Err(defect) => {
                        error!(id, error = %defect, "species broke the resource URL contract");
                        return;
                    }
                },
                Err(failure) => DetailUiState::error(failure),
            };
            let label = next.label();
            if latest.publish(ticket, &state, next) {
                info!(id, state = label, "detail state changed");
            }
        });

        if let Some(previous) = lock(&self.in_flight).replace(task) {
            previous.abort();
        }
    }

    /// Load the last requested id again. Does nothing before the first load.
    pub fn retry(&self) {
        let last = *lock(&self.last_id);
        match last {
            Some(id) => self.load(id),
            None => debug!("detail retry ignored, nothing loaded yet"),
        }
    }
}
