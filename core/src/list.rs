//! Catalog list controller.
//!
//! # Design
//! Three single-writer `watch` cells feed the screen:
//! - `base`: the canonical fetch outcome, written only by fetch tasks;
//! - `query`: the raw search text, written on every keystroke;
//! - `search_visible`: whether the search field is shown.
//!
//! The displayed state is derived by a producer that owns a debounce timer
//! over `query` and re-runs [`filter_state`] whenever `base` or the applied
//! query changes. The producer is shared with [`SharedState`], so it only
//! runs while the screen observes it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::ClientConfig;
use crate::mapping::list_items;
use crate::repository::PokemonRepository;
use crate::scope::{lock, Latest, TaskScope};
use crate::sharing::{SharedState, Subscription};
use crate::state::{filter_state, ListUiState};

pub struct PokemonListController {
    repository: Arc<PokemonRepository>,
    base: Arc<watch::Sender<ListUiState>>,
    query: watch::Sender<String>,
    search_visible: watch::Sender<bool>,
    ui: SharedState<ListUiState>,
    latest: Arc<Latest>,
    in_flight: Mutex<Option<AbortHandle>>,
    scope: TaskScope,
}

impl PokemonListController {
    /// Create the controller and start the first fetch. Must be called
    /// within a Tokio runtime.
    pub fn new(repository: Arc<PokemonRepository>, config: &ClientConfig) -> Self {
        let scope = TaskScope::current();
        let (base, base_rx) = watch::channel(ListUiState::Loading);
        let (query, query_rx) = watch::channel(String::new());
        let (search_visible, _) = watch::channel(false);

        let debounce = config.search_debounce;
        let ui = SharedState::new(
            scope.runtime().clone(),
            ListUiState::Loading,
            config.stop_timeout,
            move |output| compose(base_rx.clone(), query_rx.clone(), output, debounce),
        );

        let controller = Self {
            repository,
            base: Arc::new(base),
            query,
            search_visible,
            ui,
            latest: Arc::new(Latest::default()),
            in_flight: Mutex::new(None),
            scope,
        };
        controller.fetch();
        controller
    }

    /// Displayed state. Stays `Loading` while nobody is subscribed.
    pub fn state(&self) -> ListUiState {
        self.ui.value()
    }

    pub fn subscribe(&self) -> Subscription<ListUiState> {
        self.ui.subscribe()
    }

    pub fn is_observed(&self) -> bool {
        self.ui.is_active()
    }

    /// Fetch the list and replace the base state with the outcome. A fetch
    /// still in flight is cancelled.
    pub fn fetch(&self) {
        let ticket = self.latest.begin();
        let repository = Arc::clone(&self.repository);
        let base = Arc::clone(&self.base);
        let latest = Arc::clone(&self.latest);

        let task = self.scope.spawn(async move {
            let next = match repository.pokemon_list().await {
                Ok(page) => match list_items(&page.results) {
                    Ok(items) => ListUiState::Success {
                        items,
                        is_refreshing: false,
                    },
                    Err(defect) => {
                        error!(error = %defect, "list page broke the resource URL contract");
                        return;
                    }
                },
                Err(failure) => ListUiState::error(failure),
            };
            let label = next.label();
            if latest.publish(ticket, &base, next) {
                info!(state = label, "list state changed");
            }
        });

        if let Some(previous) = lock(&self.in_flight).replace(task) {
            previous.abort();
        }
    }

    /// Re-run the fetch after an error.
    pub fn retry(&self) {
        self.fetch();
    }

    /// Mark a loaded list as refreshing and fetch again. The flag is cleared
    /// by whichever state the fetch publishes.
    pub fn refresh(&self) {
        let current = self.base.borrow().clone();
        if let ListUiState::Success { items, .. } = current {
            self.base.send_replace(ListUiState::Success {
                items,
                is_refreshing: true,
            });
        }
        self.fetch();
    }

    pub fn set_search_query(&self, query: &str) {
        self.query.send_replace(query.to_string());
    }

    pub fn search_query(&self) -> String {
        self.query.borrow().clone()
    }

    pub fn set_search_visible(&self, visible: bool) {
        self.search_visible.send_replace(visible);
    }

    pub fn search_visible(&self) -> bool {
        *self.search_visible.borrow()
    }

    pub fn subscribe_search_visible(&self) -> watch::Receiver<bool> {
        self.search_visible.subscribe()
    }
}

/// Combine the base state with the debounced query until either source
/// goes away.
async fn compose(
    mut base: watch::Receiver<ListUiState>,
    mut query: watch::Receiver<String>,
    output: watch::Sender<ListUiState>,
    debounce: Duration,
) {
    let mut applied = query.borrow_and_update().clone();
    let mut pending: Option<(String, Instant)> = None;
    publish(&output, filter_state(&base.borrow_and_update(), &applied));

    loop {
        let deadline = pending.as_ref().map(|(_, at)| *at);
        tokio::select! {
            changed = base.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = filter_state(&base.borrow_and_update(), &applied);
                publish(&output, next);
            }
            changed = query.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = query.borrow_and_update().clone();
                pending = Some((latest, Instant::now() + debounce));
            }
            _ = sleep_until(deadline) => {
                if let Some((latest, _)) = pending.take() {
                    if latest != applied {
                        debug!(query = %latest, "applying search query");
                        applied = latest;
                        let next = filter_state(&base.borrow(), &applied);
                        publish(&output, next);
                    }
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Equal consecutive states are not re-emitted.
fn publish(output: &watch::Sender<ListUiState>, next: ListUiState) {
    output.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PokedexClient;
    use crate::error::TransportError;
    use crate::http::{HttpRequest, HttpResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PAGE: &str = r#"{"count":2,"next":null,"previous":null,"results":[
        {"name":"bulbasaur","url":"https://pokeapi.co/api/v2/pokemon/1/"},
        {"name":"ivysaur","url":"https://pokeapi.co/api/v2/pokemon/2/"}]}"#;

    fn config() -> ClientConfig {
        ClientConfig {
            search_debounce: Duration::from_millis(20),
            stop_timeout: Duration::from_millis(50),
            ..ClientConfig::default()
        }
    }

    fn repository<F>(reply: F) -> Arc<PokemonRepository>
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        let reply = move |request: HttpRequest| std::future::ready(reply(&request));
        Arc::new(PokemonRepository::new(
            PokedexClient::new("http://pokedex.test/api/v2", 100),
            Arc::new(reply),
        ))
    }

    fn ok(body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: 200,
            reason: "OK".to_string(),
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    async fn within<T>(future: impl std::future::Future<Output = T>) -> T {
        tokio::time::timeout(Duration::from_secs(5), future)
            .await
            .expect("timed out waiting for state")
    }

    #[tokio::test]
    async fn unobserved_state_is_loading() {
        let controller = PokemonListController::new(repository(|_| ok(PAGE)), &config());
        assert_eq!(controller.state(), ListUiState::Loading);
        assert!(!controller.is_observed());
    }

    #[tokio::test]
    async fn observed_fetch_reaches_success() {
        let controller = PokemonListController::new(repository(|_| ok(PAGE)), &config());
        let mut states = controller.subscribe();
        let state = within(states.wait_for(|s| matches!(s, ListUiState::Success { .. })))
            .await
            .unwrap();
        assert_eq!(state.items().len(), 2);
        assert!(!state.is_refreshing());
    }

    #[tokio::test]
    async fn query_is_debounced_then_applied() {
        let controller = PokemonListController::new(repository(|_| ok(PAGE)), &config());
        let mut states = controller.subscribe();
        within(states.wait_for(|s| s.items().len() == 2)).await;

        controller.set_search_query("b");
        controller.set_search_query("iv");
        assert_eq!(controller.search_query(), "iv");

        let state = within(states.wait_for(|s| s.items().len() == 1)).await.unwrap();
        assert_eq!(state.items()[0].name, "ivysaur");

        controller.set_search_query("  ");
        within(states.wait_for(|s| s.items().len() == 2)).await;
    }

    #[tokio::test]
    async fn mapping_defect_publishes_nothing() {
        let broken = r#"{"count":1,"next":null,"previous":null,"results":[{"name":"missingno","url":"https://pokeapi.co/api/v2/pokemon/"}]}"#;
        let controller = PokemonListController::new(repository(move |_| ok(broken)), &config());
        let states = controller.subscribe();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(states.current(), ListUiState::Loading);
    }

    #[tokio::test]
    async fn refresh_failure_clears_refresh_flag() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let controller = PokemonListController::new(
            repository(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    ok(PAGE)
                } else {
                    Err(TransportError::HostUnresolved)
                }
            }),
            &config(),
        );
        let mut states = controller.subscribe();
        within(states.wait_for(|s| s.items().len() == 2)).await;

        controller.refresh();
        let state = within(states.wait_for(|s| matches!(s, ListUiState::Error { .. })))
            .await
            .unwrap();
        assert_eq!(
            state,
            ListUiState::Error {
                message: "No internet connection".to_string()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn search_visibility_is_tracked() {
        let controller = PokemonListController::new(repository(|_| ok(PAGE)), &config());
        let mut visible = controller.subscribe_search_visible();
        assert!(!controller.search_visible());

        controller.set_search_visible(true);
        within(visible.changed()).await.unwrap();
        assert!(*visible.borrow());
    }
}
