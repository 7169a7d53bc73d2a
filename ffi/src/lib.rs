//! C-ABI wrapper around `pokedex-core`.
//!
//! # Overview
//! Exposes the list and detail controllers through `extern "C"` functions so
//! a native host can drive the Pokédex screens without linking to Rust's
//! async runtime or serde directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `pokedex_new` owns the Tokio runtime and the pooled transport; each
//!   controller handle keeps that runtime alive until it is freed. The last
//!   free shuts the runtime down without waiting for in-flight requests.
//! - States are handed out as `#[repr(C)]` snapshots. Change notification is
//!   a bare callback; the host then pulls a fresh snapshot.
//! - The C caller owns all returned pointers and must call the matching
//!   `pokedex_*free*` function to release them. Handles must not be freed
//!   from inside an observer callback.

pub mod types;

use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use pokedex_core::{ClientConfig, PokemonDetailController, PokemonListController, PokemonRepository};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use types::*;

/// Read a borrowed C string; null or invalid UTF-8 yields `None`.
fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Process lifecycle
// ---------------------------------------------------------------------------

/// Install a `tracing` fmt subscriber filtered by `RUST_LOG` (default
/// `info`). Returns false if a subscriber was already installed.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_init_logging() -> bool {
    catch_unwind(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .try_init()
            .is_ok()
    })
    .unwrap_or(false)
}

/// Create the Pokédex context: runtime, transport and repository.
///
/// Configuration comes from the `POKEDEX_*` environment variables; a
/// non-null `base_url` overrides `POKEDEX_BASE_URL`. Returns null if the
/// runtime cannot be started or if an internal panic occurs.
/// The caller must free the returned pointer with `pokedex_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_new(base_url: *const c_char) -> *mut FfiPokedex {
    catch_unwind(|| {
        let mut config = ClientConfig::from_env().unwrap_or_else(|err| {
            warn!(error = %err, "ignoring invalid environment configuration");
            ClientConfig::default()
        });
        if let Some(url) = read_str(base_url) {
            config.base_url = url.to_string();
        }

        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("pokedex-worker")
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!(error = %err, "could not start runtime");
                return std::ptr::null_mut();
            }
        };

        let runtime = HostRuntime::new(runtime);
        let repository = match PokemonRepository::from_config(&config) {
            Ok(repository) => Arc::new(repository),
            Err(err) => {
                warn!(error = %err, "could not build transport");
                return std::ptr::null_mut();
            }
        };

        info!(base_url = %config.base_url, "pokedex context created");
        Box::into_raw(Box::new(FfiPokedex {
            runtime: Arc::new(runtime),
            repository,
            config,
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a context created by `pokedex_new`. Safe to call with null.
/// Controllers created from it stay usable until they are freed.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_free(pokedex: *mut FfiPokedex) {
    if !pokedex.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(pokedex) });
        }));
    }
}

// ---------------------------------------------------------------------------
// List controller
// ---------------------------------------------------------------------------

/// Create a list controller and start its first fetch.
///
/// Returns null if `pokedex` is null.
/// The caller must free the returned pointer with `pokedex_list_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_list_new(pokedex: *const FfiPokedex) -> *mut FfiListController {
    catch_unwind(AssertUnwindSafe(|| {
        if pokedex.is_null() {
            return std::ptr::null_mut();
        }
        let pokedex = unsafe { &*pokedex };
        let _entered = pokedex.runtime.handle().enter();
        let inner = PokemonListController::new(Arc::clone(&pokedex.repository), &pokedex.config);
        Box::into_raw(Box::new(FfiListController {
            inner,
            runtime: Arc::clone(&pokedex.runtime),
        }))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Free a list controller, cancelling its work. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_list_free(list: *mut FfiListController) {
    if !list.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(list) });
        }));
    }
}

fn with_list(list: *const FfiListController, action: impl FnOnce(&FfiListController)) {
    if list.is_null() {
        return;
    }
    let list = unsafe { &*list };
    let _ = catch_unwind(AssertUnwindSafe(|| action(list)));
}

/// Fetch the list again. Ignored if `list` is null.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_list_fetch(list: *const FfiListController) {
    with_list(list, |list| list.inner.fetch());
}

/// Re-run the fetch after an error. Ignored if `list` is null.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_list_retry(list: *const FfiListController) {
    with_list(list, |list| list.inner.retry());
}

/// Pull-to-refresh. Ignored if `list` is null.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_list_refresh(list: *const FfiListController) {
    with_list(list, |list| list.inner.refresh());
}

/// Set the raw search query. A null `query` clears it.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_list_set_query(list: *const FfiListController, query: *const c_char) {
    with_list(list, |list| list.inner.set_search_query(read_str(query).unwrap_or("")));
}

#[unsafe(no_mangle)]
pub extern "C" fn pokedex_list_set_search_visible(list: *const FfiListController, visible: bool) {
    with_list(list, |list| list.inner.set_search_visible(visible));
}

/// Whether the search field is shown. False if `list` is null.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_list_search_visible(list: *const FfiListController) -> bool {
    if list.is_null() {
        return false;
    }
    let list = unsafe { &*list };
    catch_unwind(AssertUnwindSafe(|| list.inner.search_visible())).unwrap_or(false)
}

/// Snapshot of the displayed list state. Stays `Loading` until an observer
/// is attached with `pokedex_list_observe`.
///
/// Returns null if `list` is null.
/// The caller must free the returned pointer with `pokedex_free_list_state`.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_list_state(list: *const FfiListController) -> *mut FfiListState {
    if list.is_null() {
        return std::ptr::null_mut();
    }
    let list = unsafe { &*list };
    catch_unwind(AssertUnwindSafe(|| FfiListState::from_core(&list.inner.state())))
        .unwrap_or(std::ptr::null_mut())
}

/// Free a snapshot returned by `pokedex_list_state`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_free_list_state(state: *mut FfiListState) {
    if !state.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| unsafe { FfiListState::free(state) }));
    }
}

/// Attach `callback` to the displayed list state. Attaching starts the
/// list's filtering; it stops a grace period after the last observer is
/// freed.
///
/// Returns null if `list` or `callback` is null.
/// The caller must free the returned pointer with `pokedex_observer_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_list_observe(
    list: *const FfiListController,
    callback: FfiStateCallback,
    user_data: *mut c_void,
) -> *mut FfiObserver {
    let Some(callback) = callback else {
        return std::ptr::null_mut();
    };
    if list.is_null() {
        return std::ptr::null_mut();
    }
    let list = unsafe { &*list };
    let user_data = UserData::new(user_data);

    catch_unwind(AssertUnwindSafe(move || {
        let mut subscription = list.inner.subscribe();
        let task = list.runtime.handle().spawn(async move {
            while subscription.changed().await {
                callback(user_data.get());
            }
        });
        Box::into_raw(Box::new(FfiObserver {
            task: task.abort_handle(),
        }))
    }))
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Detail controller
// ---------------------------------------------------------------------------

/// Create a detail controller. Nothing is fetched until `pokedex_detail_load`.
///
/// Returns null if `pokedex` is null.
/// The caller must free the returned pointer with `pokedex_detail_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_detail_new(pokedex: *const FfiPokedex) -> *mut FfiDetailController {
    catch_unwind(AssertUnwindSafe(|| {
        if pokedex.is_null() {
            return std::ptr::null_mut();
        }
        let pokedex = unsafe { &*pokedex };
        let _entered = pokedex.runtime.handle().enter();
        let inner = PokemonDetailController::new(Arc::clone(&pokedex.repository));
        Box::into_raw(Box::new(FfiDetailController {
            inner,
            runtime: Arc::clone(&pokedex.runtime),
        }))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Free a detail controller, cancelling its work. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_detail_free(detail: *mut FfiDetailController) {
    if !detail.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(detail) });
        }));
    }
}

/// Load the Pokémon with `id`. Ignored if `detail` is null.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_detail_load(detail: *const FfiDetailController, id: u32) {
    if detail.is_null() {
        return;
    }
    let detail = unsafe { &*detail };
    let _ = catch_unwind(AssertUnwindSafe(|| detail.inner.load(id)));
}

/// Load the last requested id again. Ignored if `detail` is null.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_detail_retry(detail: *const FfiDetailController) {
    if detail.is_null() {
        return;
    }
    let detail = unsafe { &*detail };
    let _ = catch_unwind(AssertUnwindSafe(|| detail.inner.retry()));
}

/// Snapshot of the detail state.
///
/// Returns null if `detail` is null.
/// The caller must free the returned pointer with `pokedex_free_detail_state`.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_detail_state(detail: *const FfiDetailController) -> *mut FfiDetailState {
    if detail.is_null() {
        return std::ptr::null_mut();
    }
    let detail = unsafe { &*detail };
    catch_unwind(AssertUnwindSafe(|| FfiDetailState::from_core(&detail.inner.state())))
        .unwrap_or(std::ptr::null_mut())
}

/// Free a snapshot returned by `pokedex_detail_state`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_free_detail_state(state: *mut FfiDetailState) {
    if !state.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| unsafe { FfiDetailState::free(state) }));
    }
}

/// Attach `callback` to the detail state.
///
/// Returns null if `detail` or `callback` is null.
/// The caller must free the returned pointer with `pokedex_observer_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_detail_observe(
    detail: *const FfiDetailController,
    callback: FfiStateCallback,
    user_data: *mut c_void,
) -> *mut FfiObserver {
    let Some(callback) = callback else {
        return std::ptr::null_mut();
    };
    if detail.is_null() {
        return std::ptr::null_mut();
    }
    let detail = unsafe { &*detail };
    let user_data = UserData::new(user_data);

    catch_unwind(AssertUnwindSafe(move || {
        let mut states = detail.inner.subscribe();
        let task = detail.runtime.handle().spawn(async move {
            while states.changed().await.is_ok() {
                callback(user_data.get());
            }
        });
        Box::into_raw(Box::new(FfiObserver {
            task: task.abort_handle(),
        }))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Detach and free an observer. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pokedex_observer_free(observer: *mut FfiObserver) {
    if !observer.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(observer) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
