//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each snapshot type mirrors a core state but uses C-compatible
//! representations: `*mut c_char` instead of `String`, pointer + length
//! instead of `Vec`, and tagged enums with explicit discriminants.
//! Conversion and release functions live here to keep `lib.rs` focused on
//! the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::sync::Arc;

use pokedex_core::{
    ClientConfig, DetailItem, DetailUiState, ListItem, ListUiState, PokemonDetailController,
    PokemonListController, PokemonRepository,
};
use tokio::runtime::{Handle, Runtime};
use tokio::task::AbortHandle;

// ---------------------------------------------------------------------------
// Opaque handles
// ---------------------------------------------------------------------------

/// The context's Tokio runtime. Released without waiting: the last owner
/// to drop it shuts it down in the background, so a free never blocks the
/// host thread on in-flight requests.
pub(crate) struct HostRuntime {
    handle: Handle,
    runtime: Option<Runtime>,
}

impl HostRuntime {
    pub(crate) fn new(runtime: Runtime) -> Self {
        Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        }
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl Drop for HostRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Process-scoped context: the runtime, the pooled transport and the
/// repository shared by every controller created from it.
pub struct FfiPokedex {
    pub(crate) runtime: Arc<HostRuntime>,
    pub(crate) repository: Arc<PokemonRepository>,
    pub(crate) config: ClientConfig,
}

/// Handle to a list controller. Keeps the runtime alive while it exists.
pub struct FfiListController {
    pub(crate) inner: PokemonListController,
    pub(crate) runtime: Arc<HostRuntime>,
}

/// Handle to a detail controller. Keeps the runtime alive while it exists.
pub struct FfiDetailController {
    pub(crate) inner: PokemonDetailController,
    pub(crate) runtime: Arc<HostRuntime>,
}

/// An attached change listener. Freeing it detaches the listener.
pub struct FfiObserver {
    pub(crate) task: AbortHandle,
}

impl Drop for FfiObserver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Called on a runtime worker thread each time the observed state changes.
/// The host reads the new state with the matching `*_state` function.
pub type FfiStateCallback = Option<extern "C" fn(user_data: *mut c_void)>;

/// Host pointer handed back to the callback untouched.
pub(crate) struct UserData(*mut c_void);

// The host promises `user_data` may be used from any thread.
unsafe impl Send for UserData {}

impl UserData {
    pub(crate) fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub(crate) fn get(&self) -> *mut c_void {
        self.0
    }
}

// ---------------------------------------------------------------------------
// State snapshots
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiStateTag {
    Loading = 0,
    Error = 1,
    Success = 2,
}

#[repr(C)]
pub struct FfiListItem {
    pub id: u32,
    pub name: *mut c_char,
    pub image_url: *mut c_char,
}

/// Snapshot of the displayed list state.
///
/// `error_message` is set only for `Error`; `items`/`len`/`is_refreshing`
/// only for `Success`.
#[repr(C)]
pub struct FfiListState {
    pub tag: FfiStateTag,
    pub error_message: *mut c_char,
    pub items: *mut FfiListItem,
    pub len: u32,
    pub is_refreshing: bool,
}

#[repr(C)]
pub struct FfiAbility {
    pub name: *mut c_char,
    pub is_hidden: bool,
}

#[repr(C)]
pub struct FfiStat {
    pub name: *mut c_char,
    pub value: i32,
}

#[repr(C)]
pub struct FfiDetailItem {
    pub display_id: *mut c_char,
    pub name: *mut c_char,
    pub description: *mut c_char,
    pub weight: *mut c_char,
    pub height: *mut c_char,
    pub color: *mut c_char,
    pub image_url: *mut c_char,
    pub abilities: *mut FfiAbility,
    pub abilities_len: u32,
    pub stats: *mut FfiStat,
    pub stats_len: u32,
    pub types: *mut *mut c_char,
    pub types_len: u32,
}

/// Snapshot of the detail state. `detail` is non-null only for `Success`.
#[repr(C)]
pub struct FfiDetailState {
    pub tag: FfiStateTag,
    pub error_message: *mut c_char,
    pub detail: *mut FfiDetailItem,
}

impl FfiListState {
    pub(crate) fn from_core(state: &ListUiState) -> *mut Self {
        let snapshot = match state {
            ListUiState::Loading => FfiListState {
                tag: FfiStateTag::Loading,
                error_message: std::ptr::null_mut(),
                items: std::ptr::null_mut(),
                len: 0,
                is_refreshing: false,
            },
            ListUiState::Error { message } => FfiListState {
                tag: FfiStateTag::Error,
                error_message: c_string(message),
                items: std::ptr::null_mut(),
                len: 0,
                is_refreshing: false,
            },
            ListUiState::Success { items, is_refreshing } => {
                let (items, len) = into_raw_slice(items.iter().map(FfiListItem::from_core).collect());
                FfiListState {
                    tag: FfiStateTag::Success,
                    error_message: std::ptr::null_mut(),
                    items,
                    len,
                    is_refreshing: *is_refreshing,
                }
            }
        };
        Box::into_raw(Box::new(snapshot))
    }

    /// # Safety
    /// `state` must come from [`FfiListState::from_core`] and not be freed twice.
    pub(crate) unsafe fn free(state: *mut Self) {
        let state = unsafe { Box::from_raw(state) };
        unsafe {
            free_c_string(state.error_message);
            for item in from_raw_slice(state.items, state.len).iter() {
                free_c_string(item.name);
                free_c_string(item.image_url);
            }
        }
    }
}

impl FfiListItem {
    fn from_core(item: &ListItem) -> Self {
        FfiListItem {
            id: item.id,
            name: c_string(&item.name),
            image_url: c_string(&item.image_url),
        }
    }
}

impl FfiDetailState {
    pub(crate) fn from_core(state: &DetailUiState) -> *mut Self {
        let snapshot = match state {
            DetailUiState::Loading => FfiDetailState {
                tag: FfiStateTag::Loading,
                error_message: std::ptr::null_mut(),
                detail: std::ptr::null_mut(),
            },
            DetailUiState::Error { message } => FfiDetailState {
                tag: FfiStateTag::Error,
                error_message: c_string(message),
                detail: std::ptr::null_mut(),
            },
            DetailUiState::Success { detail } => FfiDetailState {
                tag: FfiStateTag::Success,
                error_message: std::ptr::null_mut(),
                detail: Box::into_raw(Box::new(FfiDetailItem::from_core(detail))),
            },
        };
        Box::into_raw(Box::new(snapshot))
    }

    /// # Safety
    /// `state` must come from [`FfiDetailState::from_core`] and not be freed twice.
    pub(crate) unsafe fn free(state: *mut Self) {
        let state = unsafe { Box::from_raw(state) };
        unsafe {
            free_c_string(state.error_message);
            if !state.detail.is_null() {
                Box::from_raw(state.detail).free_fields();
            }
        }
    }
}

impl FfiDetailItem {
    fn from_core(detail: &DetailItem) -> Self {
        let (abilities, abilities_len) = into_raw_slice(
            detail
                .abilities
                .iter()
                .map(|(name, is_hidden)| FfiAbility {
                    name: c_string(name),
                    is_hidden: *is_hidden,
                })
                .collect(),
        );
        let (stats, stats_len) = into_raw_slice(
            detail
                .stats
                .iter()
                .map(|(name, value)| FfiStat {
                    name: c_string(name),
                    value: *value,
                })
                .collect(),
        );
        let (types, types_len) = into_raw_slice(detail.types.iter().map(|t| c_string(t)).collect());

        FfiDetailItem {
            display_id: c_string(&detail.display_id),
            name: c_string(&detail.name),
            description: c_string(&detail.description),
            weight: c_string(&detail.weight),
            height: c_string(&detail.height),
            color: c_string(&detail.color),
            image_url: c_string(&detail.image_url),
            abilities,
            abilities_len,
            stats,
            stats_len,
            types,
            types_len,
        }
    }

    unsafe fn free_fields(&self) {
        unsafe {
            for field in [
                self.display_id,
                self.name,
                self.description,
                self.weight,
                self.height,
                self.color,
                self.image_url,
            ] {
                free_c_string(field);
            }
            for ability in from_raw_slice(self.abilities, self.abilities_len).iter() {
                free_c_string(ability.name);
            }
            for stat in from_raw_slice(self.stats, self.stats_len).iter() {
                free_c_string(stat.name);
            }
            for kind in from_raw_slice(self.types, self.types_len).iter() {
                free_c_string(*kind);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Heap C string owned by the caller. Interior NULs are dropped.
pub(crate) fn c_string(value: &str) -> *mut c_char {
    CString::new(value.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

/// # Safety
/// `ptr` must be null or come from [`c_string`].
pub(crate) unsafe fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

fn into_raw_slice<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    (Box::into_raw(items.into_boxed_slice()) as *mut T, len)
}

/// # Safety
/// `ptr`/`len` must come from [`into_raw_slice`].
unsafe fn from_raw_slice<T>(ptr: *mut T, len: u32) -> Box<[T]> {
    if ptr.is_null() {
        return Box::default();
    }
    unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len as usize)) }
}
