//! Save/load persistence
//!
//! Features:
//! - Flat key → JSON string stores (memory, file, LocalStorage on web)
//! - Typed JSON load/save helpers
//! - Debounced writes so bursts of changes cost a single save

pub mod debounce;
pub mod store;

pub use debounce::SaveDebouncer;
pub use store::{MemoryStore, Store, StoreError, load_json, save_json};

#[cfg(not(target_arch = "wasm32"))]
pub use store::FileStore;
