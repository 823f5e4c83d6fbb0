//! Platform default storage

use crate::persistence::Store;
#[cfg(target_arch = "wasm32")]
use crate::persistence::StoreError;

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StoreError::Unavailable("LocalStorage is not accessible".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl Store for LocalStorageStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|_| StoreError::Unavailable(format!("could not read {key}")))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|_| StoreError::Unavailable(format!("could not write {key}")))
    }
}

/// Store used by the game outside tests
#[cfg(target_arch = "wasm32")]
pub fn default_store() -> Box<dyn Store> {
    Box::new(LocalStorageStore)
}

/// Store used by the game outside tests
///
/// Saves go to `$BALLOON_POP_SAVE_DIR`, or `./saves` when unset.
#[cfg(not(target_arch = "wasm32"))]
pub fn default_store() -> Box<dyn Store> {
    let dir = std::env::var_os("BALLOON_POP_SAVE_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("saves"));
    log::info!("Saving to {}", dir.display());
    Box::new(crate::persistence::FileStore::new(dir))
}
