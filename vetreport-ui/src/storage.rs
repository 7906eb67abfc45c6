#![cfg(target_arch = "wasm32")]

//! Backend lịch sử trên `window.localStorage`.

use vetreport_core::{HistoryBackend, ReportError, HISTORY_STORAGE_KEY};
use web_sys::Storage;

#[derive(Debug, Clone)]
pub struct LocalStorageBackend {
    key: String,
}

impl LocalStorageBackend {
    pub fn new() -> Self {
        Self::with_key(HISTORY_STORAGE_KEY)
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage(&self) -> Result<Storage, ReportError> {
        web_sys::window()
            .ok_or_else(|| ReportError::Storage("Không có window".to_string()))?
            .local_storage()
            .map_err(|err| ReportError::Storage(format!("{err:?}")))?
            .ok_or_else(|| ReportError::Storage("localStorage bị tắt".to_string()))
    }
}

impl Default for LocalStorageBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBackend for LocalStorageBackend {
    fn load(&self) -> Result<Option<String>, ReportError> {
        self.storage()?
            .get_item(&self.key)
            .map_err(|err| ReportError::Storage(format!("{err:?}")))
    }

    fn save(&mut self, payload: &str) -> Result<(), ReportError> {
        self.storage()?
            .set_item(&self.key, payload)
            .map_err(|err| ReportError::Storage(format!("{err:?}")))
    }
}
