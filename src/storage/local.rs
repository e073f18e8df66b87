//! `window.localStorage` backend

use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::errors::StorageError;

use super::StorageBackend;

pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    /// Open the window's local storage; fails in contexts without one
    /// (workers, disabled storage, some private modes)
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable)?;
        let storage = window
            .local_storage()
            .map_err(|_| StorageError::Unavailable)?
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { storage })
    }
}

fn js_message(err: JsValue) -> String {
    err.as_string()
        .or_else(|| {
            js_sys::Reflect::get(&err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", err))
}

impl StorageBackend for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|_| StorageError::Unavailable)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::WriteFailure(js_message(e)))
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::WriteFailure(js_message(e)))
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.storage
            .clear()
            .map_err(|e| StorageError::WriteFailure(js_message(e)))
    }
}
