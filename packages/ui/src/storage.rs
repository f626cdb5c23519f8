//! Platform session storage.
//!
//! - **Web** (WASM): the browser's `localStorage`
//! - **Native**: a JSON file under the user's data directory

use api::auth::{SessionStorage, SESSION_KEY};

/// Create the platform-appropriate session slot.
pub fn session_storage() -> impl SessionStorage + 'static {
    #[cfg(target_arch = "wasm32")]
    {
        BrowserStorage
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let path = dirs::data_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("movienotes")
            .join(format!("{SESSION_KEY}.json"));
        FileStorage::new(path)
    }
}

/// `localStorage` entry under [`SESSION_KEY`].
#[cfg(target_arch = "wasm32")]
pub struct BrowserStorage;

#[cfg(target_arch = "wasm32")]
impl BrowserStorage {
    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl SessionStorage for BrowserStorage {
    fn read(&self) -> Option<String> {
        Self::local_storage()?.get_item(SESSION_KEY).ok().flatten()
    }

    fn write(&self, value: Option<&str>) {
        let Some(storage) = Self::local_storage() else {
            tracing::warn!("localStorage unavailable, session not saved");
            return;
        };
        let result = match value {
            Some(value) => storage.set_item(SESSION_KEY, value),
            None => storage.remove_item(SESSION_KEY),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to update saved session: {:?}", e);
        }
    }
}

/// Session kept in a single file.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileStorage {
    path: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SessionStorage for FileStorage {
    fn read(&self) -> Option<String> {
        std::fs::read_to_string(&self.path).ok()
    }

    fn write(&self, value: Option<&str>) {
        let result = match value {
            Some(value) => self
                .path
                .parent()
                .map_or(Ok(()), std::fs::create_dir_all)
                .and_then(|()| std::fs::write(&self.path, value)),
            None => match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(e) = result {
            tracing::warn!("Failed to update saved session at {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("session.json"));
        assert!(storage.read().is_none());

        storage.write(Some(r#"{"access_token":"a"}"#));
        assert_eq!(storage.read().as_deref(), Some(r#"{"access_token":"a"}"#));

        storage.write(None);
        assert!(storage.read().is_none());
        // Clearing an empty slot is quiet.
        storage.write(None);
    }
}
