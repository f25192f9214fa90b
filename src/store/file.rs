//! File-backed credential store.
//!
//! The durable tier is a small JSON document on disk, rewritten atomically
//! (temp file + rename) on every mutation. The volatile tier lives in
//! memory only, so a temporary session never survives the process.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use super::{CredentialStore, DurableCredentials};

/// Credential store persisting the durable tier at a configurable path.
pub struct FileCredentialStore {
    path: PathBuf,
    durable: Mutex<DurableCredentials>,
    volatile: Mutex<Option<String>>,
}

impl FileCredentialStore {
    /// Open the store, loading any previously persisted credentials.
    /// A missing or unreadable file yields the empty state.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let durable = load(&path);
        Self {
            path,
            durable: Mutex::new(durable),
            volatile: Mutex::new(None),
        }
    }

    fn persist(&self, creds: &DurableCredentials) {
        if let Err(e) = try_persist(&self.path, creds) {
            warn!(path = %self.path.display(), error = %e, "Failed to persist credentials");
        }
    }
}

fn load(path: &Path) -> DurableCredentials {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return DurableCredentials::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read credentials file");
            return DurableCredentials::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(creds) => creds,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt credentials file, starting empty");
            DurableCredentials::default()
        }
    }
}

fn try_persist(path: &Path, creds: &DurableCredentials) -> Result<(), std::io::Error> {
    if creds.is_empty() {
        match fs::remove_file(path) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        }
    }

    let json = serde_json::to_string_pretty(creds).map_err(std::io::Error::other)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)
}

impl CredentialStore for FileCredentialStore {
    fn set_durable(&self, raw_user: &str, access_token: &str, refresh_token: &str) {
        let mut durable = self.durable.lock().expect("credential store poisoned");
        *durable = DurableCredentials {
            access_token: Some(access_token.to_string()),
            refresh_token: Some(refresh_token.to_string()),
            raw_user: Some(raw_user.to_string()),
        };
        self.persist(&durable);
    }

    fn durable(&self) -> DurableCredentials {
        self.durable.lock().expect("credential store poisoned").clone()
    }

    fn clear_durable(&self) {
        let mut durable = self.durable.lock().expect("credential store poisoned");
        *durable = DurableCredentials::default();
        self.persist(&durable);
    }

    fn replace_durable_access(&self, access_token: &str) {
        let mut durable = self.durable.lock().expect("credential store poisoned");
        durable.access_token = Some(access_token.to_string());
        self.persist(&durable);
    }

    fn set_volatile(&self, access_token: &str) {
        *self.volatile.lock().expect("credential store poisoned") =
            Some(access_token.to_string());
    }

    fn volatile(&self) -> Option<String> {
        self.volatile.lock().expect("credential store poisoned").clone()
    }

    fn clear_volatile(&self) {
        *self.volatile.lock().expect("credential store poisoned") = None;
    }
}
