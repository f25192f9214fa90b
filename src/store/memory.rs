//! In-memory credential store for tests and embedded use.

use std::sync::Mutex;

use super::{CredentialStore, DurableCredentials};

/// Credential store keeping both tiers in memory.
#[derive(Default)]
pub struct MemoryCredentialStore {
    durable: Mutex<DurableCredentials>,
    volatile: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn set_durable(&self, raw_user: &str, access_token: &str, refresh_token: &str) {
        *self.durable.lock().expect("credential store poisoned") = DurableCredentials {
            access_token: Some(access_token.to_string()),
            refresh_token: Some(refresh_token.to_string()),
            raw_user: Some(raw_user.to_string()),
        };
    }

    fn durable(&self) -> DurableCredentials {
        self.durable.lock().expect("credential store poisoned").clone()
    }

    fn clear_durable(&self) {
        *self.durable.lock().expect("credential store poisoned") =
            DurableCredentials::default();
    }

    fn replace_durable_access(&self, access_token: &str) {
        self.durable
            .lock()
            .expect("credential store poisoned")
            .access_token = Some(access_token.to_string());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_are_independent() {
        let store = MemoryCredentialStore::new();
        store.set_durable("user", "access", "refresh");
        store.set_volatile("temporary");

        store.clear_volatile();
        assert!(store.volatile().is_none());
        assert_eq!(store.durable().access_token.as_deref(), Some("access"));

        store.set_volatile("temporary");
        store.clear_durable();
        assert!(store.durable().is_empty());
        assert_eq!(store.volatile().as_deref(), Some("temporary"));
    }

    #[test]
    fn test_durable_slots_cleared_together() {
        let store = MemoryCredentialStore::new();
        store.set_durable("user", "access", "refresh");
        store.clear_durable();

        let durable = store.durable();
        assert!(durable.access_token.is_none());
        assert!(durable.refresh_token.is_none());
        assert!(durable.raw_user.is_none());
    }
}
