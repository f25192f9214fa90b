//! Credential storage.
//!
//! Two tiers: a *durable* tier holding the access token, refresh token and
//! serialized user for "remember me" sessions (survives restarts), and a
//! *volatile* tier holding a temporary access token for sessions that must
//! not outlive the process. Login populates exactly one tier.
//!
//! This layer is pure storage: no token validation happens here, and no
//! operation ever fails at the API boundary - I/O errors are logged and
//! swallowed, absent keys read back as `None`.

mod file;
mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

use serde::{Deserialize, Serialize};

/// The durable credential slots. Written together at login, cleared
/// together on logout; only the access token is replaced on refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DurableCredentials {
    /// Short-lived bearer credential for authenticated calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Longer-lived credential used solely to obtain a new access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Serialized user profile as returned at login
    #[serde(rename = "user", default, skip_serializing_if = "Option::is_none")]
    pub raw_user: Option<String>,
}

impl DurableCredentials {
    /// Whether every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.raw_user.is_none()
    }
}

/// Store for session credentials.
///
/// All operations are synchronous and infallible; implementations swallow
/// storage errors and fall back to the empty state.
pub trait CredentialStore: Send + Sync {
    /// Write all durable slots at once (persistent login).
    fn set_durable(&self, raw_user: &str, access_token: &str, refresh_token: &str);

    /// Read the durable slots.
    fn durable(&self) -> DurableCredentials;

    /// Clear every durable slot.
    fn clear_durable(&self);

    /// Overwrite only the durable access token, preserving the refresh
    /// token and user (successful refresh of a persistent session).
    fn replace_durable_access(&self, access_token: &str);

    /// Write the volatile temporary access token (non-persistent login).
    fn set_volatile(&self, access_token: &str);

    /// Read the volatile temporary access token.
    fn volatile(&self) -> Option<String>;

    /// Clear the volatile slot.
    fn clear_volatile(&self);
}
