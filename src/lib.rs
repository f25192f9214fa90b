pub mod api;
pub mod cli;
pub mod guard;
pub mod routes;
pub mod session;
pub mod store;
pub mod token;

use std::path::PathBuf;
use std::sync::Arc;

use api::HttpAuthApi;
use routes::ProcessNavigator;
use session::Session;
use store::FileCredentialStore;
use url::Url;

pub use api::{ApiError, AuthApi, LoginParams, UserProfile};
pub use session::{AuthError, SessionState};

/// Configuration for a production session wired to a live backend.
pub struct ClientConfig {
    /// Backend API base URL (e.g. `http://localhost:3001/api`)
    pub base_url: Url,
    /// Path of the durable credentials file
    pub credentials_path: PathBuf,
}

/// Create a session against the configured backend, with file-backed
/// durable credentials and a process-local navigator.
///
/// The returned session starts in the restoring state; call
/// [`Session::restore`] to resolve it from stored credentials.
pub fn create_session(config: &ClientConfig) -> Session {
    let api = Arc::new(HttpAuthApi::new(config.base_url.clone()));
    let store = Arc::new(FileCredentialStore::open(&config.credentials_path));
    let navigator = Arc::new(ProcessNavigator::new());
    Session::new(api, store, navigator)
}
