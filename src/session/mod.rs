//! Reactive session state and its lifecycle operations.
//!
//! The session owns `{user, loading}` and is the only writer. State is
//! published through a `tokio::sync::watch` channel so guards and UI code
//! can observe transitions. Lifecycle: construction starts in the
//! restoring state (`user: None, loading: true`); [`Session::restore`]
//! resolves it to authenticated or anonymous from stored credentials;
//! login/logout move between the two afterwards.
//!
//! Every authorized backend call goes through the request interceptor in
//! [`interceptor`], which attaches a valid bearer credential or refuses to
//! send the request at all.

mod interceptor;

pub use interceptor::AuthError;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::api::{
    ApiError, AuthApi, ChangePassword, LoginParams, ProfileUpdate, RegisterParams, UserProfile,
};
use crate::routes::{self, Navigator, Route};
use crate::store::CredentialStore;

/// Observable session state. `loading` is true while the initial
/// restoration (or any operation that must block guarded rendering) is in
/// flight.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

pub(crate) struct SessionInner {
    pub(crate) api: Arc<dyn AuthApi>,
    pub(crate) store: Arc<dyn CredentialStore>,
    pub(crate) navigator: Arc<dyn Navigator>,
    pub(crate) state: watch::Sender<SessionState>,
    pub(crate) refresh_gate: tokio::sync::Mutex<()>,
}

/// The session context. Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(SessionInner {
                api,
                store,
                navigator,
                state,
                refresh_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Overwrite the current user (exposed setter; pages use it after
    /// profile updates they performed themselves).
    pub fn set_user(&self, user: Option<UserProfile>) {
        self.inner.state.send_modify(|state| state.user = user);
    }

    fn finish(&self, user: Option<UserProfile>) {
        self.inner.state.send_modify(|state| {
            state.user = user;
            state.loading = false;
        });
    }

    /// Rebuild the in-memory session from stored credentials.
    ///
    /// With a durable access token present, asks the backend who the user
    /// is (through the interceptor, so an expired token is silently
    /// refreshed). Without one the session is anonymous immediately; a
    /// volatile-only session never survives a restart.
    pub async fn restore(&self) {
        if self.inner.store.durable().access_token.is_none() {
            self.finish(None);
            return;
        }

        self.inner.state.send_modify(|state| state.loading = true);

        match self.me().await {
            Ok(user) => self.finish(Some(user)),
            Err(e) => {
                warn!(error = %e, "Session restore failed");
                self.inner.store.clear_durable();
                self.finish(None);

                let current = self.inner.navigator.current();
                if current.path.contains("login") {
                    self.inner.navigator.replace(Route::new(routes::LOGIN_PATH));
                }
            }
        }
    }

    /// Log in and persist credentials according to `remember_me`: the
    /// durable tier for persistent sessions, the volatile tier otherwise -
    /// exactly one of the two.
    ///
    /// On success, navigates to the current route's `returnUrl` parameter
    /// (if any, and not the root) or to the default landing route. On
    /// failure the error is returned unchanged and no state is touched;
    /// presentation belongs to the caller.
    pub async fn login(
        &self,
        params: LoginParams,
        remember_me: bool,
    ) -> Result<UserProfile, ApiError> {
        let grant = self.inner.api.login(&params).await?;

        if remember_me {
            let raw_user = match serde_json::to_string(&grant.user) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize user profile");
                    String::new()
                }
            };
            self.inner
                .store
                .set_durable(&raw_user, &grant.access_token, &grant.refresh_token);
            self.inner.store.clear_volatile();
        } else {
            self.inner.store.clear_durable();
            self.inner.store.set_volatile(&grant.access_token);
        }

        self.finish(Some(grant.user.clone()));

        let current = self.inner.navigator.current();
        let destination = match current.query_param(routes::RETURN_URL_PARAM) {
            Some(return_url) if return_url != routes::LANDING_PATH => Route::parse(return_url),
            _ => Route::new(routes::LANDING_PATH),
        };
        self.inner.navigator.replace(destination);

        Ok(grant.user)
    }

    /// Log out: notify the backend (fire-and-forget), clear both credential
    /// tiers, drop the user, navigate to the login page. Local cleanup does
    /// not wait for - or depend on - the backend call.
    pub async fn logout(&self) {
        let durable = self.inner.store.durable();
        let bearer = durable.access_token.or_else(|| self.inner.store.volatile());

        let api = Arc::clone(&self.inner.api);
        tokio::spawn(async move {
            if let Err(e) = api.logout(bearer.as_deref()).await {
                warn!(error = %e, "Backend logout failed");
            }
        });

        self.inner.store.clear_durable();
        self.inner.store.clear_volatile();
        self.finish(None);
        self.inner.navigator.push(Route::new(routes::LOGIN_PATH));
    }

    /// Discard the volatile token (page-unload hook): a temporary session
    /// must not survive a reload.
    pub fn discard_volatile(&self) {
        self.inner.store.clear_volatile();
    }

    /// `GET /auth/me` through the interceptor.
    pub async fn me(&self) -> Result<UserProfile, AuthError> {
        let api = Arc::clone(&self.inner.api);
        self.intercept(move |bearer| async move { api.me(&bearer).await })
            .await
    }

    /// `PUT /auth/me` through the interceptor; refreshes the cached user on
    /// success.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, AuthError> {
        let api = Arc::clone(&self.inner.api);
        let user = self
            .intercept(move |bearer| async move { api.update_me(&bearer, &update).await })
            .await?;
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    /// `PUT /auth/change-password` through the interceptor.
    pub async fn change_password(&self, change: ChangePassword) -> Result<(), AuthError> {
        let api = Arc::clone(&self.inner.api);
        self.intercept(move |bearer| async move { api.change_password(&bearer, &change).await })
            .await
    }

    /// `POST /auth/register`. Unauthenticated; errors are surfaced to the
    /// caller and no session state changes.
    pub async fn register(&self, params: RegisterParams) -> Result<UserProfile, ApiError> {
        self.inner.api.register(&params).await
    }
}
