//! Request interception: attach a valid bearer credential or keep the
//! request from reaching the backend at all.
//!
//! Per request: a non-expired durable access token wins; failing that, a
//! non-expired volatile token (only when no durable access token exists at
//! all); failing that, one silent refresh attempt against the backend; and
//! when nothing is usable, forced logout. The refresh completes before the
//! guarded request is sent - a stale credential is never attached after a
//! refresh was triggered.
//!
//! Concurrent requests that each find a stale token are serialized by a
//! single-flight gate; whoever enters second reuses the first one's result
//! instead of refreshing again.

use std::future::Future;

use tracing::{debug, info, warn};

use super::Session;
use crate::api::ApiError;
use crate::routes;
use crate::token;

/// Outcome of an intercepted request.
#[derive(Debug)]
pub enum AuthError {
    /// No usable credential and no recoverable refresh path; forced logout
    /// has already cleared the session.
    SessionExpired,
    /// The backend call itself failed after a credential was attached.
    Api(ApiError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::SessionExpired => write!(f, "Session expired"),
            AuthError::Api(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::SessionExpired => None,
            AuthError::Api(e) => Some(e),
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(e: ApiError) -> Self {
        AuthError::Api(e)
    }
}

impl Session {
    /// Run `next` with a valid bearer credential, refreshing first when
    /// needed. `next` is never invoked when no credential can be produced.
    pub async fn intercept<T, F, Fut>(&self, next: F) -> Result<T, AuthError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let bearer = self.resolve_bearer().await?;
        next(bearer).await.map_err(AuthError::Api)
    }

    /// Produce a bearer credential per the interception policy, mutating
    /// the credential store when a refresh succeeds.
    pub(crate) async fn resolve_bearer(&self) -> Result<String, AuthError> {
        if let Some(bearer) = self.fresh_bearer(token::now_epoch_secs()) {
            return Ok(bearer);
        }

        // Stale or absent. Take the single-flight gate; a concurrent
        // request may have completed a refresh while we waited.
        let _gate = self.inner.refresh_gate.lock().await;
        let now = token::now_epoch_secs();
        if let Some(bearer) = self.fresh_bearer(now) {
            return Ok(bearer);
        }

        let durable = self.inner.store.durable();
        let refresh = match durable.refresh_token.as_deref().filter(|t| !t.is_empty()) {
            Some(refresh) if !token::is_expired(refresh, now) => refresh.to_string(),
            _ => {
                self.force_logout();
                return Err(AuthError::SessionExpired);
            }
        };

        let is_durable_session = durable
            .access_token
            .as_deref()
            .is_some_and(|t| !t.is_empty());

        debug!("Access token stale, refreshing");
        match self.inner.api.refresh(&refresh).await {
            Ok(grant) => match grant.access_token {
                Some(access) if !access.is_empty() => {
                    // Persistent sessions keep the new token in the durable
                    // slot (refresh token unchanged); temporary sessions in
                    // the volatile slot.
                    if is_durable_session {
                        self.inner.store.replace_durable_access(&access);
                    } else {
                        self.inner.store.set_volatile(&access);
                    }
                    Ok(access)
                }
                _ => {
                    warn!("Refresh succeeded without a usable access token");
                    self.force_logout();
                    Err(AuthError::SessionExpired)
                }
            },
            Err(e) => {
                warn!(error = %e, "Refresh call failed");
                self.force_logout();
                Err(AuthError::SessionExpired)
            }
        }
    }

    /// A non-expired credential already in the store. The durable access
    /// token takes precedence; the volatile token is consulted only when no
    /// durable access token exists at all. Empty strings count as absent.
    fn fresh_bearer(&self, now: u64) -> Option<String> {
        let durable_access = self
            .inner
            .store
            .durable()
            .access_token
            .filter(|t| !t.is_empty());
        match durable_access {
            Some(access) if !token::is_expired(&access, now) => Some(access),
            Some(_) => None,
            None => self
                .inner
                .store
                .volatile()
                .filter(|tmp| !token::is_expired(tmp, now)),
        }
    }

    /// Unrecoverable-failure path: clear every credential, drop the user,
    /// and redirect to login with the attempted path as `returnUrl` - an
    /// expired session looks identical to "never logged in". Idempotent;
    /// repeated calls just re-issue the (replace) redirect.
    pub(crate) fn force_logout(&self) {
        self.inner.store.clear_durable();
        self.inner.store.clear_volatile();
        self.inner.state.send_modify(|state| {
            state.user = None;
            state.loading = false;
        });

        let current = self.inner.navigator.current();
        self.inner
            .navigator
            .replace(routes::login_redirect(&current.path));
        info!("Session expired, forcing logout");
    }
}
