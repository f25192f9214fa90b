//! Route guards: decide whether a page renders, shows its fallback, or
//! redirects, from the session snapshot and the credential store.
//!
//! Pages declare two independent flags ([`PageAccess`]); the routing layer
//! picks the matching guard. Guards are pure decisions plus, for the
//! auth guard's denial path, the same cleanup the interceptor's forced
//! logout performs - an expired session and "never logged in" look the
//! same to navigation.

use crate::routes::{self, Route};
use crate::session::SessionState;
use crate::store::CredentialStore;
use crate::token;

/// Access flags a page declares. Both false means unguarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageAccess {
    pub requires_auth: bool,
    pub requires_guest: bool,
}

/// What the navigation layer should do with the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the page content
    Render,
    /// Render the page's fallback (loading spinner or blank)
    Fallback,
    /// Navigate away instead of rendering
    Redirect(Route),
}

/// Guard for pages that require an authenticated user.
///
/// While loading, the fallback shows instead of protected content. Once
/// loaded, a missing user with no valid volatile token redirects to login
/// with the attempted path as `returnUrl` (bare for the root and login
/// paths) and clears stray durable data. A missing user *with* a valid
/// volatile token keeps the fallback up while restoration completes.
pub fn require_auth(
    state: &SessionState,
    store: &dyn CredentialStore,
    current: &Route,
) -> GuardDecision {
    if state.loading {
        return GuardDecision::Fallback;
    }

    if state.user.is_none() {
        let now = token::now_epoch_secs();
        let volatile_valid = store
            .volatile()
            .is_some_and(|tmp| !token::is_expired(&tmp, now));

        if !volatile_valid {
            store.clear_durable();
            return GuardDecision::Redirect(routes::login_redirect(&current.path));
        }
        return GuardDecision::Fallback;
    }

    GuardDecision::Render
}

/// Guard for guest-only pages (login, register).
///
/// An already-persisted session (durable access token and user both
/// present) redirects to the landing route before the page renders; a
/// live in-memory user keeps the fallback up.
pub fn require_guest(state: &SessionState, store: &dyn CredentialStore) -> GuardDecision {
    if state.loading {
        return GuardDecision::Fallback;
    }

    let durable = store.durable();
    if durable.access_token.is_some() && durable.raw_user.is_some() {
        return GuardDecision::Redirect(Route::new(routes::LANDING_PATH));
    }

    if state.user.is_some() {
        return GuardDecision::Fallback;
    }

    GuardDecision::Render
}

/// Guard for unrestricted pages: only waits out the loading phase.
pub fn no_guard(state: &SessionState) -> GuardDecision {
    if state.loading {
        GuardDecision::Fallback
    } else {
        GuardDecision::Render
    }
}

/// Dispatch on a page's access flags. `requires_auth` wins when both
/// flags are set.
pub fn evaluate(
    access: PageAccess,
    state: &SessionState,
    store: &dyn CredentialStore,
    current: &Route,
) -> GuardDecision {
    if access.requires_auth {
        require_auth(state, store, current)
    } else if access.requires_guest {
        require_guest(state, store)
    } else {
        no_guard(state)
    }
}

/// Page-unload hook: a temporary (non-persistent) session must not
/// survive a full reload.
pub fn discard_volatile_on_unload(store: &dyn CredentialStore) {
    store.clear_volatile();
}
