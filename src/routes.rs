//! Navigation targets and the return-URL contract.
//!
//! The session core never renders pages; it only decides where the
//! navigation layer should go. A [`Route`] is a path plus query pairs, and
//! the [`Navigator`] trait is the seam between the core and whatever is
//! actually driving navigation (the CLI keeps a process-local history).

use std::sync::Mutex;

use tracing::debug;

/// Route of the login page.
pub const LOGIN_PATH: &str = "/login";

/// Default landing route after login.
pub const LANDING_PATH: &str = "/";

/// Query parameter carrying the originally attempted path across a login
/// redirect.
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// A navigation target: path plus query pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Parse a `path?query` string. Invalid query pairs are dropped.
    pub fn parse(target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        let query = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self {
            path: path.to_string(),
            query,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Render as `path?query` with percent-encoded values.
    pub fn to_target(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.query {
            serializer.append_pair(k, v);
        }
        format!("{}?{}", self.path, serializer.finish())
    }
}

/// The login redirect for a denied navigation to `current_path`.
///
/// The attempted path rides along as `returnUrl`, except for the root and
/// login paths, which redirect bare.
pub fn login_redirect(current_path: &str) -> Route {
    if current_path == LANDING_PATH || current_path == LOGIN_PATH {
        Route::new(LOGIN_PATH)
    } else {
        Route::new(LOGIN_PATH).with_param(RETURN_URL_PARAM, current_path)
    }
}

/// Replace/push navigation as seen from the session core.
pub trait Navigator: Send + Sync {
    /// The route currently displayed.
    fn current(&self) -> Route;

    /// Replace the current route (redirects; no history entry).
    fn replace(&self, route: Route);

    /// Navigate forward to a new route.
    fn push(&self, route: Route);
}

/// Process-local navigator keeping a simple history stack. The CLI binary
/// uses it to track where the session "is"; tests read the history to
/// assert on redirects.
pub struct ProcessNavigator {
    history: Mutex<Vec<Route>>,
}

impl ProcessNavigator {
    /// Start at the default landing route.
    pub fn new() -> Self {
        Self::starting_at(Route::new(LANDING_PATH))
    }

    /// Start at a specific route (e.g. a deep link).
    pub fn starting_at(route: Route) -> Self {
        Self {
            history: Mutex::new(vec![route]),
        }
    }

    /// Snapshot of the navigation history, oldest first.
    pub fn history(&self) -> Vec<Route> {
        self.history.lock().expect("navigator poisoned").clone()
    }
}

impl Default for ProcessNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for ProcessNavigator {
    fn current(&self) -> Route {
        self.history
            .lock()
            .expect("navigator poisoned")
            .last()
            .cloned()
            .unwrap_or_else(|| Route::new(LANDING_PATH))
    }

    fn replace(&self, route: Route) {
        debug!(target = %route.to_target(), "Replacing route");
        let mut history = self.history.lock().expect("navigator poisoned");
        history.pop();
        history.push(route);
    }

    fn push(&self, route: Route) {
        debug!(target = %route.to_target(), "Pushing route");
        self.history.lock().expect("navigator poisoned").push(route);
    }
}
