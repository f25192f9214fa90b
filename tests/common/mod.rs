#![allow(dead_code)]

//! Mock auth backend for integration tests.
//!
//! A real axum server on a random port, speaking the backend envelope
//! format and minting real JWTs, so the session core is exercised over
//! actual HTTP. Call counters and failure toggles let tests assert on
//! exactly which backend operations ran.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const SECRET: &[u8] = b"mock-backend-secret";
pub const EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "correct-horse-battery";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
}

/// Mint a token signed with the mock backend's secret, expiring
/// `offset_secs` from now (negative for already-expired tokens).
pub fn mint_token(sub: &str, offset_secs: i64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let claims = Claims {
        sub: sub.to_string(),
        exp: (now + offset_secs).max(0) as u64,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

pub struct MockState {
    pub user: std::sync::Mutex<Value>,
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    /// Refresh answers 200 with no usable token
    pub refresh_returns_empty: AtomicBool,
    /// Refresh answers 401
    pub refresh_rejects: AtomicBool,
    /// Logout answers 500
    pub logout_fails: AtomicBool,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
    server_handle: tokio::task::JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let user_id = uuid::Uuid::new_v4().to_string();
        let state = Arc::new(MockState {
            user: std::sync::Mutex::new(json!({
                "id": user_id,
                "email": EMAIL,
                "firstName": "Ada",
                "lastName": "Lovelace",
                "role": "admin",
            })),
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            refresh_returns_empty: AtomicBool::new(false),
            refresh_rejects: AtomicBool::new(false),
            logout_fails: AtomicBool::new(false),
        });

        let auth_routes = Router::new()
            .route("/login", post(login))
            .route("/refresh-token", post(refresh))
            .route("/me", get(me).put(update_me))
            .route("/logout", post(logout))
            .route("/change-password", put(change_password))
            .route("/register", post(register))
            .with_state(state.clone());

        let app = Router::new().nest("/api/auth", auth_routes);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local address");

        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            addr,
            state,
            server_handle,
        }
    }

    pub fn base_url(&self) -> url::Url {
        url::Url::parse(&format!("http://{}/api", self.addr)).expect("Invalid URL")
    }

    pub fn user(&self) -> Value {
        self.state.user.lock().unwrap().clone()
    }

    pub fn user_id(&self) -> String {
        self.user()["id"].as_str().unwrap_or_default().to_string()
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn me_calls(&self) -> usize {
        self.state.me_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.state.logout_calls.load(Ordering::SeqCst)
    }
}

fn envelope(data: Value) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({"status": "Success", "data": data})),
    )
}

fn reject(status: StatusCode, message: &str, type_error: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({"status": "Error", "message": message, "typeError": type_error})),
    )
}

/// Extract and verify the bearer token; `None` if absent, invalid, or
/// expired.
fn verified_bearer(headers: &HeaderMap) -> Option<Claims> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(SECRET), &validation)
        .ok()
        .map(|data| data.claims)
}

async fn login(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    if body["email"] != EMAIL || body["password"] != PASSWORD {
        return reject(
            StatusCode::UNAUTHORIZED,
            "Invalid credentials",
            "INVALID_CREDENTIALS",
        );
    }

    let user = state.user.lock().unwrap().clone();
    let sub = user["id"].as_str().unwrap_or_default().to_string();
    envelope(json!({
        "access_token": mint_token(&sub, 300),
        "refresh_token": mint_token(&sub, 14 * 24 * 3600),
        "user": user,
    }))
}

async fn refresh(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    if state.refresh_rejects.load(Ordering::SeqCst) {
        return reject(StatusCode::UNAUTHORIZED, "Token revoked", "TOKEN_REVOKED");
    }

    let Some(claims) = verified_bearer(&headers) else {
        return reject(
            StatusCode::UNAUTHORIZED,
            "Invalid or expired token",
            "INVALID_TOKEN",
        );
    };

    if state.refresh_returns_empty.load(Ordering::SeqCst) {
        return envelope(json!({}));
    }

    envelope(json!({"access_token": mint_token(&claims.sub, 300)}))
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    state.me_calls.fetch_add(1, Ordering::SeqCst);

    if verified_bearer(&headers).is_none() {
        return reject(
            StatusCode::UNAUTHORIZED,
            "Not authenticated",
            "NOT_AUTHENTICATED",
        );
    }

    let user = state.user.lock().unwrap().clone();
    envelope(user)
}

async fn update_me(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if verified_bearer(&headers).is_none() {
        return reject(
            StatusCode::UNAUTHORIZED,
            "Not authenticated",
            "NOT_AUTHENTICATED",
        );
    }

    let mut user = state.user.lock().unwrap();
    if let (Some(user_map), Some(updates)) = (user.as_object_mut(), body.as_object()) {
        for (key, value) in updates {
            user_map.insert(key.clone(), value.clone());
        }
    }
    envelope(user.clone())
}

async fn logout(State(state): State<Arc<MockState>>) -> (StatusCode, Json<Value>) {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);

    if state.logout_fails.load(Ordering::SeqCst) {
        return reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Logout failed",
            "INTERNAL",
        );
    }
    envelope(Value::Null)
}

async fn change_password(
    State(_state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if verified_bearer(&headers).is_none() {
        return reject(
            StatusCode::UNAUTHORIZED,
            "Not authenticated",
            "NOT_AUTHENTICATED",
        );
    }

    if body["currentPassword"] != PASSWORD {
        return reject(
            StatusCode::BAD_REQUEST,
            "Current password is wrong",
            "WRONG_PASSWORD",
        );
    }
    envelope(Value::Null)
}

async fn register(
    State(_state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(email) = body["email"].as_str() else {
        return reject(StatusCode::BAD_REQUEST, "Email is required", "VALIDATION");
    };
    if email == EMAIL {
        return reject(
            StatusCode::CONFLICT,
            "Email already registered",
            "ALREADY_EXISTS",
        );
    }
    envelope(json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "email": email,
        "role": "user",
    }))
}
