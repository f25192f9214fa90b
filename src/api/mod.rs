//! Backend auth operations, consumed as black-box HTTP calls.
//!
//! The trait keeps the transport swappable: production uses the
//! `reqwest`-backed [`HttpAuthApi`], tests drive the session against an
//! in-process fake or a local mock server.

mod http;

pub use http::HttpAuthApi;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// User profile as returned by the backend. Opaque to the session core,
/// which only ever tests it for presence; unknown fields pass through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Login credentials.
#[derive(Debug, Clone, Serialize)]
pub struct LoginParams {
    pub email: String,
    pub password: String,
}

/// Registration payload.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterParams {
    pub email: String,
    pub password: String,
}

/// Profile fields updatable through `PUT /auth/me`. `None` fields are
/// omitted from the request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Password change payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

/// Tokens and profile issued by a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

/// Result of a refresh call. The backend may answer 200 without a usable
/// token; callers must treat that as a failed refresh.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshGrant {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "typeError", default)]
    pub type_error: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

/// Errors from backend calls. Backend rejections carry the envelope's
/// message so callers can present them unchanged.
#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a backend response
    Transport(reqwest::Error),
    /// The backend rejected the request
    Backend {
        status: u16,
        message: String,
        type_error: Option<String>,
    },
    /// A 2xx response without the expected `data` payload
    MissingData(&'static str),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(e) => write!(f, "Request failed: {}", e),
            ApiError::Backend {
                status, message, ..
            } => write!(f, "Backend rejected request ({}): {}", status, message),
            ApiError::MissingData(what) => {
                write!(f, "Backend response missing expected data: {}", what)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e)
    }
}

/// The backend operations the session core consumes.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, params: &LoginParams) -> Result<TokenGrant, ApiError>;

    /// `POST /auth/refresh-token`, authenticated with the refresh token.
    async fn refresh(&self, refresh_bearer: &str) -> Result<RefreshGrant, ApiError>;

    /// `GET /auth/me`
    async fn me(&self, bearer: &str) -> Result<UserProfile, ApiError>;

    /// `POST /auth/logout`. The bearer is attached when one is still
    /// available; the call is best-effort.
    async fn logout(&self, bearer: Option<&str>) -> Result<(), ApiError>;

    /// `PUT /auth/me`
    async fn update_me(
        &self,
        bearer: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ApiError>;

    /// `PUT /auth/change-password`
    async fn change_password(
        &self,
        bearer: &str,
        change: &ChangePassword,
    ) -> Result<(), ApiError>;

    /// `POST /auth/register`
    async fn register(&self, params: &RegisterParams) -> Result<UserProfile, ApiError>;
}
