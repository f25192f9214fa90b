//! `reqwest`-backed implementation of the backend auth operations.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::{
    ApiEnvelope, ApiError, AuthApi, ChangePassword, LoginParams, ProfileUpdate, RefreshGrant,
    RegisterParams, TokenGrant, UserProfile,
};

/// HTTP client for the auth backend. Cheap to clone; timeout policy is
/// left to the underlying `reqwest` client.
#[derive(Clone)]
pub struct HttpAuthApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpAuthApi {
    /// Create a client against the given API base URL, e.g.
    /// `http://localhost:3001/api`.
    pub fn new(base: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
        }
    }

    /// Same, with a preconfigured `reqwest` client.
    pub fn with_client(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = join(&self.base, path)?;
        Ok(self.client.request(method, url))
    }
}

/// Join a path onto the base URL, tolerating a base with or without a
/// trailing slash.
fn join(base: &Url, path: &str) -> Result<Url, ApiError> {
    let mut joined = base.clone();
    {
        let mut segments = joined
            .path_segments_mut()
            .map_err(|_| ApiError::MissingData("base URL cannot have segments appended"))?;
        segments.pop_if_empty();
        segments.extend(path.trim_start_matches('/').split('/'));
    }
    Ok(joined)
}

/// Unwrap a response into its envelope `data`, mapping non-2xx statuses and
/// error envelopes to `ApiError::Backend`.
async fn parse_data<T: DeserializeOwned>(
    response: Response,
    what: &'static str,
) -> Result<T, ApiError> {
    parse_envelope::<T>(response)
        .await?
        .data
        .ok_or(ApiError::MissingData(what))
}

async fn parse_envelope<T: DeserializeOwned>(
    response: Response,
) -> Result<ApiEnvelope<T>, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<ApiEnvelope<T>>().await?);
    }

    // Error responses reuse the envelope shape; fall back to the status
    // text when the body is not parseable.
    let (message, type_error) = match response.json::<ApiEnvelope<serde_json::Value>>().await {
        Ok(envelope) => (
            envelope
                .message
                .unwrap_or_else(|| default_message(status).to_string()),
            envelope.type_error,
        ),
        Err(_) => (default_message(status).to_string(), None),
    };

    Err(ApiError::Backend {
        status: status.as_u16(),
        message,
        type_error,
    })
}

fn default_message(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown error")
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, params: &LoginParams) -> Result<TokenGrant, ApiError> {
        let response = self
            .request(Method::POST, "auth/login")?
            .json(params)
            .send()
            .await?;
        parse_data(response, "login grant").await
    }

    async fn refresh(&self, refresh_bearer: &str) -> Result<RefreshGrant, ApiError> {
        let response = self
            .request(Method::POST, "auth/refresh-token")?
            .bearer_auth(refresh_bearer)
            .send()
            .await?;

        // A 200 with an empty or missing grant is a legal response here;
        // the interceptor decides what an unusable grant means.
        Ok(parse_envelope::<RefreshGrant>(response)
            .await?
            .data
            .unwrap_or_default())
    }

    async fn me(&self, bearer: &str) -> Result<UserProfile, ApiError> {
        let response = self
            .request(Method::GET, "auth/me")?
            .bearer_auth(bearer)
            .send()
            .await?;
        parse_data(response, "user profile").await
    }

    async fn logout(&self, bearer: Option<&str>) -> Result<(), ApiError> {
        let mut request = self.request(Method::POST, "auth/logout")?;
        if let Some(bearer) = bearer {
            request = request.bearer_auth(bearer);
        }
        parse_envelope::<serde_json::Value>(request.send().await?).await?;
        Ok(())
    }

    async fn update_me(
        &self,
        bearer: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ApiError> {
        let response = self
            .request(Method::PUT, "auth/me")?
            .bearer_auth(bearer)
            .json(update)
            .send()
            .await?;
        parse_data(response, "updated profile").await
    }

    async fn change_password(
        &self,
        bearer: &str,
        change: &ChangePassword,
    ) -> Result<(), ApiError> {
        let response = self
            .request(Method::PUT, "auth/change-password")?
            .bearer_auth(bearer)
            .json(change)
            .send()
            .await?;
        parse_envelope::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn register(&self, params: &RegisterParams) -> Result<UserProfile, ApiError> {
        let response = self
            .request(Method::POST, "auth/register")?
            .json(params)
            .send()
            .await?;
        parse_data(response, "registered user").await
    }
}
