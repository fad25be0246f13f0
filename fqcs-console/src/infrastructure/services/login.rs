//! Authentication service client.
//!
//! The console only needs two calls from the identity service: exchange a
//! username/password for a credential and exchange a refresh token for a
//! new one. Both are attempted once; retry policy belongs to the caller.

use std::time::Duration;

use async_trait::async_trait;
use fqcs_model::Credential;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use url::Url;

use crate::domains::auth::errors::{AuthError, AuthResult, NetworkError};
use crate::domains::auth::types::LoginOutcome;

pub const LOGIN_ROUTE: &str = "api/auth/login";
pub const REFRESH_ROUTE: &str = "api/auth/refresh";

/// Login capability consumed by the token manager.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginClient: Send + Sync {
    /// A rejected login is `Ok(LoginOutcome::Rejected)`; `Err` is reserved
    /// for transport failures.
    async fn login(
        &self,
        api_url: &str,
        username: &str,
        password: &str,
    ) -> AuthResult<LoginOutcome>;

    async fn refresh(
        &self,
        api_url: &str,
        refresh_token: &str,
    ) -> AuthResult<Credential>;
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshTokenRequest<'a> {
    refresh_token: &'a str,
}

/// [`LoginClient`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpLoginClient {
    client: Client,
}

impl HttpLoginClient {
    pub fn new(timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NetworkError::from)?;
        Ok(Self { client })
    }

    fn endpoint(api_url: &str, route: &str) -> AuthResult<Url> {
        let base = if api_url.ends_with('/') {
            Url::parse(api_url)
        } else {
            Url::parse(&format!("{api_url}/"))
        };
        base.and_then(|base| base.join(route)).map_err(|e| {
            AuthError::Network(NetworkError::RequestFailed(format!(
                "invalid api url {api_url:?}: {e}"
            )))
        })
    }
}

#[async_trait]
impl LoginClient for HttpLoginClient {
    async fn login(
        &self,
        api_url: &str,
        username: &str,
        password: &str,
    ) -> AuthResult<LoginOutcome> {
        let url = Self::endpoint(api_url, LOGIN_ROUTE)?;
        debug!("[LoginClient] POST {url} for {username}");

        let response = self
            .client
            .post(url)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(NetworkError::from)?;

        let status = response.status();
        if status.is_success() {
            let credential = response
                .json::<Credential>()
                .await
                .map_err(NetworkError::from)?;
            info!("[LoginClient] Login accepted for {username}");
            return Ok(LoginOutcome::Accepted(credential));
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN => {
                warn!("[LoginClient] Login rejected for {username}: {status}");
                let reason = if body.trim().is_empty() {
                    status.to_string()
                } else {
                    body
                };
                Ok(LoginOutcome::Rejected { reason })
            }
            _ => Err(NetworkError::Status {
                status: status.as_u16(),
                message: body,
            }
            .into()),
        }
    }

    async fn refresh(
        &self,
        api_url: &str,
        refresh_token: &str,
    ) -> AuthResult<Credential> {
        let url = Self::endpoint(api_url, REFRESH_ROUTE)?;
        debug!("[LoginClient] POST {url}");

        let response = self
            .client
            .post(url)
            .json(&RefreshTokenRequest { refresh_token })
            .send()
            .await
            .map_err(NetworkError::from)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NetworkError::Status {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(response
            .json::<Credential>()
            .await
            .map_err(NetworkError::from)?)
    }
}
