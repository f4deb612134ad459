// SPDX-License-Identifier: MIT

//! Auth service client and session resolution.
//!
//! Access tokens are HS256 JWTs minted by the hosted auth service and
//! validated locally; everything else (password grant, signup, refresh,
//! code exchange, logout, recovery) goes over the wire. Session
//! resolution never fails a request: any credential or service problem
//! degrades to "unauthenticated".

use crate::config::Config;
use crate::error::AppError;
use axum_extra::extract::cookie::CookieJar;
use dashmap::DashMap;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie holding the access token (JWT).
pub const ACCESS_COOKIE: &str = "telecare_token";
/// Session cookie holding the refresh token.
pub const REFRESH_COOKIE: &str = "telecare_refresh";

/// Access token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (auth-service identity id)
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

/// Authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

/// Token pair issued by the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Outcome of session resolution for one request.
///
/// `refreshed` carries a rotated token pair when an expired access token
/// was transparently refreshed; the caller must attach it as cookies on
/// whatever response the request produces.
#[derive(Debug, Default)]
pub struct ResolvedSession {
    pub identity: Option<Identity>,
    pub refreshed: Option<SessionTokens>,
}

impl ResolvedSession {
    fn anonymous() -> Self {
        Self::default()
    }
}

/// Auth service client.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Inner,
}

#[derive(Clone)]
enum Inner {
    Http {
        http: reqwest::Client,
        base_url: String,
        anon_key: String,
        jwt_secret: Vec<u8>,
    },
    Mock(Arc<MockState>),
}

/// In-memory auth state for offline tests.
#[derive(Default)]
struct MockState {
    /// access token -> identity
    sessions: DashMap<String, Identity>,
    /// refresh token -> rotated pair
    refresh_grants: DashMap<String, SessionTokens>,
    /// email -> (password, token pair)
    credentials: DashMap<String, (String, SessionTokens)>,
    /// auth code -> token pair
    codes: DashMap<String, SessionTokens>,
}

impl IdentityClient {
    /// Create a client against the hosted auth service.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.lookup_timeout)
            .build()
            .map_err(|e| AppError::AuthService(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            inner: Inner::Http {
                http,
                base_url: format!("{}/auth/v1", config.backend_url),
                anon_key: config.anon_key.clone(),
                jwt_secret: config.jwt_secret.clone(),
            },
        })
    }

    /// Create an offline mock client for testing.
    pub fn new_mock() -> Self {
        Self {
            inner: Inner::Mock(Arc::new(MockState::default())),
        }
    }

    // ─── Session Resolution ──────────────────────────────────────

    /// Resolve the request's session cookies to an identity, refreshing
    /// an expired access token when possible. Infallible: every failure
    /// mode resolves to an anonymous session.
    pub async fn resolve_session(&self, jar: &CookieJar) -> ResolvedSession {
        let access = jar.get(ACCESS_COOKIE).map(|c| c.value().to_string());
        let refresh = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

        match &self.inner {
            Inner::Http { jwt_secret, .. } => {
                let Some(token) = access else {
                    return self.try_refresh(refresh).await;
                };

                match decode_access_token(&token, jwt_secret) {
                    Ok(identity) => ResolvedSession {
                        identity: Some(identity),
                        refreshed: None,
                    },
                    Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                        self.try_refresh(refresh).await
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Rejecting invalid access token");
                        ResolvedSession::anonymous()
                    }
                }
            }
            Inner::Mock(state) => {
                if let Some(identity) = access.and_then(|t| state.sessions.get(&t).map(|i| i.clone())) {
                    return ResolvedSession {
                        identity: Some(identity),
                        refreshed: None,
                    };
                }
                self.try_refresh(refresh).await
            }
        }
    }

    /// Attempt a refresh-token grant; anonymous on any failure.
    async fn try_refresh(&self, refresh: Option<String>) -> ResolvedSession {
        let Some(refresh_token) = refresh else {
            return ResolvedSession::anonymous();
        };

        let tokens = match self.refresh_session(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh failed");
                return ResolvedSession::anonymous();
            }
        };

        match self.identity_of(&tokens.access_token) {
            Some(identity) => {
                tracing::debug!(user_id = %identity.user_id, "Session refreshed");
                ResolvedSession {
                    identity: Some(identity),
                    refreshed: Some(tokens),
                }
            }
            None => {
                tracing::warn!("Refreshed access token failed validation");
                ResolvedSession::anonymous()
            }
        }
    }

    /// Identity behind an access token, if it validates.
    pub fn identity_of(&self, access_token: &str) -> Option<Identity> {
        match &self.inner {
            Inner::Http { jwt_secret, .. } => decode_access_token(access_token, jwt_secret).ok(),
            Inner::Mock(state) => state.sessions.get(access_token).map(|i| i.clone()),
        }
    }

    // ─── Auth Operations ─────────────────────────────────────────

    /// Password sign-in. Returns the token pair and the identity it
    /// belongs to.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(SessionTokens, Identity), AppError> {
        match &self.inner {
            Inner::Http { .. } => {
                let body = serde_json::json!({ "email": email, "password": password });
                let tokens: SessionTokens = self
                    .post_auth("token?grant_type=password", &body, true)
                    .await?;
                let identity = self
                    .identity_of(&tokens.access_token)
                    .ok_or_else(|| AppError::AuthService("Unverifiable access token".into()))?;
                Ok((tokens, identity))
            }
            Inner::Mock(state) => {
                let entry = state
                    .credentials
                    .get(email)
                    .ok_or(AppError::InvalidCredentials)?;
                let (stored_password, tokens) = entry.value();
                if stored_password != password {
                    return Err(AppError::InvalidCredentials);
                }
                let tokens = tokens.clone();
                drop(entry);
                let identity = self
                    .identity_of(&tokens.access_token)
                    .ok_or(AppError::InvalidCredentials)?;
                Ok((tokens, identity))
            }
        }
    }

    /// Create an auth-service account. Returns the new session when the
    /// service signs the user in immediately.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(SessionTokens, Identity), AppError> {
        match &self.inner {
            Inner::Http { .. } => {
                let body = serde_json::json!({
                    "email": email,
                    "password": password,
                    "data": { "full_name": full_name },
                });
                let tokens: SessionTokens = self.post_auth("signup", &body, false).await?;
                let identity = self
                    .identity_of(&tokens.access_token)
                    .ok_or_else(|| AppError::AuthService("Unverifiable access token".into()))?;
                Ok((tokens, identity))
            }
            Inner::Mock(state) => {
                if state.credentials.contains_key(email) {
                    return Err(AppError::BadRequest("Account already exists".into()));
                }
                let user_id = format!("mock-{}", state.credentials.len() + 1);
                let identity = Identity {
                    user_id: user_id.clone(),
                    email: Some(email.to_string()),
                };
                let tokens = SessionTokens {
                    access_token: format!("mock-access-{user_id}"),
                    refresh_token: format!("mock-refresh-{user_id}"),
                    expires_in: Some(3600),
                };
                state.sessions.insert(tokens.access_token.clone(), identity.clone());
                state
                    .credentials
                    .insert(email.to_string(), (password.to_string(), tokens.clone()));
                Ok((tokens, identity))
            }
        }
    }

    /// Exchange an auth code (email link / OAuth) for a session.
    pub async fn exchange_code(&self, code: &str) -> Result<(SessionTokens, Identity), AppError> {
        match &self.inner {
            Inner::Http { .. } => {
                let body = serde_json::json!({ "auth_code": code });
                let tokens: SessionTokens =
                    self.post_auth("token?grant_type=pkce", &body, true).await?;
                let identity = self
                    .identity_of(&tokens.access_token)
                    .ok_or_else(|| AppError::AuthService("Unverifiable access token".into()))?;
                Ok((tokens, identity))
            }
            Inner::Mock(state) => {
                let tokens = state
                    .codes
                    .get(code)
                    .map(|t| t.clone())
                    .ok_or(AppError::InvalidCredentials)?;
                let identity = self
                    .identity_of(&tokens.access_token)
                    .ok_or(AppError::InvalidCredentials)?;
                Ok((tokens, identity))
            }
        }
    }

    /// Refresh-token grant.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<SessionTokens, AppError> {
        match &self.inner {
            Inner::Http { .. } => {
                let body = serde_json::json!({ "refresh_token": refresh_token });
                self.post_auth("token?grant_type=refresh_token", &body, true)
                    .await
            }
            Inner::Mock(state) => state
                .refresh_grants
                .get(refresh_token)
                .map(|t| t.clone())
                .ok_or(AppError::InvalidCredentials),
        }
    }

    /// Revoke a session server-side. Best effort; callers clear cookies
    /// regardless.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        match &self.inner {
            Inner::Http {
                http,
                base_url,
                anon_key,
                ..
            } => {
                let response = http
                    .post(format!("{base_url}/logout"))
                    .header("apikey", anon_key)
                    .bearer_auth(access_token)
                    .send()
                    .await
                    .map_err(|e| AppError::AuthService(e.to_string()))?;
                if !response.status().is_success() && response.status().as_u16() != 401 {
                    return Err(AppError::AuthService(format!(
                        "Logout failed: {}",
                        response.status()
                    )));
                }
                Ok(())
            }
            Inner::Mock(state) => {
                state.sessions.remove(access_token);
                Ok(())
            }
        }
    }

    /// Trigger a password-recovery email.
    pub async fn send_recovery(&self, email: &str) -> Result<(), AppError> {
        match &self.inner {
            Inner::Http { .. } => {
                let body = serde_json::json!({ "email": email });
                let _: serde_json::Value = self.post_auth("recover", &body, false).await?;
                Ok(())
            }
            Inner::Mock(_) => Ok(()),
        }
    }

    /// POST to the auth service and decode the JSON response.
    /// `credential_errors` maps 400/401 to invalid-credentials.
    async fn post_auth<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
        credential_errors: bool,
    ) -> Result<T, AppError> {
        let Inner::Http {
            http,
            base_url,
            anon_key,
            ..
        } = &self.inner
        else {
            return Err(AppError::AuthService("No HTTP endpoint on mock client".into()));
        };

        let response = http
            .post(format!("{base_url}/{endpoint}"))
            .header("apikey", anon_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::AuthService(e.to_string()))?;

        let status = response.status();
        if credential_errors && (status.as_u16() == 400 || status.as_u16() == 401) {
            return Err(AppError::InvalidCredentials);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::AuthService(format!("{status}: {detail}")));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::AuthService(format!("Malformed auth response: {e}")))
    }

    // ─── Mock Helpers (tests) ────────────────────────────────────

    /// Register a live access token for the mock client.
    pub fn mock_add_session(&self, access_token: &str, identity: Identity) {
        if let Inner::Mock(state) = &self.inner {
            state.sessions.insert(access_token.to_string(), identity);
        }
    }

    /// Register a refresh grant: `refresh_token` rotates into `tokens`,
    /// whose access token resolves to `identity`.
    pub fn mock_add_refresh_grant(
        &self,
        refresh_token: &str,
        tokens: SessionTokens,
        identity: Identity,
    ) {
        if let Inner::Mock(state) = &self.inner {
            state.sessions.insert(tokens.access_token.clone(), identity);
            state
                .refresh_grants
                .insert(refresh_token.to_string(), tokens);
        }
    }

    /// Register password credentials for the mock client.
    pub fn mock_add_credentials(
        &self,
        email: &str,
        password: &str,
        tokens: SessionTokens,
        identity: Identity,
    ) {
        if let Inner::Mock(state) = &self.inner {
            state.sessions.insert(tokens.access_token.clone(), identity);
            state
                .credentials
                .insert(email.to_string(), (password.to_string(), tokens));
        }
    }

    /// Register an auth code for the mock client.
    pub fn mock_add_code(&self, code: &str, tokens: SessionTokens, identity: Identity) {
        if let Inner::Mock(state) = &self.inner {
            state.sessions.insert(tokens.access_token.clone(), identity);
            state.codes.insert(code.to_string(), tokens);
        }
    }
}

/// Validate an access token and extract its identity.
fn decode_access_token(token: &str, secret: &[u8]) -> Result<Identity, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    // The hosted service sets aud to "authenticated"; we only care about
    // signature and expiry here.
    validation.validate_aud = false;

    let data = decode::<Claims>(token, &key, &validation)?;
    Ok(Identity {
        user_id: data.claims.sub,
        email: data.claims.email,
    })
}
