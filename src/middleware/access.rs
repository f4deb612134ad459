// SPDX-License-Identifier: MIT

//! Access-control middleware.
//!
//! Every portal request flows through here: session resolution (with
//! transparent refresh), role lookup, route classification, and the
//! allow/redirect decision. Lookups degrade rather than fail; the worst
//! outcome for a request is a redirect to `/login`, never a 5xx from
//! this layer.

use crate::access::{classify, decide, is_static_asset, AccessDecision, AuthContext};
use crate::models::Role;
use crate::services::identity::{SessionTokens, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

/// Authenticated user extracted from the session, attached to requests
/// that pass the access decision.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Role-based access control over every inbound request.
pub async fn enforce_access(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    // Static assets never enter the flow.
    if is_static_asset(&path) {
        return next.run(request).await;
    }

    // Refresh-before-decide: an expired-but-refreshable session must be
    // treated as authenticated, and the rotated cookies ride along on
    // whatever response this request produces.
    let session = state.identity.resolve_session(&jar).await;

    let auth = match &session.identity {
        Some(identity) => {
            let role = match state.db.fetch_role(&identity.user_id).await {
                Ok(role) => role,
                Err(e) => {
                    tracing::warn!(
                        user_id = %identity.user_id,
                        error = %e,
                        "Role lookup failed, treating as no role"
                    );
                    None
                }
            };
            AuthContext::Authenticated { role }
        }
        None => AuthContext::Anonymous,
    };

    let decision = decide(auth, classify(&path), &path);

    let mut response = match decision {
        AccessDecision::Proceed => {
            if let Some(identity) = session.identity {
                let role = match auth {
                    AuthContext::Authenticated { role } => role,
                    AuthContext::Anonymous => None,
                };
                request.extensions_mut().insert(CurrentUser {
                    user_id: identity.user_id,
                    email: identity.email,
                    role,
                });
            }
            next.run(request).await
        }
        AccessDecision::Redirect(target) => {
            tracing::debug!(path = %path, target = %target, "Access redirect");
            Redirect::temporary(target).into_response()
        }
    };

    if let Some(tokens) = session.refreshed {
        append_cookies(
            &mut response,
            &session_cookies(&tokens, state.config.is_secure()),
        );
    }

    response
}

/// Build the session cookie pair for a token pair.
pub fn session_cookies(tokens: &SessionTokens, secure: bool) -> [Cookie<'static>; 2] {
    let access_age = time::Duration::seconds(tokens.expires_in.unwrap_or(3600) as i64);

    let access = Cookie::build((ACCESS_COOKIE, tokens.access_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(access_age)
        .build();

    let refresh = Cookie::build((REFRESH_COOKIE, tokens.refresh_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(30))
        .build();

    [access, refresh]
}

/// Removal cookies matching the creation attributes.
pub fn removal_cookies(secure: bool) -> [Cookie<'static>; 2] {
    let remove = |name: &'static str| {
        Cookie::build((name, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .max_age(time::Duration::ZERO)
            .build()
    };
    [remove(ACCESS_COOKIE), remove(REFRESH_COOKIE)]
}

/// Append Set-Cookie headers to a response.
pub fn append_cookies(response: &mut Response, cookies: &[Cookie<'static>]) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => {
                tracing::warn!(cookie = %cookie.name(), error = %e, "Dropping unencodable cookie");
            }
        }
    }
}
