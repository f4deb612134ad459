// SPDX-License-Identifier: MIT

//! Authentication routes: password sign-in/up, auth-code callback,
//! recovery, logout. All session state lives in the cookie pair; the
//! hosted auth service owns the accounts.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::access::portal_home;
use crate::error::{AppError, Result};
use crate::middleware::access::{removal_cookies, session_cookies};
use crate::models::{Role, UserProfile};
use crate::services::identity::ACCESS_COOKIE;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/reset-password", post(reset_password))
        .route("/auth/callback", get(auth_callback))
        .route("/auth/auth-code-error", get(auth_code_error))
        .route("/auth/logout", post(logout))
}

/// Session established; the client should navigate to `redirect_to`.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub redirect_to: &'static str,
}

#[derive(Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email(message = "Please enter a valid email address"))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

/// Password sign-in. Sets the session cookie pair and reports the
/// role's portal home for client-side navigation.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let (tokens, identity) = state.identity.sign_in(&payload.email, &payload.password).await?;

    let role = match state.db.fetch_role(&identity.user_id).await {
        Ok(role) => role,
        Err(e) => {
            tracing::warn!(user_id = %identity.user_id, error = %e, "Role lookup failed at login");
            None
        }
    };

    tracing::info!(user_id = %identity.user_id, role = ?role, "User signed in");

    let [access, refresh] = session_cookies(&tokens, state.config.is_secure());
    Ok((
        jar.add(access).add(refresh),
        Json(SessionResponse {
            redirect_to: portal_home(role),
        }),
    ))
}

#[derive(Deserialize, Validate)]
pub struct SignupPayload {
    #[validate(email(message = "Please enter a valid email address"))]
    email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
    #[validate(length(min = 2, message = "Full name must be at least 2 characters"))]
    full_name: String,
    phone: Option<String>,
    role: Role,
}

/// Create an account plus its profile row, then sign the user in.
async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if payload.role == Role::Admin {
        return Err(AppError::BadRequest(
            "Please select your role: patient or doctor".into(),
        ));
    }

    let (tokens, identity) = state
        .identity
        .sign_up(&payload.email, &payload.password, &payload.full_name)
        .await?;

    let mut profile = UserProfile::new(
        identity.user_id.clone(),
        payload.email.clone(),
        payload.full_name.clone(),
        payload.role,
    );
    profile.phone = payload.phone.clone();

    // A failed profile insert leaves the account role-less; the access
    // flow then treats it as unauthenticated until the row exists.
    if let Err(e) = state.db.create_profile(&profile).await {
        tracing::warn!(user_id = %identity.user_id, error = %e, "Profile creation failed at signup");
    }

    tracing::info!(user_id = %identity.user_id, role = %payload.role, "Account created");

    let [access, refresh] = session_cookies(&tokens, state.config.is_secure());
    Ok((
        StatusCode::CREATED,
        jar.add(access).add(refresh),
        Json(SessionResponse {
            redirect_to: portal_home(Some(payload.role)),
        }),
    ))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
}

/// Auth-code callback (email confirmation / OAuth). Exchanges the code
/// for a session and lands the user on their portal.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    let Some(code) = params.code else {
        return (jar, Redirect::temporary("/auth/auth-code-error")).into_response();
    };

    let (tokens, identity) = match state.identity.exchange_code(&code).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "Auth code exchange failed");
            return (jar, Redirect::temporary("/auth/auth-code-error")).into_response();
        }
    };

    let role = state
        .db
        .fetch_role(&identity.user_id)
        .await
        .unwrap_or_default();

    // No profile row yet (mid-signup): land on the patient dashboard,
    // matching the portal's default.
    let target = match role {
        Some(role) => portal_home(Some(role)),
        None => "/dashboard",
    };

    let [access, refresh] = session_cookies(&tokens, state.config.is_secure());
    (jar.add(access).add(refresh), Redirect::temporary(target)).into_response()
}

#[derive(Serialize)]
struct AuthCodeErrorResponse {
    error: &'static str,
    details: &'static str,
}

/// Landing page for failed code exchanges.
async fn auth_code_error() -> Json<AuthCodeErrorResponse> {
    Json(AuthCodeErrorResponse {
        error: "auth_code_error",
        details: "The sign-in link is invalid or has expired. Please request a new one.",
    })
}

#[derive(Deserialize, Validate)]
pub struct ResetPasswordPayload {
    #[validate(email(message = "Please enter a valid email address"))]
    email: String,
}

#[derive(Serialize)]
struct ResetPasswordResponse {
    message: &'static str,
}

/// Trigger a password-recovery email.
async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<Json<ResetPasswordResponse>> {
    payload.validate()?;
    state.identity.send_recovery(&payload.email).await?;
    Ok(Json(ResetPasswordResponse {
        message: "If the address exists, a recovery email is on its way.",
    }))
}

/// Revoke the session (best effort) and clear the cookie pair.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        if let Err(e) = state.identity.sign_out(cookie.value()).await {
            tracing::warn!(error = %e, "Server-side logout failed, clearing cookies anyway");
        }
    }

    let [access, refresh] = removal_cookies(state.config.is_secure());
    (jar.add(access).add(refresh), StatusCode::NO_CONTENT)
}
