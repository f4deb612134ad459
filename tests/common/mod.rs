// SPDX-License-Identifier: MIT

use std::sync::Arc;
use telecare_portal::config::Config;
use telecare_portal::db::PortalDb;
use telecare_portal::models::{Doctor, Role, UserProfile};
use telecare_portal::routes::create_router;
use telecare_portal::services::identity::{Identity, IdentityClient, SessionTokens};
use telecare_portal::AppState;

/// Create a test app with offline mock clients.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_public_url("http://localhost:3000")
}

#[allow(dead_code)]
pub fn create_test_app_with_public_url(public_url: &str) -> (axum::Router, Arc<AppState>) {
    let config = Config {
        public_url: public_url.to_string(),
        ..Config::default()
    };
    let identity = IdentityClient::new_mock();
    let db = PortalDb::new_mock();

    let state = Arc::new(AppState {
        config,
        identity,
        db,
    });

    (create_router(state.clone()), state)
}

/// Register a signed-in user with a profile row. Returns the access
/// token to send as the session cookie.
#[allow(dead_code)]
pub fn seed_user(state: &AppState, user_id: &str, role: Role) -> String {
    let email = format!("{user_id}@example.com");
    let token = format!("token-{user_id}");

    state.identity.mock_add_session(
        &token,
        Identity {
            user_id: user_id.to_string(),
            email: Some(email.clone()),
        },
    );
    state.db.mock_insert_profile(UserProfile::new(
        user_id.to_string(),
        email,
        format!("Test {user_id}"),
        role,
    ));

    token
}

/// Register a session without a profile row (mid-signup state).
#[allow(dead_code)]
pub fn seed_roleless_session(state: &AppState, user_id: &str) -> String {
    let token = format!("token-{user_id}");
    state.identity.mock_add_session(
        &token,
        Identity {
            user_id: user_id.to_string(),
            email: None,
        },
    );
    token
}

/// Register a professional record for an already seeded doctor user.
#[allow(dead_code)]
pub fn seed_doctor_record(state: &AppState, doctor_id: &str, fee: Option<f64>) {
    state.db.mock_insert_doctor(Doctor {
        id: doctor_id.to_string(),
        medical_license: format!("LIC-{doctor_id}"),
        specialty_id: None,
        years_experience: Some(8),
        consultation_fee: fee,
        bio: Some("General practice".to_string()),
        qualifications: Some(vec!["MBBS".to_string()]),
        is_verified: Some(true),
        is_available: Some(true),
        rating: Some(4.6),
        total_reviews: Some(120),
        created_at: chrono::Utc::now().to_rfc3339(),
    });
}

/// Register an expired-session refresh grant. Returns the refresh
/// token to send as the refresh cookie.
#[allow(dead_code)]
pub fn seed_refresh_grant(state: &AppState, user_id: &str) -> String {
    let refresh_token = format!("refresh-{user_id}");
    let rotated = SessionTokens {
        access_token: format!("rotated-access-{user_id}"),
        refresh_token: format!("rotated-refresh-{user_id}"),
        expires_in: Some(3600),
    };
    state.identity.mock_add_refresh_grant(
        &refresh_token,
        rotated,
        Identity {
            user_id: user_id.to_string(),
            email: None,
        },
    );
    refresh_token
}
