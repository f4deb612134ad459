// SPDX-License-Identifier: MIT

//! Doctor portal tests: appointment management, ownership checks,
//! prescriptions, schedule.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use telecare_portal::models::{AppointmentStatus, NewAppointment, Role};
use tower::ServiceExt;

mod common;

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn request(
    app: Router,
    method: Method,
    path: &str,
    cookie: &str,
    body: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::COOKIE, cookie);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Seed an appointment directly through the mock store.
async fn seed_appointment(
    state: &telecare_portal::AppState,
    patient_id: &str,
    doctor_id: &str,
    date: &str,
) -> String {
    state
        .db
        .create_appointment(&NewAppointment {
            patient_id: patient_id.to_string(),
            doctor_id: doctor_id.to_string(),
            appointment_date: date.to_string(),
            appointment_time: "09:00".to_string(),
            duration_minutes: 30,
            reason: "Follow-up on blood test results".to_string(),
            status: AppointmentStatus::Pending,
            consultation_fee: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_overview_counts() {
    let (app, state) = common::create_test_app();
    let doctor = common::seed_user(&state, "doc-1", Role::Doctor);
    common::seed_user(&state, "pat-1", Role::Patient);
    let today = chrono::Utc::now().date_naive().to_string();
    seed_appointment(&state, "pat-1", "doc-1", &today).await;
    seed_appointment(&state, "pat-1", "doc-1", "2026-12-01").await;

    let response = request(
        app,
        Method::GET,
        "/doctor",
        &format!("telecare_token={doctor}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let overview = body_json(response).await;
    assert_eq!(overview["today_count"], 1);
    assert_eq!(overview["pending_count"], 2);
    assert_eq!(overview["total_count"], 2);
}

#[tokio::test]
async fn test_confirm_own_appointment() {
    let (app, state) = common::create_test_app();
    let doctor = common::seed_user(&state, "doc-1", Role::Doctor);
    common::seed_user(&state, "pat-1", Role::Patient);
    let id = seed_appointment(&state, "pat-1", "doc-1", "2026-10-01").await;

    let response = request(
        app,
        Method::PUT,
        &format!("/doctor/appointments/{id}"),
        &format!("telecare_token={doctor}"),
        Some(r#"{"status":"confirmed"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "confirmed");
}

#[tokio::test]
async fn test_cannot_update_another_doctors_appointment() {
    let (app, state) = common::create_test_app();
    common::seed_user(&state, "doc-1", Role::Doctor);
    let other = common::seed_user(&state, "doc-2", Role::Doctor);
    common::seed_user(&state, "pat-1", Role::Patient);
    let id = seed_appointment(&state, "pat-1", "doc-1", "2026-10-01").await;

    let response = request(
        app,
        Method::PUT,
        &format!("/doctor/appointments/{id}"),
        &format!("telecare_token={other}"),
        Some(r#"{"status":"cancelled"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_filter() {
    let (app, state) = common::create_test_app();
    let doctor = common::seed_user(&state, "doc-1", Role::Doctor);
    common::seed_user(&state, "pat-1", Role::Patient);
    let id = seed_appointment(&state, "pat-1", "doc-1", "2026-10-01").await;
    seed_appointment(&state, "pat-1", "doc-1", "2026-10-02").await;
    state
        .db
        .update_appointment_status(&id, AppointmentStatus::Confirmed)
        .await
        .unwrap();

    let cookie = format!("telecare_token={doctor}");
    let response = request(
        app.clone(),
        Method::GET,
        "/doctor/appointments?status=pending",
        &cookie,
        None,
    )
    .await;
    let pending = body_json(response).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let response = request(
        app,
        Method::GET,
        "/doctor/appointments?status=confirmed",
        &cookie,
        None,
    )
    .await;
    let confirmed = body_json(response).await;
    assert_eq!(confirmed.as_array().unwrap().len(), 1);
    assert_eq!(confirmed[0]["id"], id);
}

#[tokio::test]
async fn test_prescription_for_own_appointment() {
    let (app, state) = common::create_test_app();
    let doctor = common::seed_user(&state, "doc-1", Role::Doctor);
    let patient = common::seed_user(&state, "pat-1", Role::Patient);
    let id = seed_appointment(&state, "pat-1", "doc-1", "2026-10-01").await;

    let response = request(
        app.clone(),
        Method::POST,
        &format!("/doctor/appointments/{id}/prescription"),
        &format!("telecare_token={doctor}"),
        Some(
            r#"{
                "medications": [
                    {"name": "Sumatriptan", "dosage": "50mg", "frequency": "as needed", "duration": "30 days"}
                ],
                "instructions": "Take at migraine onset"
            }"#,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let prescription = body_json(response).await;
    assert_eq!(prescription["status"], "active");
    assert_eq!(prescription["patient_id"], "pat-1");

    // The patient sees it under /records.
    let response = request(
        app,
        Method::GET,
        "/records",
        &format!("telecare_token={patient}"),
        None,
    )
    .await;
    let records = body_json(response).await;
    assert_eq!(records["prescriptions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_prescription_requires_medications() {
    let (app, state) = common::create_test_app();
    let doctor = common::seed_user(&state, "doc-1", Role::Doctor);
    common::seed_user(&state, "pat-1", Role::Patient);
    let id = seed_appointment(&state, "pat-1", "doc-1", "2026-10-01").await;

    let response = request(
        app,
        Method::POST,
        &format!("/doctor/appointments/{id}/prescription"),
        &format!("telecare_token={doctor}"),
        Some(r#"{"medications": []}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_schedule_replace_roundtrip() {
    let (app, state) = common::create_test_app();
    let doctor = common::seed_user(&state, "doc-1", Role::Doctor);
    let cookie = format!("telecare_token={doctor}");

    let response = request(
        app.clone(),
        Method::PUT,
        "/doctor/schedule",
        &cookie,
        Some(
            r#"{"slots": [
                {"day_of_week": 1, "start_time": "09:00", "end_time": "12:00"},
                {"day_of_week": 3, "start_time": "14:00", "end_time": "17:00"}
            ]}"#,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = request(app, Method::GET, "/doctor/schedule", &cookie, None).await;
    let slots = body_json(response).await;
    assert_eq!(slots.as_array().unwrap().len(), 2);
    assert_eq!(slots[0]["day_of_week"], 1);
    assert_eq!(slots[1]["day_of_week"], 3);
}

#[tokio::test]
async fn test_schedule_rejects_duplicate_slots() {
    let (app, state) = common::create_test_app();
    let doctor = common::seed_user(&state, "doc-1", Role::Doctor);

    // Same day and start time twice: the row ids would collide.
    let response = request(
        app,
        Method::PUT,
        "/doctor/schedule",
        &format!("telecare_token={doctor}"),
        Some(
            r#"{"slots": [
                {"day_of_week": 1, "start_time": "09:00", "end_time": "12:00"},
                {"day_of_week": 1, "start_time": "09:00", "end_time": "17:00"}
            ]}"#,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_failed");
}

#[tokio::test]
async fn test_schedule_rejects_invalid_day() {
    let (app, state) = common::create_test_app();
    let doctor = common::seed_user(&state, "doc-1", Role::Doctor);

    let response = request(
        app,
        Method::PUT,
        "/doctor/schedule",
        &format!("telecare_token={doctor}"),
        Some(r#"{"slots": [{"day_of_week": 9, "start_time": "09:00", "end_time": "12:00"}]}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patient_roster_is_distinct_and_sorted() {
    let (app, state) = common::create_test_app();
    let doctor = common::seed_user(&state, "doc-1", Role::Doctor);
    common::seed_user(&state, "pat-b", Role::Patient);
    common::seed_user(&state, "pat-a", Role::Patient);
    seed_appointment(&state, "pat-b", "doc-1", "2026-10-01").await;
    seed_appointment(&state, "pat-b", "doc-1", "2026-10-08").await;
    seed_appointment(&state, "pat-a", "doc-1", "2026-10-02").await;

    let response = request(
        app,
        Method::GET,
        "/doctor/patients",
        &format!("telecare_token={doctor}"),
        None,
    )
    .await;
    let patients = body_json(response).await;
    let patients = patients.as_array().unwrap();
    assert_eq!(patients.len(), 2);
    assert_eq!(patients[0]["full_name"], "Test pat-a");
    assert_eq!(patients[1]["full_name"], "Test pat-b");
}

#[tokio::test]
async fn test_doctor_settings_update() {
    let (app, state) = common::create_test_app();
    let doctor = common::seed_user(&state, "doc-1", Role::Doctor);
    common::seed_doctor_record(&state, "doc-1", Some(2000.0));
    let cookie = format!("telecare_token={doctor}");

    let response = request(
        app.clone(),
        Method::PUT,
        "/doctor/settings",
        &cookie,
        Some(
            r#"{"medical_license": "SLMC-12345", "years_experience": 12, "consultation_fee": 3000.0, "bio": "Neurology"}"#,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = request(app, Method::GET, "/doctor/settings", &cookie, None).await;
    let settings = body_json(response).await;
    assert_eq!(settings["medical_license"], "SLMC-12345");
    assert_eq!(settings["years_experience"], 12);
    assert_eq!(settings["consultation_fee"], 3000.0);
    assert_eq!(settings["bio"], "Neurology");
}
