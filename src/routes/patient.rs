// SPDX-License-Identifier: MIT

//! Patient portal routes: dashboard, doctor directory, booking,
//! appointments, records, settings. Role gating happens in the access
//! middleware; handlers only see requests that were allowed through.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::access::CurrentUser;
use crate::models::{
    Appointment, AppointmentStatus, DoctorAvailability, DoctorListing, MedicalRecord,
    NewAppointment, Prescription, ProfileChanges, UserProfile,
};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/doctors", get(list_doctors))
        .route("/doctors/{id}", get(doctor_detail))
        .route("/book/{doctor_id}", post(book_appointment))
        .route("/appointments", get(my_appointments))
        .route("/records", get(my_records))
        .route("/settings", get(get_settings).put(update_settings))
}

const DEFAULT_APPOINTMENT_MINUTES: u32 = 30;

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardResponse {
    pub full_name: String,
    pub upcoming: Vec<Appointment>,
}

/// Patient landing: profile summary plus upcoming appointments.
async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<DashboardResponse>> {
    let profile = state
        .db
        .fetch_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;

    let today = chrono::Utc::now().date_naive().to_string();
    let upcoming: Vec<Appointment> = state
        .db
        .list_appointments_for_patient(&user.user_id)
        .await?
        .into_iter()
        .filter(|a| a.status != AppointmentStatus::Cancelled && a.appointment_date >= today)
        .take(5)
        .collect();

    Ok(Json(DashboardResponse {
        full_name: profile.full_name,
        upcoming,
    }))
}

// ─── Doctor Directory ────────────────────────────────────────

#[derive(Deserialize)]
pub struct DoctorsQuery {
    #[serde(default)]
    specialty: Option<String>,
}

/// Browse the verified-doctor directory.
async fn list_doctors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DoctorsQuery>,
) -> Result<Json<Vec<DoctorListing>>> {
    let doctors = state.db.list_doctors(query.specialty.as_deref()).await?;
    Ok(Json(doctors))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DoctorDetailResponse {
    pub id: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub qualifications: Option<Vec<String>>,
    pub years_experience: Option<u32>,
    pub consultation_fee: Option<f64>,
    pub rating: Option<f64>,
    pub total_reviews: Option<u32>,
    pub is_available: bool,
    pub availability: Vec<DoctorAvailability>,
}

/// Doctor profile with weekly availability.
async fn doctor_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DoctorDetailResponse>> {
    let doctor = state
        .db
        .get_doctor(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Doctor {id} not found")))?;
    let profile = state.db.fetch_profile(&id).await?;
    let availability = state.db.list_availability(&id).await?;

    Ok(Json(DoctorDetailResponse {
        id: doctor.id,
        full_name: profile.as_ref().map(|p| p.full_name.clone()).unwrap_or_default(),
        avatar_url: profile.and_then(|p| p.avatar_url),
        bio: doctor.bio,
        qualifications: doctor.qualifications,
        years_experience: doctor.years_experience,
        consultation_fee: doctor.consultation_fee,
        rating: doctor.rating,
        total_reviews: doctor.total_reviews,
        is_available: doctor.is_available.unwrap_or(false),
        availability,
    }))
}

// ─── Booking ─────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct BookingPayload {
    #[validate(length(min = 1, message = "Appointment date is required"))]
    appointment_date: String,
    #[validate(length(min = 1, message = "Appointment time is required"))]
    appointment_time: String,
    #[validate(length(
        min = 10,
        message = "Please provide more details about your reason for consultation"
    ))]
    reason: String,
}

/// Book an appointment with a doctor. A plain insert: the portal does
/// not arbitrate double-booked slots.
async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(doctor_id): Path<String>,
    Json(payload): Json<BookingPayload>,
) -> Result<(StatusCode, Json<Appointment>)> {
    payload.validate()?;

    let doctor = state
        .db
        .get_doctor(&doctor_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Doctor {doctor_id} not found")))?;

    let appointment = state
        .db
        .create_appointment(&NewAppointment {
            patient_id: user.user_id.clone(),
            doctor_id: doctor.id,
            appointment_date: payload.appointment_date,
            appointment_time: payload.appointment_time,
            duration_minutes: DEFAULT_APPOINTMENT_MINUTES,
            reason: payload.reason,
            status: AppointmentStatus::Pending,
            consultation_fee: doctor.consultation_fee,
        })
        .await?;

    tracing::info!(
        patient_id = %user.user_id,
        doctor_id = %appointment.doctor_id,
        appointment_id = %appointment.id,
        "Appointment booked"
    );

    Ok((StatusCode::CREATED, Json(appointment)))
}

/// The patient's appointments, newest first.
async fn my_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Appointment>>> {
    let appointments = state.db.list_appointments_for_patient(&user.user_id).await?;
    Ok(Json(appointments))
}

// ─── Records ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct RecordsResponse {
    pub records: Vec<MedicalRecord>,
    pub prescriptions: Vec<Prescription>,
}

/// Medical records plus prescriptions for the patient.
async fn my_records(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<RecordsResponse>> {
    let records = state.db.list_records(&user.user_id).await?;
    let prescriptions = state
        .db
        .list_prescriptions_for_patient(&user.user_id)
        .await?;
    Ok(Json(RecordsResponse {
        records,
        prescriptions,
    }))
}

// ─── Settings ────────────────────────────────────────────────

async fn get_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .db
        .fetch_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
    Ok(Json(profile))
}

#[derive(Deserialize, Validate)]
pub struct SettingsPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    full_name: String,
    phone: Option<String>,
    date_of_birth: Option<String>,
    gender: Option<String>,
    /// en / si / ta
    language: Option<String>,
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<SettingsPayload>,
) -> Result<Json<UserProfile>> {
    payload.validate()?;

    if let Some(language) = &payload.language {
        if !["en", "si", "ta"].contains(&language.as_str()) {
            return Err(AppError::Validation("Unsupported language".into()));
        }
    }

    let changes = ProfileChanges {
        full_name: Some(payload.full_name),
        phone: payload.phone,
        date_of_birth: payload.date_of_birth,
        gender: payload.gender,
        language: payload.language,
        updated_at: chrono::Utc::now().to_rfc3339(),
    };

    let profile = state
        .db
        .update_profile(&user.user_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
    Ok(Json(profile))
}
