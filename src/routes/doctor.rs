// SPDX-License-Identifier: MIT

//! Doctor portal routes: appointment management, patient roster,
//! schedule, prescriptions, professional profile.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::access::CurrentUser;
use crate::models::{
    Appointment, AppointmentStatus, Doctor, DoctorAvailability, DoctorChanges, NewPrescription,
    Prescription, PrescriptionStatus,
};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/doctor", get(overview))
        .route("/doctor/appointments", get(list_appointments))
        .route("/doctor/appointments/{id}", put(update_appointment))
        .route(
            "/doctor/appointments/{id}/prescription",
            post(create_prescription),
        )
        .route("/doctor/patients", get(list_patients))
        .route("/doctor/schedule", get(get_schedule).put(update_schedule))
        .route("/doctor/settings", get(get_settings).put(update_settings))
}

// ─── Overview ────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OverviewResponse {
    pub today_count: usize,
    pub pending_count: usize,
    pub total_count: usize,
    pub recent: Vec<Appointment>,
}

/// Doctor landing: appointment counts and the most recent bookings.
async fn overview(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<OverviewResponse>> {
    let appointments = state
        .db
        .list_appointments_for_doctor(&user.user_id, None)
        .await?;

    let today = chrono::Utc::now().date_naive().to_string();
    let today_count = appointments
        .iter()
        .filter(|a| a.appointment_date == today && a.status != AppointmentStatus::Cancelled)
        .count();
    let pending_count = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Pending)
        .count();
    let total_count = appointments.len();
    let recent = appointments.into_iter().take(5).collect();

    Ok(Json(OverviewResponse {
        today_count,
        pending_count,
        total_count,
        recent,
    }))
}

// ─── Appointments ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AppointmentsQuery {
    #[serde(default)]
    status: Option<AppointmentStatus>,
}

#[derive(Serialize)]
pub struct AppointmentWithPatient {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: String,
}

/// The doctor's appointments with patient display names, optionally
/// filtered by status.
async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<AppointmentWithPatient>>> {
    let appointments = state
        .db
        .list_appointments_for_doctor(&user.user_id, query.status)
        .await?;

    let mut result = Vec::with_capacity(appointments.len());
    for appointment in appointments {
        let patient_name = state
            .db
            .fetch_profile(&appointment.patient_id)
            .await?
            .map(|p| p.full_name)
            .unwrap_or_default();
        result.push(AppointmentWithPatient {
            appointment,
            patient_name,
        });
    }
    Ok(Json(result))
}

#[derive(Deserialize)]
pub struct UpdateAppointmentPayload {
    status: AppointmentStatus,
}

/// Confirm, complete, or cancel an appointment. Only the owning doctor
/// may update it; anything else 404s without leaking existence.
async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAppointmentPayload>,
) -> Result<Json<Appointment>> {
    let appointment = state
        .db
        .get_appointment(&id)
        .await?
        .filter(|a| a.doctor_id == user.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Appointment {id} not found")))?;

    let updated = state
        .db
        .update_appointment_status(&appointment.id, payload.status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Appointment {id} not found")))?;

    tracing::info!(
        doctor_id = %user.user_id,
        appointment_id = %updated.id,
        status = ?updated.status,
        "Appointment updated"
    );

    Ok(Json(updated))
}

// ─── Prescriptions ───────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct MedicationEntry {
    #[validate(length(min = 1, message = "Medication name is required"))]
    name: String,
    #[validate(length(min = 1, message = "Dosage is required"))]
    dosage: String,
    #[validate(length(min = 1, message = "Frequency is required"))]
    frequency: String,
    #[validate(length(min = 1, message = "Duration is required"))]
    duration: String,
}

#[derive(Deserialize, Validate)]
pub struct PrescriptionPayload {
    #[validate(length(min = 1, message = "At least one medication is required"))]
    #[validate(nested)]
    medications: Vec<MedicationEntry>,
    instructions: Option<String>,
    valid_until: Option<String>,
}

/// Issue a prescription against one of the doctor's own appointments.
async fn create_prescription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<PrescriptionPayload>,
) -> Result<(StatusCode, Json<Prescription>)> {
    payload.validate()?;

    let appointment = state
        .db
        .get_appointment(&id)
        .await?
        .filter(|a| a.doctor_id == user.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Appointment {id} not found")))?;

    let medications = serde_json::to_value(&payload.medications)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Medication serialization failed: {e}")))?;

    let prescription = state
        .db
        .create_prescription(&NewPrescription {
            appointment_id: appointment.id,
            doctor_id: user.user_id.clone(),
            patient_id: appointment.patient_id,
            medications,
            instructions: payload.instructions,
            status: PrescriptionStatus::Active,
            valid_until: payload.valid_until,
        })
        .await?;

    tracing::info!(
        doctor_id = %user.user_id,
        prescription_id = %prescription.id,
        "Prescription issued"
    );

    Ok((StatusCode::CREATED, Json(prescription)))
}

// ─── Patients ────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PatientSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Distinct patients this doctor has appointments with.
async fn list_patients(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<PatientSummary>>> {
    let appointments = state
        .db
        .list_appointments_for_doctor(&user.user_id, None)
        .await?;

    let patient_ids: BTreeSet<String> = appointments
        .into_iter()
        .map(|a| a.patient_id)
        .collect();

    let mut patients = Vec::with_capacity(patient_ids.len());
    for patient_id in patient_ids {
        if let Some(profile) = state.db.fetch_profile(&patient_id).await? {
            patients.push(PatientSummary {
                id: profile.id,
                full_name: profile.full_name,
                email: profile.email,
                phone: profile.phone,
            });
        }
    }
    patients.sort_by(|a, b| a.full_name.cmp(&b.full_name));
    Ok(Json(patients))
}

// ─── Schedule ────────────────────────────────────────────────

async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<DoctorAvailability>>> {
    let slots = state.db.list_availability(&user.user_id).await?;
    Ok(Json(slots))
}

#[derive(Deserialize, Validate)]
pub struct SlotPayload {
    #[validate(range(max = 6, message = "day_of_week must be 0-6"))]
    day_of_week: u8,
    #[validate(length(min = 1, message = "start_time is required"))]
    start_time: String,
    #[validate(length(min = 1, message = "end_time is required"))]
    end_time: String,
    #[serde(default = "default_true")]
    is_available: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Validate)]
pub struct SchedulePayload {
    #[validate(nested)]
    slots: Vec<SlotPayload>,
}

/// Replace the weekly availability wholesale. Slot ids derive from
/// (doctor, day, start time), so that tuple must be unique within one
/// submission.
async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<SchedulePayload>,
) -> Result<Json<Vec<DoctorAvailability>>> {
    payload.validate()?;

    let mut seen = BTreeSet::new();
    for slot in &payload.slots {
        if !seen.insert((slot.day_of_week, slot.start_time.as_str())) {
            return Err(AppError::Validation(format!(
                "Duplicate slot on day {} at {}",
                slot.day_of_week, slot.start_time
            )));
        }
    }

    let rows: Vec<DoctorAvailability> = payload
        .slots
        .into_iter()
        .map(|slot| DoctorAvailability {
            id: format!("{}-{}-{}", user.user_id, slot.day_of_week, slot.start_time),
            doctor_id: user.user_id.clone(),
            day_of_week: slot.day_of_week,
            start_time: slot.start_time,
            end_time: slot.end_time,
            is_available: slot.is_available,
        })
        .collect();

    state.db.replace_availability(&user.user_id, &rows).await?;
    let slots = state.db.list_availability(&user.user_id).await?;
    Ok(Json(slots))
}

// ─── Professional Profile ────────────────────────────────────

async fn get_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Doctor>> {
    let doctor = state
        .db
        .get_doctor(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Doctor profile not found".into()))?;
    Ok(Json(doctor))
}

#[derive(Deserialize, Validate)]
pub struct DoctorSettingsPayload {
    #[validate(length(min = 1, message = "Medical license is required"))]
    medical_license: String,
    specialty_id: Option<String>,
    years_experience: Option<u32>,
    #[validate(range(min = 0.0, message = "consultation_fee must be non-negative"))]
    consultation_fee: Option<f64>,
    bio: Option<String>,
    qualifications: Option<Vec<String>>,
    is_available: Option<bool>,
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<DoctorSettingsPayload>,
) -> Result<Json<Doctor>> {
    payload.validate()?;

    let changes = DoctorChanges {
        medical_license: Some(payload.medical_license),
        specialty_id: payload.specialty_id,
        years_experience: payload.years_experience,
        consultation_fee: payload.consultation_fee,
        bio: payload.bio,
        qualifications: payload.qualifications,
        is_available: payload.is_available,
    };

    let doctor = state
        .db
        .update_doctor(&user.user_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Doctor profile not found".into()))?;
    Ok(Json(doctor))
}
