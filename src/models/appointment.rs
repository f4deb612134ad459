// SPDX-License-Identifier: MIT

//! Appointment models (`appointments` table).

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifecycle of a booked appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

/// Booked appointment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    /// "YYYY-MM-DD"
    pub appointment_date: String,
    /// "HH:MM"
    pub appointment_time: String,
    pub duration_minutes: Option<u32>,
    pub reason: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub consultation_fee: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert payload for a new booking. The booking operation is a plain
/// insert; slot conflicts are not arbitrated.
#[derive(Debug, Clone, Serialize)]
pub struct NewAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub duration_minutes: u32,
    pub reason: String,
    pub status: AppointmentStatus,
    pub consultation_fee: Option<f64>,
}
