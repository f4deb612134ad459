// SPDX-License-Identifier: MIT

//! Medical record and prescription models.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Uploaded medical record row (`medical_records` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MedicalRecord {
    pub id: String,
    pub patient_id: String,
    pub title: String,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub uploaded_by: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    Active,
    Completed,
    Cancelled,
}

/// Prescription row (`prescriptions` table).
///
/// Medications are stored as the JSON array the doctor submitted
/// (name/dosage/frequency/duration per entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    pub appointment_id: String,
    pub doctor_id: String,
    pub patient_id: String,
    pub medications: serde_json::Value,
    pub instructions: Option<String>,
    pub status: PrescriptionStatus,
    pub valid_until: Option<String>,
    pub created_at: String,
}

/// Insert payload for a new prescription.
#[derive(Debug, Clone, Serialize)]
pub struct NewPrescription {
    pub appointment_id: String,
    pub doctor_id: String,
    pub patient_id: String,
    pub medications: serde_json::Value,
    pub instructions: Option<String>,
    pub status: PrescriptionStatus,
    pub valid_until: Option<String>,
}
