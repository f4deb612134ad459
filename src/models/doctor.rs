// SPDX-License-Identifier: MIT

//! Doctor directory models (`doctors` and `doctor_availability` tables).

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Professional record for a doctor account (`doctors` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    /// Same id as the doctor's user profile
    pub id: String,
    pub medical_license: String,
    pub specialty_id: Option<String>,
    pub years_experience: Option<u32>,
    pub consultation_fee: Option<f64>,
    pub bio: Option<String>,
    pub qualifications: Option<Vec<String>>,
    pub is_verified: Option<bool>,
    pub is_available: Option<bool>,
    pub rating: Option<f64>,
    pub total_reviews: Option<u32>,
    pub created_at: String,
}

/// Doctor joined with the display fields patients browse by.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DoctorListing {
    pub id: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub specialty: Option<String>,
    pub years_experience: Option<u32>,
    pub consultation_fee: Option<f64>,
    pub rating: Option<f64>,
    pub total_reviews: Option<u32>,
    pub is_available: bool,
}

/// Partial update of a doctor's professional profile.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DoctorChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_experience: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultation_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifications: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

/// Weekly availability row (`doctor_availability` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DoctorAvailability {
    pub id: String,
    pub doctor_id: String,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    /// "HH:MM" 24h clock
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}
