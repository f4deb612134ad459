// SPDX-License-Identifier: MIT

//! Data service layer (hosted REST tables).

pub mod rest;

pub use rest::PortalDb;

/// Table names as constants.
pub mod tables {
    pub const USER_PROFILES: &str = "user_profiles";
    pub const DOCTORS: &str = "doctors";
    pub const SPECIALTIES: &str = "specialties";
    pub const APPOINTMENTS: &str = "appointments";
    pub const MEDICAL_RECORDS: &str = "medical_records";
    pub const PRESCRIPTIONS: &str = "prescriptions";
    pub const DOCTOR_AVAILABILITY: &str = "doctor_availability";
}
