// SPDX-License-Identifier: MIT

//! Data models mirroring the hosted backend tables.

pub mod appointment;
pub mod doctor;
pub mod profile;
pub mod record;

pub use appointment::{Appointment, AppointmentStatus, NewAppointment};
pub use doctor::{Doctor, DoctorAvailability, DoctorChanges, DoctorListing};
pub use profile::{ProfileChanges, Role, UserProfile};
pub use record::{MedicalRecord, NewPrescription, Prescription, PrescriptionStatus};
