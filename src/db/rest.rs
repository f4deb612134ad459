// SPDX-License-Identifier: MIT

//! Client for the hosted relational data service (PostgREST-style).
//!
//! Provides typed row operations for:
//! - User profiles (role lookup for access control, settings)
//! - Doctors (directory, professional profile, availability)
//! - Appointments (booking inserts, portal listings, status updates)
//! - Medical records and prescriptions
//!
//! Ships with an offline in-memory mode so the full router can run in
//! tests without a backend.

use crate::config::Config;
use crate::db::tables;
use crate::error::AppError;
use crate::models::{
    Appointment, AppointmentStatus, Doctor, DoctorAvailability, DoctorChanges, DoctorListing,
    MedicalRecord, NewAppointment, NewPrescription, Prescription, ProfileChanges, Role,
    UserProfile,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Data service client.
#[derive(Clone)]
pub struct PortalDb {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Rest(RestBackend),
    Mock(Arc<MockStore>),
}

#[derive(Clone)]
struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

/// In-memory tables for offline tests.
#[derive(Default)]
struct MockStore {
    profiles: DashMap<String, UserProfile>,
    doctors: DashMap<String, Doctor>,
    /// specialty id -> name
    specialties: DashMap<String, String>,
    /// doctor id -> weekly rows
    availability: DashMap<String, Vec<DoctorAvailability>>,
    appointments: DashMap<String, Appointment>,
    /// patient id -> rows
    records: DashMap<String, Vec<MedicalRecord>>,
    prescriptions: DashMap<String, Prescription>,
    next_id: AtomicU64,
}

impl MockStore {
    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl PortalDb {
    /// Create a client against the hosted data service.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.lookup_timeout)
            .build()
            .map_err(|e| AppError::Database(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            backend: Backend::Rest(RestBackend {
                http,
                base_url: format!("{}/rest/v1", config.backend_url),
                service_key: config.service_key.clone(),
            }),
        })
    }

    /// Create an offline in-memory client for testing.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Mock(Arc::new(MockStore::default())),
        }
    }

    // ─── Profiles ────────────────────────────────────────────────

    /// Fetch a user profile by identity id.
    pub async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                let rows: Vec<UserProfile> = rest
                    .select(tables::USER_PROFILES, &[("id", format!("eq.{user_id}"))])
                    .await?;
                Ok(rows.into_iter().next())
            }
            Backend::Mock(store) => Ok(store.profiles.get(user_id).map(|p| p.clone())),
        }
    }

    /// Fetch only the role attribute for access control.
    pub async fn fetch_role(&self, user_id: &str) -> Result<Option<Role>, AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                #[derive(Deserialize)]
                struct RoleRow {
                    role: Role,
                }
                let rows: Vec<RoleRow> = rest
                    .select_columns(
                        tables::USER_PROFILES,
                        "role",
                        &[("id", format!("eq.{user_id}"))],
                    )
                    .await?;
                Ok(rows.into_iter().next().map(|r| r.role))
            }
            Backend::Mock(store) => Ok(store.profiles.get(user_id).map(|p| p.role)),
        }
    }

    /// Insert the profile row created at signup.
    pub async fn create_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                let _: UserProfile = rest.insert(tables::USER_PROFILES, profile).await?;
                Ok(())
            }
            Backend::Mock(store) => {
                store.profiles.insert(profile.id.clone(), profile.clone());
                Ok(())
            }
        }
    }

    /// Apply a partial profile update; returns the updated row.
    pub async fn update_profile(
        &self,
        user_id: &str,
        changes: &ProfileChanges,
    ) -> Result<Option<UserProfile>, AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                let rows: Vec<UserProfile> = rest
                    .patch(
                        tables::USER_PROFILES,
                        &[("id", format!("eq.{user_id}"))],
                        changes,
                    )
                    .await?;
                Ok(rows.into_iter().next())
            }
            Backend::Mock(store) => {
                let Some(mut entry) = store.profiles.get_mut(user_id) else {
                    return Ok(None);
                };
                if let Some(v) = &changes.full_name {
                    entry.full_name = v.clone();
                }
                if let Some(v) = &changes.phone {
                    entry.phone = Some(v.clone());
                }
                if let Some(v) = &changes.date_of_birth {
                    entry.date_of_birth = Some(v.clone());
                }
                if let Some(v) = &changes.gender {
                    entry.gender = Some(v.clone());
                }
                if let Some(v) = &changes.language {
                    entry.language = Some(v.clone());
                }
                entry.updated_at = changes.updated_at.clone();
                Ok(Some(entry.clone()))
            }
        }
    }

    // ─── Doctors ─────────────────────────────────────────────────

    /// Verified-doctor directory with profile display fields, optionally
    /// filtered by specialty name.
    pub async fn list_doctors(
        &self,
        specialty: Option<&str>,
    ) -> Result<Vec<DoctorListing>, AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                #[derive(Deserialize)]
                struct ProfileEmbed {
                    full_name: String,
                    avatar_url: Option<String>,
                }
                #[derive(Deserialize)]
                struct SpecialtyEmbed {
                    name: String,
                }
                #[derive(Deserialize)]
                struct DoctorRow {
                    #[serde(flatten)]
                    doctor: Doctor,
                    user_profiles: Option<ProfileEmbed>,
                    specialties: Option<SpecialtyEmbed>,
                }

                let rows: Vec<DoctorRow> = rest
                    .select_columns(
                        tables::DOCTORS,
                        "*,user_profiles(full_name,avatar_url),specialties(name)",
                        &[("is_verified", "eq.true".to_string())],
                    )
                    .await?;

                let mut listings: Vec<DoctorListing> = rows
                    .into_iter()
                    .map(|row| DoctorListing {
                        id: row.doctor.id,
                        full_name: row
                            .user_profiles
                            .as_ref()
                            .map(|p| p.full_name.clone())
                            .unwrap_or_default(),
                        avatar_url: row.user_profiles.and_then(|p| p.avatar_url),
                        specialty: row.specialties.map(|s| s.name),
                        years_experience: row.doctor.years_experience,
                        consultation_fee: row.doctor.consultation_fee,
                        rating: row.doctor.rating,
                        total_reviews: row.doctor.total_reviews,
                        is_available: row.doctor.is_available.unwrap_or(false),
                    })
                    .collect();

                if let Some(specialty) = specialty {
                    listings.retain(|l| l.specialty.as_deref() == Some(specialty));
                }
                listings.sort_by(|a, b| a.full_name.cmp(&b.full_name));
                Ok(listings)
            }
            Backend::Mock(store) => {
                let mut listings: Vec<DoctorListing> = store
                    .doctors
                    .iter()
                    .filter(|d| d.is_verified.unwrap_or(false))
                    .map(|d| {
                        let profile = store.profiles.get(&d.id);
                        DoctorListing {
                            id: d.id.clone(),
                            full_name: profile
                                .as_ref()
                                .map(|p| p.full_name.clone())
                                .unwrap_or_default(),
                            avatar_url: profile.and_then(|p| p.avatar_url.clone()),
                            specialty: d
                                .specialty_id
                                .as_ref()
                                .and_then(|id| store.specialties.get(id).map(|s| s.clone())),
                            years_experience: d.years_experience,
                            consultation_fee: d.consultation_fee,
                            rating: d.rating,
                            total_reviews: d.total_reviews,
                            is_available: d.is_available.unwrap_or(false),
                        }
                    })
                    .collect();

                if let Some(specialty) = specialty {
                    listings.retain(|l| l.specialty.as_deref() == Some(specialty));
                }
                listings.sort_by(|a, b| a.full_name.cmp(&b.full_name));
                Ok(listings)
            }
        }
    }

    /// Fetch a doctor's professional record.
    pub async fn get_doctor(&self, doctor_id: &str) -> Result<Option<Doctor>, AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                let rows: Vec<Doctor> = rest
                    .select(tables::DOCTORS, &[("id", format!("eq.{doctor_id}"))])
                    .await?;
                Ok(rows.into_iter().next())
            }
            Backend::Mock(store) => Ok(store.doctors.get(doctor_id).map(|d| d.clone())),
        }
    }

    /// Apply a partial update to a doctor's professional record.
    pub async fn update_doctor(
        &self,
        doctor_id: &str,
        changes: &DoctorChanges,
    ) -> Result<Option<Doctor>, AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                let rows: Vec<Doctor> = rest
                    .patch(tables::DOCTORS, &[("id", format!("eq.{doctor_id}"))], changes)
                    .await?;
                Ok(rows.into_iter().next())
            }
            Backend::Mock(store) => {
                let Some(mut entry) = store.doctors.get_mut(doctor_id) else {
                    return Ok(None);
                };
                if let Some(v) = &changes.medical_license {
                    entry.medical_license = v.clone();
                }
                if let Some(v) = &changes.specialty_id {
                    entry.specialty_id = Some(v.clone());
                }
                if let Some(v) = changes.years_experience {
                    entry.years_experience = Some(v);
                }
                if let Some(v) = changes.consultation_fee {
                    entry.consultation_fee = Some(v);
                }
                if let Some(v) = &changes.bio {
                    entry.bio = Some(v.clone());
                }
                if let Some(v) = &changes.qualifications {
                    entry.qualifications = Some(v.clone());
                }
                if let Some(v) = changes.is_available {
                    entry.is_available = Some(v);
                }
                Ok(Some(entry.clone()))
            }
        }
    }

    /// Weekly availability rows for a doctor.
    pub async fn list_availability(
        &self,
        doctor_id: &str,
    ) -> Result<Vec<DoctorAvailability>, AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                let mut rows: Vec<DoctorAvailability> = rest
                    .select(
                        tables::DOCTOR_AVAILABILITY,
                        &[("doctor_id", format!("eq.{doctor_id}"))],
                    )
                    .await?;
                rows.sort_by_key(|r| (r.day_of_week, r.start_time.clone()));
                Ok(rows)
            }
            Backend::Mock(store) => {
                let mut rows = store
                    .availability
                    .get(doctor_id)
                    .map(|r| r.clone())
                    .unwrap_or_default();
                rows.sort_by_key(|r| (r.day_of_week, r.start_time.clone()));
                Ok(rows)
            }
        }
    }

    /// Replace a doctor's weekly availability wholesale.
    pub async fn replace_availability(
        &self,
        doctor_id: &str,
        rows: &[DoctorAvailability],
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                rest.delete(
                    tables::DOCTOR_AVAILABILITY,
                    &[("doctor_id", format!("eq.{doctor_id}"))],
                )
                .await?;
                if !rows.is_empty() {
                    let _: Vec<DoctorAvailability> =
                        rest.insert_many(tables::DOCTOR_AVAILABILITY, rows).await?;
                }
                Ok(())
            }
            Backend::Mock(store) => {
                store
                    .availability
                    .insert(doctor_id.to_string(), rows.to_vec());
                Ok(())
            }
        }
    }

    // ─── Appointments ────────────────────────────────────────────

    /// Insert a booking. Plain insert; no slot-conflict arbitration.
    pub async fn create_appointment(
        &self,
        new: &NewAppointment,
    ) -> Result<Appointment, AppError> {
        match &self.backend {
            Backend::Rest(rest) => rest.insert(tables::APPOINTMENTS, new).await,
            Backend::Mock(store) => {
                let now = chrono::Utc::now().to_rfc3339();
                let appointment = Appointment {
                    id: store.next_id("apt"),
                    patient_id: new.patient_id.clone(),
                    doctor_id: new.doctor_id.clone(),
                    appointment_date: new.appointment_date.clone(),
                    appointment_time: new.appointment_time.clone(),
                    duration_minutes: Some(new.duration_minutes),
                    reason: new.reason.clone(),
                    status: new.status,
                    notes: None,
                    consultation_fee: new.consultation_fee,
                    created_at: now.clone(),
                    updated_at: now,
                };
                store
                    .appointments
                    .insert(appointment.id.clone(), appointment.clone());
                Ok(appointment)
            }
        }
    }

    pub async fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                let rows: Vec<Appointment> = rest
                    .select(tables::APPOINTMENTS, &[("id", format!("eq.{id}"))])
                    .await?;
                Ok(rows.into_iter().next())
            }
            Backend::Mock(store) => Ok(store.appointments.get(id).map(|a| a.clone())),
        }
    }

    /// A patient's appointments, newest first.
    pub async fn list_appointments_for_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Appointment>, AppError> {
        let mut rows = match &self.backend {
            Backend::Rest(rest) => {
                rest.select(
                    tables::APPOINTMENTS,
                    &[("patient_id", format!("eq.{patient_id}"))],
                )
                .await?
            }
            Backend::Mock(store) => store
                .appointments
                .iter()
                .filter(|a| a.patient_id == patient_id)
                .map(|a| a.clone())
                .collect(),
        };
        sort_newest_first(&mut rows);
        Ok(rows)
    }

    /// A doctor's appointments, optionally filtered by status, newest
    /// first.
    pub async fn list_appointments_for_doctor(
        &self,
        doctor_id: &str,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, AppError> {
        let mut rows: Vec<Appointment> = match &self.backend {
            Backend::Rest(rest) => {
                rest.select(
                    tables::APPOINTMENTS,
                    &[("doctor_id", format!("eq.{doctor_id}"))],
                )
                .await?
            }
            Backend::Mock(store) => store
                .appointments
                .iter()
                .filter(|a| a.doctor_id == doctor_id)
                .map(|a| a.clone())
                .collect(),
        };
        if let Some(status) = status {
            rows.retain(|a| a.status == status);
        }
        sort_newest_first(&mut rows);
        Ok(rows)
    }

    /// Update an appointment's status; returns the updated row.
    pub async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                #[derive(Serialize)]
                struct StatusPatch {
                    status: AppointmentStatus,
                    updated_at: String,
                }
                let rows: Vec<Appointment> = rest
                    .patch(
                        tables::APPOINTMENTS,
                        &[("id", format!("eq.{id}"))],
                        &StatusPatch {
                            status,
                            updated_at: chrono::Utc::now().to_rfc3339(),
                        },
                    )
                    .await?;
                Ok(rows.into_iter().next())
            }
            Backend::Mock(store) => {
                let Some(mut entry) = store.appointments.get_mut(id) else {
                    return Ok(None);
                };
                entry.status = status;
                entry.updated_at = chrono::Utc::now().to_rfc3339();
                Ok(Some(entry.clone()))
            }
        }
    }

    // ─── Records & Prescriptions ─────────────────────────────────

    pub async fn list_records(&self, patient_id: &str) -> Result<Vec<MedicalRecord>, AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                rest.select(
                    tables::MEDICAL_RECORDS,
                    &[("patient_id", format!("eq.{patient_id}"))],
                )
                .await
            }
            Backend::Mock(store) => Ok(store
                .records
                .get(patient_id)
                .map(|r| r.clone())
                .unwrap_or_default()),
        }
    }

    pub async fn list_prescriptions_for_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Prescription>, AppError> {
        match &self.backend {
            Backend::Rest(rest) => {
                rest.select(
                    tables::PRESCRIPTIONS,
                    &[("patient_id", format!("eq.{patient_id}"))],
                )
                .await
            }
            Backend::Mock(store) => Ok(store
                .prescriptions
                .iter()
                .filter(|p| p.patient_id == patient_id)
                .map(|p| p.clone())
                .collect()),
        }
    }

    pub async fn create_prescription(
        &self,
        new: &NewPrescription,
    ) -> Result<Prescription, AppError> {
        match &self.backend {
            Backend::Rest(rest) => rest.insert(tables::PRESCRIPTIONS, new).await,
            Backend::Mock(store) => {
                let prescription = Prescription {
                    id: store.next_id("rx"),
                    appointment_id: new.appointment_id.clone(),
                    doctor_id: new.doctor_id.clone(),
                    patient_id: new.patient_id.clone(),
                    medications: new.medications.clone(),
                    instructions: new.instructions.clone(),
                    status: new.status,
                    valid_until: new.valid_until.clone(),
                    created_at: chrono::Utc::now().to_rfc3339(),
                };
                store
                    .prescriptions
                    .insert(prescription.id.clone(), prescription.clone());
                Ok(prescription)
            }
        }
    }

    // ─── Mock Helpers (tests) ────────────────────────────────────

    pub fn mock_insert_profile(&self, profile: UserProfile) {
        if let Backend::Mock(store) = &self.backend {
            store.profiles.insert(profile.id.clone(), profile);
        }
    }

    pub fn mock_insert_doctor(&self, doctor: Doctor) {
        if let Backend::Mock(store) = &self.backend {
            store.doctors.insert(doctor.id.clone(), doctor);
        }
    }

    pub fn mock_insert_specialty(&self, id: &str, name: &str) {
        if let Backend::Mock(store) = &self.backend {
            store.specialties.insert(id.to_string(), name.to_string());
        }
    }

    pub fn mock_insert_record(&self, record: MedicalRecord) {
        if let Backend::Mock(store) = &self.backend {
            store
                .records
                .entry(record.patient_id.clone())
                .or_default()
                .push(record);
        }
    }
}

/// Order appointments newest (date, time) first.
fn sort_newest_first(rows: &mut [Appointment]) {
    rows.sort_by(|a, b| {
        (b.appointment_date.as_str(), b.appointment_time.as_str())
            .cmp(&(a.appointment_date.as_str(), a.appointment_time.as_str()))
    });
}

impl RestBackend {
    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn select<T: for<'de> Deserialize<'de>>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        self.select_columns(table, "*", filters).await
    }

    async fn select_columns<T: for<'de> Deserialize<'de>>(
        &self,
        table: &str,
        columns: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        let mut query: Vec<(&str, String)> = vec![("select", columns.to_string())];
        query.extend(filters.iter().map(|(k, v)| (*k, v.clone())));

        let response = self
            .request(reqwest::Method::GET, table)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::check_json(response).await
    }

    /// Insert one row, returning the stored representation.
    async fn insert<T: for<'de> Deserialize<'de>, B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let rows: Vec<T> = self.insert_many(table, body).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Database(format!("Insert into {table} returned no row")))
    }

    async fn insert_many<T: for<'de> Deserialize<'de>, B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<Vec<T>, AppError> {
        let response = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::check_json(response).await
    }

    async fn patch<T: for<'de> Deserialize<'de>, B: Serialize + ?Sized>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> Result<Vec<T>, AppError> {
        let response = self
            .request(reqwest::Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(filters)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::check_json(response).await
    }

    async fn delete(&self, table: &str, filters: &[(&str, String)]) -> Result<(), AppError> {
        let response = self
            .request(reqwest::Method::DELETE, table)
            .query(filters)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Database(format!(
                "Delete from {table} failed: {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn check_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Database(format!("{status}: {detail}")));
        }
        response
            .json()
            .await
            .map_err(|e| AppError::Database(format!("Malformed data response: {e}")))
    }
}
