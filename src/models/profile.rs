// SPDX-License-Identifier: MIT

//! User profile model and the portal role enumeration.

use serde::{Deserialize, Serialize};

/// Portal role stored on every user profile.
///
/// Modeled as a closed enum rather than an open string so the access
/// decision match is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-level account record (`user_profiles` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Auth-service identity id (also the row id)
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub role: Role,
    pub avatar_url: Option<String>,
    /// Preferred UI language (en/si/ta)
    pub language: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserProfile {
    /// Minimal profile row created right after signup.
    pub fn new(id: String, email: String, full_name: String, role: Role) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id,
            email,
            full_name,
            phone: None,
            date_of_birth: None,
            gender: None,
            role,
            avatar_url: None,
            language: Some("en".to_string()),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Partial profile update (settings page). `None` fields are left
/// untouched by the data service.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub updated_at: String,
}
