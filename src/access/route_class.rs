// SPDX-License-Identifier: MIT

//! Static classification of request paths into access tiers.
//!
//! Matching is path-segment aware: a prefix matches only when it is
//! followed by end-of-path or `/`. Raw string-prefix matching would
//! misclassify `/doctors/123` (patient directory) as `/doctor` (doctor
//! portal); segment matching plus checking the patient prefixes first
//! removes that ambiguity.

/// Access tier of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable without a session
    Public,
    /// Patient portal only
    PatientOnly,
    /// Doctor portal only
    DoctorOnly,
    /// Requires a session but no specific role
    Unclassified,
}

/// Paths reachable without authentication.
const PUBLIC_EXACT: &[&str] = &[
    "/",
    "/login",
    "/signup",
    "/reset-password",
    "/auth/callback",
    "/auth/auth-code-error",
];

/// Patient portal sections. Checked before the doctor prefix so that
/// `/doctors` never falls into the doctor portal.
const PATIENT_PREFIXES: &[&str] = &[
    "/dashboard",
    "/doctors",
    "/book",
    "/appointments",
    "/records",
    "/settings",
];

const DOCTOR_PREFIXES: &[&str] = &["/doctor"];

/// True when `path` equals `prefix` or continues it at a `/` boundary.
fn segment_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Classify a request path into its access tier.
pub fn classify(path: &str) -> RouteClass {
    if PUBLIC_EXACT.contains(&path) || path.starts_with("/auth/") {
        RouteClass::Public
    } else if PATIENT_PREFIXES.iter().any(|p| segment_prefix(path, p)) {
        RouteClass::PatientOnly
    } else if DOCTOR_PREFIXES.iter().any(|p| segment_prefix(path, p)) {
        RouteClass::DoctorOnly
    } else {
        RouteClass::Unclassified
    }
}

/// Static assets bypass the access-control flow entirely.
pub fn is_static_asset(path: &str) -> bool {
    const IMAGE_EXTENSIONS: &[&str] = &[".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

    path.starts_with("/_next/static/")
        || path.starts_with("/_next/image")
        || path == "/favicon.ico"
        || IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes() {
        assert_eq!(classify("/"), RouteClass::Public);
        assert_eq!(classify("/login"), RouteClass::Public);
        assert_eq!(classify("/signup"), RouteClass::Public);
        assert_eq!(classify("/reset-password"), RouteClass::Public);
        assert_eq!(classify("/auth/callback"), RouteClass::Public);
        assert_eq!(classify("/auth/logout"), RouteClass::Public);
        assert_eq!(classify("/auth/anything/else"), RouteClass::Public);
    }

    #[test]
    fn test_patient_routes() {
        assert_eq!(classify("/dashboard"), RouteClass::PatientOnly);
        assert_eq!(classify("/doctors"), RouteClass::PatientOnly);
        assert_eq!(classify("/doctors/123"), RouteClass::PatientOnly);
        assert_eq!(classify("/book/abc-def"), RouteClass::PatientOnly);
        assert_eq!(classify("/appointments"), RouteClass::PatientOnly);
        assert_eq!(classify("/records"), RouteClass::PatientOnly);
        assert_eq!(classify("/settings"), RouteClass::PatientOnly);
    }

    #[test]
    fn test_doctor_routes() {
        assert_eq!(classify("/doctor"), RouteClass::DoctorOnly);
        assert_eq!(classify("/doctor/appointments"), RouteClass::DoctorOnly);
        assert_eq!(classify("/doctor/patients"), RouteClass::DoctorOnly);
    }

    #[test]
    fn test_doctor_vs_doctors_disambiguation() {
        // The known pitfall: /doctors must never classify as doctor-only.
        assert_eq!(classify("/doctors"), RouteClass::PatientOnly);
        assert_eq!(classify("/doctors/0b1c"), RouteClass::PatientOnly);
        assert_eq!(classify("/doctor"), RouteClass::DoctorOnly);
        // And an unrelated segment sharing the prefix letters stays out.
        assert_eq!(classify("/doctorate"), RouteClass::Unclassified);
    }

    #[test]
    fn test_unclassified_routes() {
        assert_eq!(classify("/profile"), RouteClass::Unclassified);
        assert_eq!(classify("/admin"), RouteClass::Unclassified);
        assert_eq!(classify("/api/whatever"), RouteClass::Unclassified);
    }

    #[test]
    fn test_static_assets() {
        assert!(is_static_asset("/favicon.ico"));
        assert!(is_static_asset("/_next/static/chunks/main.js"));
        assert!(is_static_asset("/_next/image?url=foo"));
        assert!(is_static_asset("/logo.svg"));
        assert!(is_static_asset("/images/hero.webp"));
        assert!(!is_static_asset("/dashboard"));
        assert!(!is_static_asset("/doctors"));
    }
}
