// SPDX-License-Identifier: MIT

//! The access decision engine: a pure function from (auth context, route
//! class, path) to allow-or-redirect. All state is passed in explicitly,
//! so the same inputs always produce the same decision.

use super::route_class::RouteClass;
use crate::models::Role;

/// Portal home paths used as redirect targets.
pub const LOGIN_PATH: &str = "/login";
pub const PATIENT_HOME: &str = "/dashboard";
pub const DOCTOR_HOME: &str = "/doctor";

/// Authentication state of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthContext {
    Anonymous,
    /// Valid session; role is `None` while the profile row does not
    /// exist yet (mid-signup) or the lookup degraded.
    Authenticated { role: Option<Role> },
}

/// Outcome of the access decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Pass the request through unmodified
    Proceed,
    /// Issue an HTTP redirect to the given path
    Redirect(&'static str),
}

/// Map a role to its portal home. Also used for the post-login landing.
pub fn portal_home(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Patient) => PATIENT_HOME,
        Some(Role::Doctor) => DOCTOR_HOME,
        // Admin has no portal of its own; unknown or missing roles land
        // back on the login page.
        Some(Role::Admin) | None => LOGIN_PATH,
    }
}

/// Decide whether a request proceeds or is redirected.
pub fn decide(auth: AuthContext, class: RouteClass, path: &str) -> AccessDecision {
    use AccessDecision::{Proceed, Redirect};

    let decision = match (auth, class) {
        (AuthContext::Anonymous, RouteClass::Public) => Proceed,
        (AuthContext::Anonymous, _) => Redirect(LOGIN_PATH),

        // Signed-in users have no business on the auth pages; send them
        // to their portal. Other public paths (like "/") stay reachable.
        (AuthContext::Authenticated { role }, RouteClass::Public)
            if path == "/login" || path == "/signup" =>
        {
            Redirect(portal_home(role))
        }
        (AuthContext::Authenticated { .. }, RouteClass::Public) => Proceed,

        // Cross-portal access bounces to the caller's own portal.
        (
            AuthContext::Authenticated {
                role: Some(Role::Patient),
            },
            RouteClass::DoctorOnly,
        ) => Redirect(PATIENT_HOME),
        (
            AuthContext::Authenticated {
                role: Some(Role::Doctor),
            },
            RouteClass::PatientOnly,
        ) => Redirect(DOCTOR_HOME),

        // A session without a profile row counts as unauthenticated on
        // role-gated routes.
        (AuthContext::Authenticated { role: None }, RouteClass::PatientOnly)
        | (AuthContext::Authenticated { role: None }, RouteClass::DoctorOnly) => {
            Redirect(LOGIN_PATH)
        }

        _ => Proceed,
    };

    // Never redirect a request to the path it is already on; this keeps
    // role-less sessions on /login from looping.
    match decision {
        Redirect(target) if target == path => Proceed,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::route_class::classify;

    fn decide_path(auth: AuthContext, path: &str) -> AccessDecision {
        decide(auth, classify(path), path)
    }

    fn patient() -> AuthContext {
        AuthContext::Authenticated {
            role: Some(Role::Patient),
        }
    }

    fn doctor() -> AuthContext {
        AuthContext::Authenticated {
            role: Some(Role::Doctor),
        }
    }

    #[test]
    fn test_anonymous_protected_routes_redirect_to_login() {
        for path in ["/dashboard", "/doctor", "/book/123", "/profile", "/records"] {
            assert_eq!(
                decide_path(AuthContext::Anonymous, path),
                AccessDecision::Redirect(LOGIN_PATH),
                "path {path}"
            );
        }
    }

    #[test]
    fn test_anonymous_public_routes_proceed() {
        for path in ["/", "/login", "/signup", "/auth/callback"] {
            assert_eq!(
                decide_path(AuthContext::Anonymous, path),
                AccessDecision::Proceed,
                "path {path}"
            );
        }
    }

    #[test]
    fn test_authenticated_auth_pages_redirect_home() {
        assert_eq!(
            decide_path(patient(), "/login"),
            AccessDecision::Redirect(PATIENT_HOME)
        );
        assert_eq!(
            decide_path(patient(), "/signup"),
            AccessDecision::Redirect(PATIENT_HOME)
        );
        assert_eq!(
            decide_path(doctor(), "/login"),
            AccessDecision::Redirect(DOCTOR_HOME)
        );
    }

    #[test]
    fn test_authenticated_root_proceeds() {
        assert_eq!(decide_path(patient(), "/"), AccessDecision::Proceed);
        assert_eq!(decide_path(doctor(), "/"), AccessDecision::Proceed);
    }

    #[test]
    fn test_cross_role_redirects() {
        assert_eq!(
            decide_path(patient(), "/doctor"),
            AccessDecision::Redirect(PATIENT_HOME)
        );
        assert_eq!(
            decide_path(patient(), "/doctor/appointments"),
            AccessDecision::Redirect(PATIENT_HOME)
        );
        assert_eq!(
            decide_path(doctor(), "/settings"),
            AccessDecision::Redirect(DOCTOR_HOME)
        );
        assert_eq!(
            decide_path(doctor(), "/records"),
            AccessDecision::Redirect(DOCTOR_HOME)
        );
    }

    #[test]
    fn test_doctors_directory_is_a_patient_route() {
        // Segment matching: a doctor browsing /doctors is bounced to the
        // doctor portal, and a patient stays.
        assert_eq!(
            decide_path(doctor(), "/doctors"),
            AccessDecision::Redirect(DOCTOR_HOME)
        );
        assert_eq!(decide_path(patient(), "/doctors"), AccessDecision::Proceed);
        assert_eq!(
            decide_path(patient(), "/doctors/123"),
            AccessDecision::Proceed
        );
    }

    #[test]
    fn test_own_portal_proceeds() {
        assert_eq!(decide_path(patient(), "/dashboard"), AccessDecision::Proceed);
        assert_eq!(decide_path(doctor(), "/doctor"), AccessDecision::Proceed);
        assert_eq!(
            decide_path(doctor(), "/doctor/schedule"),
            AccessDecision::Proceed
        );
    }

    #[test]
    fn test_roleless_session_on_gated_routes() {
        let roleless = AuthContext::Authenticated { role: None };
        assert_eq!(
            decide_path(roleless, "/dashboard"),
            AccessDecision::Redirect(LOGIN_PATH)
        );
        assert_eq!(
            decide_path(roleless, "/doctor"),
            AccessDecision::Redirect(LOGIN_PATH)
        );
        // Loop guard: portal_home(None) is /login, which is the current
        // path here, so the request passes through instead of looping.
        assert_eq!(decide_path(roleless, "/login"), AccessDecision::Proceed);
        // Unclassified needs a session but no role.
        assert_eq!(decide_path(roleless, "/profile"), AccessDecision::Proceed);
    }

    #[test]
    fn test_admin_passes_role_gates() {
        let admin = AuthContext::Authenticated {
            role: Some(Role::Admin),
        };
        assert_eq!(decide_path(admin, "/dashboard"), AccessDecision::Proceed);
        assert_eq!(decide_path(admin, "/doctor"), AccessDecision::Proceed);
        assert_eq!(decide_path(admin, "/login"), AccessDecision::Proceed);
        assert_eq!(
            decide_path(admin, "/signup"),
            AccessDecision::Redirect(LOGIN_PATH)
        );
    }

    #[test]
    fn test_decision_is_idempotent() {
        let cases = [
            (AuthContext::Anonymous, "/dashboard"),
            (patient(), "/doctor"),
            (doctor(), "/doctors"),
            (patient(), "/"),
        ];
        for (auth, path) in cases {
            let first = decide_path(auth, path);
            let second = decide_path(auth, path);
            assert_eq!(first, second, "decision changed for {path}");
        }
    }

    #[test]
    fn test_portal_home_mapping() {
        assert_eq!(portal_home(Some(Role::Patient)), PATIENT_HOME);
        assert_eq!(portal_home(Some(Role::Doctor)), DOCTOR_HOME);
        assert_eq!(portal_home(Some(Role::Admin)), LOGIN_PATH);
        assert_eq!(portal_home(None), LOGIN_PATH);
    }
}
