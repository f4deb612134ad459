// SPDX-License-Identifier: MIT

//! Telecare Portal: gateway for the telemedicine booking application.
//!
//! This crate fronts the patient and doctor portals with a role-based
//! access-control flow and exposes the portals' data operations as thin
//! JSON handlers over the hosted auth and data services.

pub mod access;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::PortalDb;
use services::IdentityClient;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub identity: IdentityClient,
    pub db: PortalDb,
}
