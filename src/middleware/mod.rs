// SPDX-License-Identifier: MIT

//! Middleware modules (access control, security headers).

pub mod access;
pub mod security;

pub use access::{enforce_access, CurrentUser};
