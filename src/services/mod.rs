// SPDX-License-Identifier: MIT

//! Service clients for the hosted backend.

pub mod identity;

pub use identity::{Identity, IdentityClient, ResolvedSession, SessionTokens};
