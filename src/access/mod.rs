// SPDX-License-Identifier: MIT

//! Role-based access control: route classification and the pure
//! allow/redirect decision applied to every portal request.

pub mod decision;
pub mod route_class;

pub use decision::{decide, portal_home, AccessDecision, AuthContext};
pub use route_class::{classify, is_static_asset, RouteClass};
