//! Well-known role name constants.
//!
//! Roles are issued by the external user subsystem and arrive in the JWT
//! `role` claim.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
