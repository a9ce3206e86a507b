//! Bearer-token authentication. Tokens are issued by the identity service;
//! this crate only validates them (and mints them in tests).

pub mod jwt;
