//! Domain logic for assistant configurations: extension argument schemas,
//! secret masking, argument validation, history snapshots, and the portable
//! export/import document.
//!
//! Nothing in this crate touches the database.

pub mod arguments;
pub mod configuration;
pub mod error;
pub mod extension_spec;
pub mod history;
pub mod masking;
pub mod portable;
pub mod roles;
pub mod snapshot;
pub mod types;
