//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` request DTOs used by the API layer
//! - Conversions into the pure document types of `concierge-core`

pub mod configuration;
pub mod extension;
pub mod group;
pub mod history;
