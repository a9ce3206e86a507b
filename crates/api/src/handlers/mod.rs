//! HTTP handler functions, one module per resource.

pub mod configurations;
pub mod extension_specs;
pub mod extensions;
pub mod history;
pub mod portable;
