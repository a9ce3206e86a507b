//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Multi-statement writes run in a single
//! transaction.

pub mod configuration_repo;
pub mod extension_repo;
pub mod group_repo;
pub mod history_repo;

pub use configuration_repo::ConfigurationRepo;
pub use extension_repo::ExtensionRepo;
pub use group_repo::GroupRepo;
pub use history_repo::HistoryRepo;
