//! Storage layer
//!
//! SQLite (embedded) holds the verification records.
//! A DashMap cache fronts it, snapshotted to a JSON file for warm restarts.

pub mod db;
pub mod loader;
pub mod memory;
pub mod store;

pub use db::Database;
pub use memory::KycCache;
pub use store::KycStore;
