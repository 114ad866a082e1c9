//! KYC Types - Pure type definitions shared by the KYC cache service
//!
//! This crate contains only plain data types and their serde wire forms,
//! with no async runtime or database dependencies.

pub mod dto;
pub mod kyc;
pub mod snapshot;

pub use dto::*;
pub use kyc::*;
pub use snapshot::*;
