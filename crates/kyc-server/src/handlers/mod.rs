//! HTTP handlers

pub mod health;
pub mod kyc;

pub use health::health;
