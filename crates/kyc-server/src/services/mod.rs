//! Business logic services

pub mod kyc_service;

pub use kyc_service::KycService;
