//! HTTP request and response bodies
//!
//! Field names follow the established wire format: camelCase for the
//! document numbers, snake_case for `merchant_id`.

use crate::kyc::{Kyc, KycRecord, KycUpdate, NewKyc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /create-kyc`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateKycRequest {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "panNumber", default)]
    pub pan_number: String,
    #[serde(rename = "aadharNumber", default, skip_serializing_if = "Option::is_none")]
    pub aadhar_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<Uuid>,
}

impl From<CreateKycRequest> for NewKyc {
    fn from(req: CreateKycRequest) -> Self {
        NewKyc {
            name: req.name,
            pan_number: req.pan_number,
            aadhar_number: req.aadhar_number.filter(|s| !s.is_empty()),
            merchant_id: req.merchant_id,
        }
    }
}

/// Body of `PATCH /kyc/:merchant_id`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateKycRequest {
    #[serde(rename = "panNumber", default, skip_serializing_if = "Option::is_none")]
    pub pan_number: Option<String>,
    #[serde(rename = "aadharNumber", default, skip_serializing_if = "Option::is_none")]
    pub aadhar_number: Option<String>,
}

impl From<UpdateKycRequest> for KycUpdate {
    fn from(req: UpdateKycRequest) -> Self {
        KycUpdate::new(req.pan_number, req.aadhar_number)
    }
}

/// A verification record as returned to HTTP clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycResponse {
    pub name: String,
    #[serde(rename = "panNumber")]
    pub pan_number: String,
    #[serde(rename = "aadharNumber", default, skip_serializing_if = "Option::is_none")]
    pub aadhar_number: Option<String>,
    pub merchant_id: Uuid,
}

impl From<Kyc> for KycResponse {
    fn from(kyc: Kyc) -> Self {
        KycResponse {
            name: kyc.name,
            pan_number: kyc.pan_number,
            aadhar_number: kyc.aadhar_number,
            merchant_id: kyc.merchant_id,
        }
    }
}

impl From<KycRecord> for KycResponse {
    fn from(record: KycRecord) -> Self {
        KycResponse {
            name: record.name,
            pan_number: record.pan_number,
            aadhar_number: None,
            merchant_id: record.merchant_id,
        }
    }
}
