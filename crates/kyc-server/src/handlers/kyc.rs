//! KYC handlers

use crate::error::{KycError, Result};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use kyc_types::{CreateKycRequest, KycResponse, KycUpdate, NewKyc, UpdateKycRequest};
use serde_json::{json, Value};
use uuid::Uuid;

fn parse_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        KycError::InvalidRequest("Invalid request body".into())
    })
}

fn parse_merchant_id(raw: &str) -> Result<Uuid> {
    if raw.is_empty() {
        return Err(KycError::InvalidRequest("MerchantId is required".into()));
    }
    Uuid::parse_str(raw)
        .map_err(|_| KycError::InvalidRequest(format!("Invalid merchant_id: {}", raw)))
}

pub async fn create(
    State(state): State<AppState>,
    body: std::result::Result<Json<CreateKycRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let req = parse_body(body)?;
    let kyc = state.kyc_service.create(&NewKyc::from(req)).await?;

    Ok(Json(json!({
        "statusCode": StatusCode::OK.as_u16(),
        "message": "KYC created successfully",
        "data": KycResponse::from(kyc),
    })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(merchant_id): Path<String>,
    body: std::result::Result<Json<UpdateKycRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let merchant_id = parse_merchant_id(&merchant_id)?;
    let update = KycUpdate::from(parse_body(body)?);
    let kyc = state.kyc_service.update(merchant_id, &update).await?;

    Ok(Json(json!({
        "statusCode": StatusCode::OK.as_u16(),
        "message": "KYC updated successfully",
        "panNumber": kyc.pan_number,
    })))
}

pub async fn get(
    State(state): State<AppState>,
    Path(merchant_id): Path<String>,
) -> Result<Json<Value>> {
    let merchant_id = parse_merchant_id(&merchant_id)?;
    let record = state.kyc_service.get(merchant_id).await?;

    Ok(Json(json!({
        "statusCode": StatusCode::OK.as_u16(),
        "data": KycResponse::from(record),
    })))
}
