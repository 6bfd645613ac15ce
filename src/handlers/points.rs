// handlers/points.rs - /points endpoint (balance, history, enablement)

use axum::{extract::Query, response::Json};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::config;
use crate::error::ApiError;
use crate::services::points_service::PointsService;

#[derive(Debug, Deserialize)]
pub struct PointsQuery {
    pub org_id: Option<i32>,
    pub history: Option<bool>,
}

/// GET /points?org_id=X - balance (creates a zeroed record if absent)
/// GET /points?org_id=X&history=true - recent history, newest first
pub async fn get(Query(query): Query<PointsQuery>) -> Result<Json<Value>, ApiError> {
    let org_id = query
        .org_id
        .ok_or_else(|| ApiError::bad_request("org_id обязателен"))?;

    let service = PointsService::new().await?;

    if query.history.unwrap_or(false) {
        let entries = service
            .list_history(org_id, config().api.history_limit)
            .await?;

        let body: Vec<Value> = entries
            .iter()
            .map(|entry| {
                json!({
                    "id": entry.id,
                    "points_amount": entry.points_amount.to_f64().unwrap_or(0.0),
                    "operation_type": entry.operation_type,
                    "description": entry.description,
                    "created_at": entry.created_at,
                })
            })
            .collect();

        return Ok(Json(json!(body)));
    }

    let balance = service.get_or_create_balance(org_id).await?;
    Ok(Json(json!({
        "id": balance.id,
        "points_balance": balance.points_balance.to_f64().unwrap_or(0.0),
        "total_earned": balance.total_earned.to_f64().unwrap_or(0.0),
        "total_spent": balance.total_spent.to_f64().unwrap_or(0.0),
        "is_enabled": balance.is_enabled,
        "created_at": balance.created_at,
        "updated_at": balance.updated_at,
    })))
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentRequest {
    pub org_id: Option<i32>,
    #[serde(default)]
    pub points_amount: f64,
    pub operation_type: Option<String>,
    pub description: Option<String>,
}

/// POST /points - manual credit or debit with an audit trail entry
pub async fn post(Json(body): Json<AdjustmentRequest>) -> Result<Json<Value>, ApiError> {
    let org_id = body
        .org_id
        .ok_or_else(|| ApiError::bad_request("org_id обязателен"))?;
    let amount = Decimal::from_f64_retain(body.points_amount)
        .ok_or_else(|| ApiError::bad_request("points_amount некорректен"))?;

    let service = PointsService::new().await?;
    let new_balance = service
        .apply_manual_adjustment(
            org_id,
            amount,
            body.operation_type.as_deref().unwrap_or("manual"),
            body.description.as_deref().unwrap_or(""),
        )
        .await?;

    Ok(Json(json!({
        "message": "Баллы обновлены",
        "new_balance": new_balance.to_f64().unwrap_or(0.0),
    })))
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub org_id: Option<i32>,
    pub is_enabled: Option<bool>,
}

/// PUT /points - switch the points system on or off for an organization
pub async fn put(Json(body): Json<ToggleRequest>) -> Result<Json<Value>, ApiError> {
    let org_id = body
        .org_id
        .ok_or_else(|| ApiError::bad_request("org_id обязателен"))?;
    let is_enabled = body
        .is_enabled
        .ok_or_else(|| ApiError::bad_request("is_enabled обязателен"))?;

    let service = PointsService::new().await?;
    service.set_points_enabled(org_id, is_enabled).await?;

    Ok(Json(json!({ "message": "Настройки баллов обновлены" })))
}
