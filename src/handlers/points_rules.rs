// handlers/points_rules.rs - /points-rules endpoint (catalog, accrual, overrides)

use axum::{extract::Query, response::Json};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::services::points_service::PointsService;

#[derive(Debug, Deserialize)]
pub struct RulesQuery {
    pub org_id: Option<i32>,
}

/// GET /points-rules - full rule catalog
/// GET /points-rules?org_id=X - active rules with the org's overrides merged
pub async fn get(Query(query): Query<RulesQuery>) -> Result<Json<Value>, ApiError> {
    let service = PointsService::new().await?;

    if let Some(org_id) = query.org_id {
        let rules = service.list_rules_for_org(org_id).await?;

        let body: Vec<Value> = rules
            .iter()
            .map(|rule| {
                json!({
                    "id": rule.id,
                    "rule_name": rule.rule_name,
                    "action_type": rule.action_type,
                    "points_amount": rule.points_amount.to_f64().unwrap_or(0.0),
                    "description": rule.description,
                    "is_active": rule.is_active,
                    // Defaults mirror accrual semantics: enabled with a
                    // neutral multiplier until an override says otherwise
                    "org_enabled": rule.org_enabled.unwrap_or(true),
                    "org_multiplier": rule
                        .org_multiplier
                        .and_then(|m| m.to_f64())
                        .unwrap_or(1.0),
                    "org_rule_id": rule.org_rule_id,
                })
            })
            .collect();

        return Ok(Json(json!(body)));
    }

    let rules = service.list_rules().await?;
    let body: Vec<Value> = rules
        .iter()
        .map(|rule| {
            json!({
                "id": rule.id,
                "rule_name": rule.rule_name,
                "action_type": rule.action_type,
                "points_amount": rule.points_amount.to_f64().unwrap_or(0.0),
                "description": rule.description,
                "is_active": rule.is_active,
                "created_at": rule.created_at,
            })
        })
        .collect();

    Ok(Json(json!(body)))
}

#[derive(Debug, Deserialize)]
pub struct AccrualRequest {
    pub org_id: Option<i32>,
    pub action_type: Option<String>,
    pub user_id: Option<i32>,
}

/// POST /points-rules - trigger rule-based accrual for an action
pub async fn post(Json(body): Json<AccrualRequest>) -> Result<Json<Value>, ApiError> {
    let (Some(org_id), Some(action_type)) = (body.org_id, body.action_type.as_deref()) else {
        return Err(ApiError::bad_request("org_id и action_type обязательны"));
    };

    let service = PointsService::new().await?;
    let outcome = service
        .apply_rule_accrual(org_id, action_type, body.user_id)
        .await?;

    let mut response = json!({
        "message": outcome.message,
        "points_added": outcome.points_added.to_f64().unwrap_or(0.0),
    });
    if let Some(rule_name) = outcome.rule_name {
        response["rule_name"] = json!(rule_name);
    }

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    pub org_id: Option<i32>,
    pub rule_id: Option<i32>,
    pub is_enabled: Option<bool>,
    pub multiplier: Option<f64>,
}

/// PUT /points-rules - upsert an organization's rule override
pub async fn put(Json(body): Json<OverrideRequest>) -> Result<Json<Value>, ApiError> {
    let (Some(org_id), Some(rule_id)) = (body.org_id, body.rule_id) else {
        return Err(ApiError::bad_request("org_id и rule_id обязательны"));
    };

    let multiplier = match body.multiplier {
        Some(m) => Decimal::from_f64_retain(m)
            .ok_or_else(|| ApiError::bad_request("multiplier некорректен"))?,
        None => Decimal::ONE,
    };

    let service = PointsService::new().await?;
    service
        .set_rule_override(org_id, rule_id, body.is_enabled.unwrap_or(true), multiplier)
        .await?;

    Ok(Json(json!({ "message": "Настройки правила обновлены" })))
}
