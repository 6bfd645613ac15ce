mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

// These tests exercise the validation layer, which runs before any database
// access, so they hold with or without a live Postgres behind the server.

#[tokio::test]
async fn points_get_requires_org_id() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/points", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "org_id обязателен");
    Ok(())
}

#[tokio::test]
async fn points_post_requires_org_id() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/points", server.base_url))
        .json(&json!({ "points_amount": 10 }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn points_put_requires_enablement_flag() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .put(format!("{}/points", server.base_url))
        .json(&json!({ "org_id": 1 }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "is_enabled обязателен");
    Ok(())
}

#[tokio::test]
async fn points_rejects_unsupported_method() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .delete(format!("{}/points", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}

#[tokio::test]
async fn accrual_requires_org_and_action_type() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/points-rules", server.base_url))
        .json(&json!({ "org_id": 1 }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "org_id и action_type обязательны");
    Ok(())
}

#[tokio::test]
async fn override_upsert_requires_rule_id() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .put(format!("{}/points-rules", server.base_url))
        .json(&json!({ "org_id": 1, "multiplier": 2.0 }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

// The remaining tests drive the ledger itself and need Postgres behind the
// server; they skip themselves when /health reports a degraded state.

#[tokio::test]
async fn balance_record_creation_is_idempotent() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::database_available(server).await {
        return Ok(());
    }
    let client = reqwest::Client::new();
    let org_id = common::fresh_org_id();
    let url = format!("{}/points?org_id={}", server.base_url, org_id);

    let first = client.get(&url).send().await?.json::<serde_json::Value>().await?;
    let second = client.get(&url).send().await?.json::<serde_json::Value>().await?;

    // Both calls see the same lazily-created row, zeroed and disabled
    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["points_balance"], 0.0);
    assert_eq!(second["total_earned"], 0.0);
    assert_eq!(second["total_spent"], 0.0);
    assert_eq!(second["is_enabled"], false);
    Ok(())
}

#[tokio::test]
async fn debit_guard_rejects_overdraft_and_leaves_ledger_untouched() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::database_available(server).await {
        return Ok(());
    }
    let client = reqwest::Client::new();
    let org_id = common::fresh_org_id();

    let res = client
        .post(format!("{}/points", server.base_url))
        .json(&json!({
            "org_id": org_id,
            "points_amount": 5.0,
            "operation_type": "manual",
            "description": "пополнение"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Overdraft: balance is 5, debit of 10 must be rejected outright
    let res = client
        .post(format!("{}/points", server.base_url))
        .json(&json!({ "org_id": org_id, "points_amount": -10.0 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Недостаточно баллов");

    let balance = client
        .get(format!("{}/points?org_id={}", server.base_url, org_id))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(balance["points_balance"], 5.0);
    assert_eq!(balance["total_spent"], 0.0);

    // The failed debit must not leave a ledger entry either
    let history = client
        .get(format!("{}/points?org_id={}&history=true", server.base_url, org_id))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    let entries = history.as_array().expect("history array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["points_amount"], 5.0);
    Ok(())
}

#[tokio::test]
async fn balance_equals_signed_history_sum() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::database_available(server).await {
        return Ok(());
    }
    let client = reqwest::Client::new();
    let org_id = common::fresh_org_id();

    for amount in [30.0, -12.5, 7.0] {
        let res = client
            .post(format!("{}/points", server.base_url))
            .json(&json!({ "org_id": org_id, "points_amount": amount }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK, "adjustment {} failed", amount);
    }

    let balance = client
        .get(format!("{}/points?org_id={}", server.base_url, org_id))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    assert_eq!(balance["points_balance"], 24.5);
    assert_eq!(balance["total_earned"], 37.0);
    assert_eq!(balance["total_spent"], 12.5);

    let history = client
        .get(format!("{}/points?org_id={}&history=true", server.base_url, org_id))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    let replayed: f64 = history
        .as_array()
        .expect("history array")
        .iter()
        .map(|entry| entry["points_amount"].as_f64().unwrap_or(0.0))
        .sum();
    assert!((replayed - 24.5).abs() < 1e-9, "history sum {} != balance", replayed);
    Ok(())
}

#[tokio::test]
async fn cors_preflight_is_answered() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .request(reqwest::Method::OPTIONS, format!("{}/points", server.base_url))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("access-control-allow-origin"));
    Ok(())
}
