mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn upload_requires_multipart_content_type() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/upload-file", server.base_url))
        .header("Content-Type", "application/json")
        .body("{}")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Требуется multipart/form-data");
    Ok(())
}

#[tokio::test]
async fn upload_requires_boundary() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/upload-file", server.base_url))
        .header("Content-Type", "multipart/form-data")
        .body("irrelevant")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Отсутствует boundary");
    Ok(())
}

#[tokio::test]
async fn upload_requires_file_and_folder_fields() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // A file part without the folder_id field
    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(vec![1u8, 2, 3]).file_name("data.bin"),
    );

    let res = client
        .post(format!("{}/upload-file", server.base_url))
        .multipart(form)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Отсутствует file, folder_id или filename");
    Ok(())
}

#[tokio::test]
async fn upload_rejects_text_only_form() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().text("folder_id", "42");

    let res = client
        .post(format!("{}/upload-file", server.base_url))
        .multipart(form)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn folders_get_requires_user_id() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/storage/folders", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "user_id обязателен");
    Ok(())
}

#[tokio::test]
async fn folders_post_rejects_unknown_action() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/storage/folders", server.base_url))
        .json(&json!({ "action": "rename", "folder_id": 1 }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Неизвестное действие");
    Ok(())
}

#[tokio::test]
async fn folders_create_requires_name() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/storage/folders", server.base_url))
        .json(&json!({ "action": "create", "user_id": 7, "folder_name": "   " }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
