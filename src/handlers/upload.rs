// handlers/upload.rs - POST /upload-file
//
// The body arrives as raw bytes and goes through the in-house multipart
// decoder; required fields are validated before any database work.

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::Json;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::multipart::{self, Part};
use crate::services::storage_service::StorageService;

pub async fn post(headers: HeaderMap, body: Bytes) -> Result<Json<Value>, ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if !content_type
        .to_ascii_lowercase()
        .contains("multipart/form-data")
    {
        return Err(ApiError::bad_request("Требуется multipart/form-data"));
    }

    let boundary = multipart::boundary_from_content_type(content_type)
        .ok_or_else(|| ApiError::bad_request("Отсутствует boundary"))?;

    let mut parts = multipart::parse(&body, &boundary);

    let folder_id: Option<i32> = parts
        .get("folder_id")
        .and_then(Part::as_text)
        .and_then(|raw| raw.trim().parse().ok());

    let file = match parts.remove("file") {
        Some(Part::File { filename, data }) if !filename.is_empty() => Some((filename, data)),
        _ => None,
    };

    let (Some(folder_id), Some((file_name, data))) = (folder_id, file) else {
        return Err(ApiError::bad_request("Отсутствует file, folder_id или filename"));
    };

    let service = StorageService::new().await?;
    let stored = service.store_file(folder_id, &file_name, data).await?;

    Ok(Json(json!({
        "file_id": stored.file_id,
        "file_url": stored.file_url,
        "message": "Файл загружен",
    })))
}
