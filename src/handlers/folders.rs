// handlers/folders.rs - /storage/folders endpoint
//
// POST carries an `action` discriminator ("create" / "delete") instead of
// separate methods; the admin frontend has always spoken this shape.

use axum::{extract::Query, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::services::storage_service::StorageService;

#[derive(Debug, Deserialize)]
pub struct FoldersQuery {
    pub user_id: Option<i32>,
}

/// GET /storage/folders?user_id=X - the user's folders, newest first
pub async fn get(Query(query): Query<FoldersQuery>) -> Result<Json<Value>, ApiError> {
    let user_id = query
        .user_id
        .ok_or_else(|| ApiError::bad_request("user_id обязателен"))?;

    let service = StorageService::new().await?;
    let folders = service.list_folders(user_id).await?;

    let body: Vec<Value> = folders
        .iter()
        .map(|folder| {
            json!({
                "id": folder.id,
                "folder_name": folder.folder_name,
                "parent_id": folder.parent_id,
                "created_at": folder.created_at,
            })
        })
        .collect();

    Ok(Json(json!({ "folders": body })))
}

#[derive(Debug, Deserialize)]
pub struct FolderActionRequest {
    pub action: Option<String>,
    pub user_id: Option<i32>,
    pub folder_name: Option<String>,
    pub parent_id: Option<i32>,
    pub folder_id: Option<i32>,
}

/// POST /storage/folders - create or delete a folder
pub async fn post(Json(body): Json<FolderActionRequest>) -> Result<Json<Value>, ApiError> {
    match body.action.as_deref() {
        Some("create") => {
            let user_id = body
                .user_id
                .ok_or_else(|| ApiError::bad_request("user_id и folder_name обязательны"))?;
            let folder_name = body
                .folder_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| ApiError::bad_request("user_id и folder_name обязательны"))?;

            let service = StorageService::new().await?;
            let folder_id = service
                .create_folder(user_id, folder_name, body.parent_id)
                .await?;

            Ok(Json(json!({
                "folder_id": folder_id,
                "message": "Папка создана",
            })))
        }
        Some("delete") => {
            let folder_id = body
                .folder_id
                .ok_or_else(|| ApiError::bad_request("folder_id обязателен"))?;

            let service = StorageService::new().await?;
            service.delete_folder(folder_id).await?;

            Ok(Json(json!({ "message": "Папка удалена" })))
        }
        _ => Err(ApiError::bad_request("Неизвестное действие")),
    }
}
