use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User-owned folder (`admin.storage_folders`), optionally nested via
/// `parent_id`. Deleting a folder cascades to its files.
#[derive(Debug, Clone, FromRow)]
pub struct StorageFolder {
    pub id: i32,
    pub folder_name: String,
    pub parent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Stored file metadata (`admin.storage_files`). `file_url` is either an
/// object-store address or an inline base64 data URL.
#[derive(Debug, Clone, FromRow)]
pub struct StorageFile {
    pub id: i32,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
}
