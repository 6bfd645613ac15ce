//! User file storage: folders plus uploaded file payloads.
//!
//! Files live under folders; deleting a folder removes its files in the
//! same transaction. Payload bytes are either addressed in an external
//! object store (when configured) or inlined into the database as a base64
//! data URL, with a size ceiling on the inline path only.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sqlx::{PgPool, Row};
use thiserror::Error;
use tracing::info;

use crate::config::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::storage::StorageFolder;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Папка не найдена")]
    FolderNotFound,

    #[error("Папка с таким именем уже существует")]
    DuplicateFolder,

    #[error("Файл превышает допустимый размер ({0} байт)")]
    FileTooLarge(usize),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_id: i32,
    pub file_url: String,
}

/// Build the inline data-URL representation of a payload.
pub fn build_data_url(mime: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(data))
}

/// Guess a MIME type from the file name extension.
pub fn guess_mime(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .to_string()
}

pub struct StorageService {
    pool: PgPool,
}

impl StorageService {
    pub async fn new() -> Result<Self, StorageError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn create_folder(
        &self,
        user_id: i32,
        folder_name: &str,
        parent_id: Option<i32>,
    ) -> Result<i32, StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO admin.storage_folders (user_id, folder_name, parent_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(folder_name)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.try_get("id")?),
            Err(sqlx::Error::Database(ref db)) if db.is_unique_violation() => {
                Err(StorageError::DuplicateFolder)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_folders(&self, user_id: i32) -> Result<Vec<StorageFolder>, StorageError> {
        let rows = sqlx::query_as::<_, StorageFolder>(
            r#"
            SELECT id, folder_name, parent_id, created_at
            FROM admin.storage_folders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete a folder and everything in it, atomically.
    pub async fn delete_folder(&self, folder_id: i32) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> =
            sqlx::query_scalar("SELECT id FROM admin.storage_folders WHERE id = $1")
                .bind(folder_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(StorageError::FolderNotFound);
        }

        sqlx::query("DELETE FROM admin.storage_files WHERE folder_id = $1")
            .bind(folder_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM admin.storage_folders WHERE id = $1")
            .bind(folder_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn folder_exists(&self, folder_id: i32) -> Result<bool, StorageError> {
        let exists: Option<i32> =
            sqlx::query_scalar("SELECT id FROM admin.storage_folders WHERE id = $1")
                .bind(folder_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(exists.is_some())
    }

    /// Persist an uploaded payload into a folder.
    ///
    /// With an object store configured the payload is addressed under its
    /// base URL; otherwise the bytes are inlined as a data URL, subject to
    /// the configured ceiling.
    pub async fn store_file(
        &self,
        folder_id: i32,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<StoredFile, StorageError> {
        if !self.folder_exists(folder_id).await? {
            return Err(StorageError::FolderNotFound);
        }

        let file_type = guess_mime(file_name);
        let file_size = data.len() as i64;

        let storage = &config().storage;
        let file_url = match &storage.object_store_url {
            Some(base) => format!("{}/{}/{}", base.trim_end_matches('/'), folder_id, file_name),
            None => {
                if data.len() > storage.inline_max_bytes {
                    return Err(StorageError::FileTooLarge(storage.inline_max_bytes));
                }
                build_data_url(&file_type, &data)
            }
        };

        let row = sqlx::query(
            r#"
            INSERT INTO admin.storage_files (folder_id, file_name, file_url, file_size, file_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(folder_id)
        .bind(file_name)
        .bind(&file_url)
        .bind(file_size)
        .bind(&file_type)
        .fetch_one(&self.pool)
        .await?;

        let file_id: i32 = row.try_get("id")?;
        info!(folder_id, file_name, file_size, %file_type, "file stored");

        Ok(StoredFile { file_id, file_url })
    }
}
