use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{InspectionId, UserId},
    inspection::{HistoryScope, InspectionDraft, SavedInspection, SavedRef},
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn read_value(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT value FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read kv entry '{key}'"))?;
        Ok(row.map(|r| r.get::<Vec<u8>, _>(0)))
    }

    pub async fn write_value(&self, key: &str, value: &[u8]) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write kv entry '{key}'"))?;
        Ok(())
    }

    pub async fn delete_value(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete kv entry '{key}'"))?;
        Ok(())
    }

    pub async fn insert_inspection(
        &self,
        draft: &InspectionDraft,
        saved_by: &UserId,
        org_owner: &UserId,
    ) -> Result<SavedRef> {
        let id = InspectionId::generate();
        let date = Utc::now();
        let body = serde_json::to_string(draft).context("failed to encode inspection body")?;
        sqlx::query(
            "INSERT INTO inspections (id, saved_by, org_owner, body, date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(saved_by.as_str())
        .bind(org_owner.as_str())
        .bind(body)
        .bind(date)
        .bind(date)
        .bind(date)
        .execute(&self.pool)
        .await
        .context("failed to insert inspection")?;
        Ok(SavedRef { id, date })
    }

    /// Rewrites the body of an existing record. Its `date` and owner stay as first saved.
    pub async fn update_inspection(&self, id: &InspectionId, draft: &InspectionDraft) -> Result<()> {
        let body = serde_json::to_string(draft).context("failed to encode inspection body")?;
        let result = sqlx::query("UPDATE inspections SET body = ?, updated_at = ? WHERE id = ?")
            .bind(body)
            .bind(Utc::now())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to update inspection {id}"))?;
        if result.rows_affected() == 0 {
            return Err(anyhow!("inspection {id} not found"));
        }
        Ok(())
    }

    pub async fn load_inspection(&self, id: &InspectionId) -> Result<Option<SavedInspection>> {
        let row = sqlx::query(
            "SELECT id, saved_by, body, date, created_at FROM inspections WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load inspection {id}"))?;
        row.map(|r| saved_inspection_from_row(&r)).transpose()
    }

    pub async fn list_inspections(&self, scope: &HistoryScope) -> Result<Vec<SavedInspection>> {
        let rows = match scope {
            HistoryScope::User(user_id) => {
                sqlx::query(
                    "SELECT id, saved_by, body, date, created_at FROM inspections
                     WHERE saved_by = ? ORDER BY date DESC",
                )
                .bind(user_id.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            HistoryScope::Organization(owner_id) => {
                sqlx::query(
                    "SELECT id, saved_by, body, date, created_at FROM inspections
                     WHERE org_owner = ? ORDER BY date DESC",
                )
                .bind(owner_id.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            HistoryScope::All => {
                sqlx::query(
                    "SELECT id, saved_by, body, date, created_at FROM inspections
                     ORDER BY date DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(saved_inspection_from_row).collect()
    }
}

fn saved_inspection_from_row(row: &SqliteRow) -> Result<SavedInspection> {
    let id = InspectionId(row.try_get::<String, _>("id")?);
    let body: String = row.try_get("body")?;
    let data: InspectionDraft = serde_json::from_str(&body)
        .with_context(|| format!("stored inspection {id} has an unreadable body"))?;
    Ok(SavedInspection {
        saved_by: UserId(row.try_get::<String, _>("saved_by")?),
        date: row.try_get::<DateTime<Utc>, _>("date")?,
        created_at: Some(row.try_get::<DateTime<Utc>, _>("created_at")?),
        id,
        data,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
