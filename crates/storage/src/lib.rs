use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{OrderId, ScanRecord},
    store::ScanStore,
};

/// SQLite-backed scan ledger. The schema is a flat table keyed by order id;
/// a repeated save for the same order replaces the earlier row.
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
        let storage = Self { pool };
        storage.ensure_scan_table().await?;
        Ok(storage)
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

    async fn ensure_scan_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scan_records (
                order_id   INTEGER PRIMARY KEY,
                invoice_no TEXT NOT NULL,
                scanned_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure scan_records table exists")?;
        Ok(())
    }
}

#[async_trait]
impl ScanStore for Storage {
    async fn load_scans(&self, batch_ids: &[OrderId]) -> Result<Vec<ScanRecord>> {
        if batch_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; batch_ids.len()].join(", ");
        let sql = format!(
            "SELECT order_id, invoice_no, scanned_at FROM scan_records WHERE order_id IN ({placeholders})",
        );
        let mut query = sqlx::query(&sql);
        for id in batch_ids {
            query = query.bind(id.0);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|r| ScanRecord {
                order_id: OrderId(r.get::<i64, _>(0)),
                invoice_no: r.get::<String, _>(1),
                scanned_at: r.get::<DateTime<Utc>, _>(2),
            })
            .collect())
    }

    async fn save_scan(&self, order_id: OrderId, invoice_no: &str) -> Result<ScanRecord> {
        let scanned_at = Utc::now();
        sqlx::query(
            "INSERT INTO scan_records (order_id, invoice_no, scanned_at) VALUES (?, ?, ?)
             ON CONFLICT(order_id) DO UPDATE SET
                invoice_no = excluded.invoice_no,
                scanned_at = excluded.scanned_at",
        )
        .bind(order_id.0)
        .bind(invoice_no)
        .bind(scanned_at)
        .execute(&self.pool)
        .await?;

        Ok(ScanRecord {
            order_id,
            invoice_no: invoice_no.to_string(),
            scanned_at,
        })
    }

    async fn clear_scans(&self, batch_ids: Option<&[OrderId]>) -> Result<u64> {
        let affected = match batch_ids {
            None => {
                sqlx::query("DELETE FROM scan_records")
                    .execute(&self.pool)
                    .await?
                    .rows_affected()
            }
            Some([]) => 0,
            Some(ids) => {
                let placeholders = vec!["?"; ids.len()].join(", ");
                let sql =
                    format!("DELETE FROM scan_records WHERE order_id IN ({placeholders})");
                let mut query = sqlx::query(&sql);
                for id in ids {
                    query = query.bind(id.0);
                }
                query.execute(&self.pool).await?.rows_affected()
            }
        };
        Ok(affected)
    }
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
