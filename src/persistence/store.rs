//! SQLite-based persistence store

use crate::persistence::{FlowRecord, FlowStore, LogRecord, RunRecord};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS flows (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        namespace TEXT NOT NULL,
        repository TEXT NOT NULL,
        name TEXT NOT NULL,
        tag TEXT NOT NULL,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 0,
        timeout INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE (namespace, repository, name, tag)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS flow_runs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        flow_id INTEGER NOT NULL REFERENCES flows(id),
        number INTEGER NOT NULL,
        status TEXT NOT NULL,
        started_at TEXT NOT NULL,
        ended_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_flow_runs_flow ON flow_runs(flow_id)",
    r#"
    CREATE TABLE IF NOT EXISTS flow_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        flow_id INTEGER NOT NULL,
        level TEXT NOT NULL,
        message TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_flow_logs_flow ON flow_logs(flow_id)",
];

/// SQLite flow store
pub struct SqliteFlowStore {
    pool: SqlitePool,
}

impl SqliteFlowStore {
    /// Open (creating if needed) a store at `db_path`; ":memory:" for a private in-memory database
    pub async fn new(db_path: &str) -> Result<Self> {
        let (options, max_connections) = if db_path == ":memory:" {
            // Every connection to :memory: is its own database
            (SqliteConnectOptions::from_str("sqlite::memory:")?, 1)
        } else {
            (
                SqliteConnectOptions::new()
                    .filename(db_path)
                    .create_if_missing(true),
                5,
            )
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Create store with default path
    pub async fn with_default_path() -> Result<Self> {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let db_dir = data_dir.join("devflow");
        std::fs::create_dir_all(&db_dir)?;

        let db_path = db_dir.join("flows.db");
        let db_path = db_path
            .to_str()
            .ok_or_else(|| anyhow!("database path is not valid UTF-8: {}", db_path.display()))?;
        Self::new(db_path).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to initialize schema")?;
        }
        Ok(())
    }

    fn run_from_row(row: &SqliteRow) -> Result<RunRecord> {
        let status: String = row.try_get("status")?;
        Ok(RunRecord {
            flow_id: row.try_get("flow_id")?,
            number: row.try_get("number")?,
            status: status.parse().map_err(|e: String| anyhow!(e))?,
            started_at: row.try_get::<DateTime<Utc>, _>("started_at")?,
            ended_at: row.try_get::<DateTime<Utc>, _>("ended_at")?,
        })
    }
}

#[async_trait::async_trait]
impl FlowStore for SqliteFlowStore {
    async fn put_flow(&self, flow: &FlowRecord) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO flows (namespace, repository, name, tag, title, content, version, timeout)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (namespace, repository, name, tag) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                version = excluded.version,
                timeout = excluded.timeout,
                updated_at = datetime('now')
            RETURNING id
            "#,
        )
        .bind(&flow.namespace)
        .bind(&flow.repository)
        .bind(&flow.name)
        .bind(&flow.tag)
        .bind(&flow.title)
        .bind(&flow.content)
        .bind(flow.version)
        .bind(flow.timeout)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save flow")?;

        Ok(row.try_get("id")?)
    }

    async fn find_flow(
        &self,
        namespace: &str,
        repository: &str,
        name: &str,
        tag: &str,
    ) -> Result<Option<i64>> {
        let row = sqlx::query(
            r#"
            SELECT id FROM flows
            WHERE namespace = ?1 AND repository = ?2 AND name = ?3 AND tag = ?4
            "#,
        )
        .bind(namespace)
        .bind(repository)
        .bind(name)
        .bind(tag)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find flow")?;

        row.map(|r| r.try_get("id")).transpose().map_err(Into::into)
    }

    async fn run_count(&self, flow_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS runs FROM flow_runs WHERE flow_id = ?1")
            .bind(flow_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count runs")?;

        Ok(row.try_get("runs")?)
    }

    async fn put_run(&self, run: &RunRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO flow_runs (flow_id, number, status, started_at, ended_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(run.flow_id)
        .bind(run.number)
        .bind(run.status.as_str())
        .bind(run.started_at)
        .bind(run.ended_at)
        .execute(&self.pool)
        .await
        .context("Failed to save run")?;

        Ok(())
    }

    async fn list_runs(&self, flow_id: i64) -> Result<Vec<RunRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT flow_id, number, status, started_at, ended_at
            FROM flow_runs
            WHERE flow_id = ?1
            ORDER BY number DESC
            "#,
        )
        .bind(flow_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list runs")?;

        rows.iter().map(Self::run_from_row).collect()
    }

    async fn append_log(&self, log: &LogRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO flow_logs (flow_id, level, message, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(log.flow_id)
        .bind(&log.level)
        .bind(&log.message)
        .bind(log.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to append log")?;

        Ok(())
    }
}
