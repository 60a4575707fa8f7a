//! SQLite telemetry store implementation
//!
//! Durable backend for edge deployment. Idempotency rides on the table's
//! `(device_id, idempotency_key)` primary key: the insert is a single
//! `ON CONFLICT DO NOTHING` statement, so concurrent redeliveries of the
//! same reading serialize inside SQLite and exactly one row wins.

use crate::error::{Result, StoreError};
use crate::traits::{TelemetryStore, WriteOutcome};
use async_trait::async_trait;
use coldtrack_model::StoredPoint;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS telemetry_points (
    device_id       TEXT    NOT NULL,
    idempotency_key INTEGER NOT NULL,
    timestamp       INTEGER NOT NULL,
    temperature     REAL    NOT NULL,
    humidity        REAL,
    battery         REAL,
    latitude        REAL,
    longitude       REAL,
    rssi            INTEGER,
    created_at      TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (device_id, idempotency_key)
);
CREATE INDEX IF NOT EXISTS idx_telemetry_points_device_ts
    ON telemetry_points (device_id, timestamp);
"#;

/// SQLite-backed telemetry store
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to a SQLite database and ensure the schema exists
    ///
    /// Accepts any sqlx SQLite URL, e.g. `sqlite:coldtrack.db?mode=rwc` or
    /// `sqlite::memory:`. The pool is capped at one connection: SQLite
    /// serializes writes anyway, and an in-memory database exists per
    /// connection.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(|e| StoreError::ConnectionError(format!("{}: {}", url, e)))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        debug!(url, "SQLite telemetry store ready");
        Ok(store)
    }

    /// Wrap an existing pool (schema must already exist or is created here)
    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl TelemetryStore for SqliteStore {
    async fn insert_point(&self, point: &StoredPoint) -> Result<WriteOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO telemetry_points
                (device_id, idempotency_key, timestamp, temperature,
                 humidity, battery, latitude, longitude, rssi)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(device_id, idempotency_key) DO NOTHING
            "#,
        )
        .bind(&point.device_id)
        .bind(point.idempotency_key)
        .bind(point.timestamp)
        .bind(point.temperature)
        .bind(point.humidity)
        .bind(point.battery)
        .bind(point.latitude)
        .bind(point.longitude)
        .bind(point.rssi)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(WriteOutcome::Inserted)
        } else {
            Ok(WriteOutcome::DuplicateIgnored)
        }
    }

    async fn query_window(
        &self,
        device_id: &str,
        since: i64,
        until: i64,
    ) -> Result<Vec<StoredPoint>> {
        if since > until {
            return Err(StoreError::InvalidWindow { since, until });
        }

        let rows = sqlx::query(
            r#"
            SELECT device_id, idempotency_key, timestamp, temperature,
                   humidity, battery, latitude, longitude, rssi
            FROM telemetry_points
            WHERE device_id = ? AND timestamp BETWEEN ? AND ?
            ORDER BY timestamp ASC, idempotency_key ASC
            "#,
        )
        .bind(device_id)
        .bind(since)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        let mut points = Vec::with_capacity(rows.len());
        for row in rows {
            points.push(hydrate_point(row)?);
        }
        Ok(points)
    }

    async fn point_count(&self, device_id: &str) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM telemetry_points WHERE device_id = ?")
            .bind(device_id)
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.try_get("n")?;
        Ok(count as u64)
    }
}

/// Hydrate a row into a StoredPoint
fn hydrate_point(row: SqliteRow) -> Result<StoredPoint> {
    Ok(StoredPoint {
        device_id: row.try_get("device_id")?,
        idempotency_key: row.try_get("idempotency_key")?,
        timestamp: row.try_get("timestamp")?,
        temperature: row.try_get("temperature")?,
        humidity: row.try_get("humidity")?,
        battery: row.try_get("battery")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        rssi: row.try_get("rssi")?,
    })
}
