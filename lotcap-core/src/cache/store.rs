//! SQLite-backed parameter cache store
//!
//! One table, keyed by (jurisdiction, district), holding the serialized
//! parameter set and its last-verified timestamp. The store is consulted
//! before any expensive extraction is attempted; rows are replaced whole
//! (INSERT OR REPLACE), never partially written.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::model::{DistrictKey, ZoningParameterSet};
use crate::Result;

pub struct CacheStore {
    pool: SqlitePool,
}

impl CacheStore {
    /// Open (creating if needed) a file-backed store
    pub async fn open(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        if newly_created {
            info!("Initialized new parameter cache: {}", db_path.display());
        } else {
            info!("Opened existing parameter cache: {}", db_path.display());
        }

        // WAL allows concurrent readers alongside the single writer
        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    /// Connect to an arbitrary SQLite URL (tests use `sqlite::memory:`)
    pub async fn connect(url: &str) -> Result<Self> {
        // A single connection: in-memory databases exist per connection
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS zoning_parameter_cache (
                jurisdiction TEXT NOT NULL,
                district TEXT NOT NULL,
                params TEXT NOT NULL,
                last_verified TEXT NOT NULL,
                PRIMARY KEY (jurisdiction, district)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Index for staleness sweeps
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_zoning_parameter_cache_last_verified \
             ON zoning_parameter_cache(last_verified)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Exact-match lookup. A corrupt row is removed and reported as a miss
    /// rather than poisoning every future lookup for the key.
    pub async fn get(
        &self,
        key: &DistrictKey,
    ) -> Result<Option<(ZoningParameterSet, DateTime<Utc>)>> {
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT params, last_verified FROM zoning_parameter_cache \
             WHERE jurisdiction = ? AND district = ?",
        )
        .bind(&key.jurisdiction)
        .bind(&key.district)
        .fetch_optional(&self.pool)
        .await?;

        let Some((params_json, last_verified_raw)) = row else {
            return Ok(None);
        };

        let params: ZoningParameterSet = match serde_json::from_str(&params_json) {
            Ok(params) => params,
            Err(e) => {
                warn!("Corrupt cached parameters for {}: {}, discarding", key, e);
                self.remove(key).await?;
                return Ok(None);
            }
        };
        let last_verified = match DateTime::parse_from_rfc3339(&last_verified_raw) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                warn!("Corrupt last_verified for {}: {}, discarding", key, e);
                self.remove(key).await?;
                return Ok(None);
            }
        };

        Ok(Some((params, last_verified)))
    }

    /// Write or re-verify an entry. The row is swapped atomically and the
    /// timestamp refreshed to now.
    pub async fn upsert(&self, params: &ZoningParameterSet) -> Result<()> {
        let payload = serde_json::to_string(params)?;
        sqlx::query(
            "INSERT OR REPLACE INTO zoning_parameter_cache \
             (jurisdiction, district, params, last_verified) VALUES (?, ?, ?, ?)",
        )
        .bind(&params.jurisdiction)
        .bind(&params.district)
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &DistrictKey) -> Result<()> {
        sqlx::query(
            "DELETE FROM zoning_parameter_cache WHERE jurisdiction = ? AND district = ?",
        )
        .bind(&key.jurisdiction)
        .bind(&key.district)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete entries last verified before the cutoff; returns rows removed
    pub async fn prune_stale(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM zoning_parameter_cache WHERE last_verified < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
