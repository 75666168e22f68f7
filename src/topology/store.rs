// topology/store.rs — SQLite-backed NUMA topology record store.

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, ConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};

// ─── Row ──────────────────────────────────────────────────────────────────────

/// One row of `numa_topologies` — the durable record for a resource provider.
///
/// The two producer columns each hold a JSON-encoded `ProducerTopology`
/// document, or NULL when that producer has never reported. `uuid` never
/// changes after creation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NumaTopologyRow {
    pub id: i64,
    pub uuid: String,
    pub nova_numa_topology: Option<String>,
    pub zun_numa_topology: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Typed failures raised by the store. Callers map these to boundary
/// outcomes; the store itself never logs or retries.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no NUMA topology record for resource provider {uuid}")]
    NotFound { uuid: String },
    #[error("a NUMA topology record already exists for resource provider {uuid}")]
    AlreadyExists { uuid: String },
    #[error("concurrent update detected for resource provider {uuid}")]
    Conflict { uuid: String },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

// ─── TopologyStore ────────────────────────────────────────────────────────────

/// Durable mapping from resource-provider uuid to a topology record, with
/// independent per-producer field updates.
#[derive(Clone)]
pub struct TopologyStore {
    pool: SqlitePool,
}

impl TopologyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the on-disk database under `data_dir` and
    /// run the migration.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding it
    /// are logged at WARN level. Set to 0 to disable slow-query logging.
    pub async fn open(data_dir: &Path, slow_query_ms: u64) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("numad.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            opts = opts.log_slow_statements(
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS numa_topologies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uuid TEXT NOT NULL UNIQUE,
                nova_numa_topology TEXT,
                zun_numa_topology TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_numa_topologies_uuid ON numa_topologies(uuid);
            ",
        )
        .execute(&self.pool)
        .await
        .context("Creating numa_topologies table")?;
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Fetch the record for a resource provider.
    pub async fn get(&self, uuid: &str) -> Result<NumaTopologyRow, StoreError> {
        sqlx::query_as("SELECT * FROM numa_topologies WHERE uuid = ?")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                uuid: uuid.to_string(),
            })
    }

    // ── Mutation ──────────────────────────────────────────────────────────────

    /// Insert a new record with whichever producer payloads are supplied.
    ///
    /// The payloads are already-encoded `ProducerTopology` JSON documents;
    /// `None` leaves the column NULL (producer has not reported).
    pub async fn create(
        &self,
        uuid: &str,
        nova_numa_topology: Option<&str>,
        zun_numa_topology: Option<&str>,
    ) -> Result<NumaTopologyRow, StoreError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO numa_topologies
                 (uuid, nova_numa_topology, zun_numa_topology, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(nova_numa_topology)
        .bind(zun_numa_topology)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::AlreadyExists {
                uuid: uuid.to_string(),
            },
            _ => StoreError::Database(e),
        })?;
        self.get(uuid).await
    }

    /// Persist nova's payload only, leaving zun's column untouched.
    pub async fn update_nova(&self, uuid: &str, payload: &str) -> Result<(), StoreError> {
        self.update_column("nova_numa_topology", uuid, payload).await
    }

    /// Persist zun's payload only, leaving nova's column untouched.
    pub async fn update_zun(&self, uuid: &str, payload: &str) -> Result<(), StoreError> {
        self.update_column("zun_numa_topology", uuid, payload).await
    }

    async fn update_column(
        &self,
        column: &'static str,
        uuid: &str,
        payload: &str,
    ) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        // `column` is one of two static identifiers, never caller input.
        let sql = format!("UPDATE numa_topologies SET {column} = ?, updated_at = ? WHERE uuid = ?");
        let result = sqlx::query(&sql)
            .bind(payload)
            .bind(&now)
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                uuid: uuid.to_string(),
            });
        }
        Ok(())
    }

    /// Delete the record for a resource provider.
    ///
    /// `expected_updated_at` is the `updated_at` value captured when the
    /// caller loaded the record. If the record changed in between, the delete
    /// matches zero rows and fails with `Conflict`, leaving the record in
    /// place.
    pub async fn delete(&self, uuid: &str, expected_updated_at: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let affected = sqlx::query("DELETE FROM numa_topologies WHERE uuid = ? AND updated_at = ?")
            .bind(uuid)
            .bind(expected_updated_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if affected == 0 {
            let survivor: Option<(i64,)> =
                sqlx::query_as("SELECT id FROM numa_topologies WHERE uuid = ?")
                    .bind(uuid)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;
            return Err(if survivor.is_some() {
                StoreError::Conflict {
                    uuid: uuid.to_string(),
                }
            } else {
                StoreError::NotFound {
                    uuid: uuid.to_string(),
                }
            });
        }
        tx.commit().await?;
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
