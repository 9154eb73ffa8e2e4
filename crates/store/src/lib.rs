//! SQLite lead store
//!
//! Persistent records for leads, call logs, appointments and follow-ups,
//! behind an `r2d2` connection pool with WAL mode, foreign keys and
//! embedded SQL migrations. Call-log rows are insert-only and ordered by
//! `created_at` (id as tiebreaker); appointment mutations update the
//! owning lead's denormalized fields in the same transaction.

mod appointments;
mod call_logs;
mod follow_ups;
mod leads;
mod migrations;
mod pool;

pub use appointments::{AppointmentUpdate, AppointmentWithLead};
pub use leads::{LeadUpdate, NewLead};
pub use pool::PoolSettings;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("migration {0} failed: {1}")]
    Migration(&'static str, rusqlite::Error),

    #[error("{0} {1} not found")]
    NotFound(&'static str, i64),
}

impl From<StoreError> for leadcall_core::Error {
    fn from(err: StoreError) -> Self {
        leadcall_core::Error::Store(err.to_string())
    }
}

pub(crate) type DbPool = Pool<SqliteConnectionManager>;

/// Handle to the lead store. Cheap to clone; all methods are synchronous
/// and safe to call from blocking contexts or `spawn_blocking`.
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
}

impl Store {
    /// Open (or create) the database at `path` and run pending migrations.
    /// Use `:memory:` for tests.
    pub fn open(path: &str, settings: PoolSettings) -> Result<Self, StoreError> {
        let pool = pool::create_pool(path, settings)?;
        let conn = pool.get()?;
        migrations::run_migrations(&conn)?;
        tracing::info!(path, "lead store ready");
        Ok(Self { pool })
    }

    /// In-memory store for tests. A single pooled connection so every
    /// caller sees the same database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(
            ":memory:",
            PoolSettings {
                pool_max_size: 1,
                ..PoolSettings::default()
            },
        )
    }

    pub(crate) fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, StoreError> {
        Ok(self.pool.get()?)
    }
}
