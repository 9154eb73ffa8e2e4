//! Embedded SQL migration runner
//!
//! Migrations are compiled into the binary via `include_str!` and run
//! sequentially on startup, tracked by the `_leadcall_migrations` table.
//! Each migration runs exactly once.

use rusqlite::Connection;

use crate::StoreError;

struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. New migrations are appended here.
const MIGRATIONS: &[Migration] = &[Migration {
    name: "000_init",
    sql: include_str!("migrations/000_init.sql"),
}];

pub(crate) fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _leadcall_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;

    for migration in MIGRATIONS {
        let applied: bool = conn
            .query_row(
                "SELECT 1 FROM _leadcall_migrations WHERE name = ?1",
                [migration.name],
                |_| Ok(true),
            )
            .unwrap_or(false);
        if applied {
            continue;
        }

        conn.execute_batch(migration.sql)
            .map_err(|e| StoreError::Migration(migration.name, e))?;
        conn.execute(
            "INSERT INTO _leadcall_migrations (name, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.name, chrono::Utc::now()],
        )?;
        tracing::debug!(migration = migration.name, "applied migration");
    }

    Ok(())
}
