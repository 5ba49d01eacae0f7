//! # Schema Migrations
//!
//! SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied in filename order the first time a pool opens. sqlx records each
//! applied file (with its checksum) in `_sqlx_migrations`, so editing a file
//! that already shipped makes every existing ledger refuse to open. Add a
//! new `NNN_what_changed.sql` instead.
//!
//! | File                     | Creates                                    |
//! |--------------------------|--------------------------------------------|
//! | `001_initial_schema.sql` | `inventory`, `sales`, `sale_items`, `expenses` |

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies pending migrations, each in its own transaction. A no-op on an
/// up-to-date ledger.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Checking ledger schema");
    MIGRATOR.run(pool).await?;
    info!("Ledger schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn rerunning_migrations_is_a_no_op() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        run_migrations(db.pool()).await.unwrap();

        let (embedded, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(embedded, applied);
        assert!(embedded >= 1);
    }
}
