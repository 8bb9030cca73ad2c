/// Database migration runner
///
/// Runs schema migrations embedded from the `migrations/` directory at the
/// crate root using sqlx's migration system. Each migration is a
/// `{timestamp}_{name}.sql` file applied exactly once.

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending database migrations
///
/// Creates the `_sqlx_migrations` bookkeeping table if needed, then applies
/// every migration that has not been applied yet.
///
/// # Errors
///
/// Returns an error if a migration fails to execute; already-applied
/// migrations are left untouched.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("./migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}
