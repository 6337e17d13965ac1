/// Schema bootstrap
///
/// Migrations live in `orgauth-shared/migrations/` and are embedded at compile
/// time with `sqlx::migrate!`. They are applied once at startup, before the
/// server accepts requests.
///
/// # Example
///
/// ```no_run
/// use orgauth_shared::db::migrations::run_migrations;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::postgres::PgPool;
use tracing::{error, info};

/// Applies all pending migrations
///
/// # Errors
///
/// Returns an error if a migration fails to apply or an already applied
/// migration was edited afterwards.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    let migrator = sqlx::migrate!("./migrations");
    info!(available = migrator.iter().count(), "Running database migrations");

    migrator.run(pool).await.map_err(|e| {
        error!(error = %e, "Migration failed");
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}

/// Number of successfully applied migrations
pub async fn applied_migrations(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_migrations_are_embedded() {
        let migrator = sqlx::migrate!("./migrations");
        let descriptions: Vec<_> = migrator.iter().map(|m| m.description.to_string()).collect();

        assert!(descriptions.iter().any(|d| d.contains("users")));
        assert!(descriptions.iter().any(|d| d.contains("organisations")));
    }
}
