//! Database migrations.
//!
//! ```rust,ignore
//! use authgate::postgres::migrations;
//! use sqlx::PgPool;
//!
//! async fn setup_database(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//!     migrations::run(pool).await
//! }
//! ```

use sqlx::PgPool;

/// Creates the directory tables:
/// - `users`
/// - `organizations`, `organization_users`
/// - `teams`, `team_users`
/// - `grants`
/// - `access_tokens`
pub async fn run(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
