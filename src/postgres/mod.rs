//! PostgreSQL storage for the directory.
//!
//! [`PostgresDirectory`] implements every directory trait plus
//! [`GrantStore`](crate::permissions::GrantStore), so it can back both the
//! [`Authorizer`](crate::Authorizer) and the HTTP API. Tokens live in
//! [`PostgresTokenRepository`]. Run [`migrations::run`] first.

mod grant;
pub mod migrations;
mod organization;
mod team;
mod token;
mod user;

pub use token::PostgresTokenRepository;

use sqlx::PgPool;

use crate::AuthError;

#[derive(Clone)]
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Creates the directory and token repository over one pool.
pub fn create_repositories(pool: PgPool) -> (PostgresDirectory, PostgresTokenRepository) {
    (
        PostgresDirectory::new(pool.clone()),
        PostgresTokenRepository::new(pool),
    )
}

fn database_error(operation: &'static str, e: &sqlx::Error) -> AuthError {
    log::error!(
        target: "authgate",
        "msg=\"database error\", operation=\"{operation}\", error=\"{e}\""
    );
    AuthError::DatabaseError(e.to_string())
}

/// Like [`database_error`], but a duplicate email is `UserAlreadyExists` and
/// a dangling reference is `NotFound`.
fn write_error(operation: &'static str, e: &sqlx::Error) -> AuthError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AuthError::UserAlreadyExists;
        }
        if db.is_foreign_key_violation() {
            return AuthError::NotFound;
        }
    }
    database_error(operation, e)
}
