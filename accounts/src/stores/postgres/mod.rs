//! `PostgreSQL` repositories.
//!
//! Queries are built at runtime, so the crate compiles without a database.
//! The schema lives in `accounts/migrations`.

pub mod account;
pub mod debit_card;

pub use account::PostgresAccountRepository;
pub use debit_card::PostgresDebitCardRepository;

use crate::error::{AccountError, Result};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;

/// Run database migrations.
///
/// # Errors
///
/// Returns `AccountError::DatabaseError` if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AccountError::DatabaseError(format!("Migration failed: {e}")))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn database_error(context: &str, e: &sqlx::Error) -> AccountError {
    AccountError::DatabaseError(format!("{context}: {e}"))
}

/// Read a `TEXT` column holding an enum code.
fn parse_column<T>(row: &PgRow, column: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row
        .try_get(column)
        .map_err(|e| database_error(column, &e))?;
    raw.parse()
        .map_err(|e: T::Err| AccountError::DatabaseError(format!("{column}: {e}")))
}
