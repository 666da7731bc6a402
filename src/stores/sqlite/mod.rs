//! SQLite backed implementations of the store traits, and a convenience
//! function for building an [AppState] on top of them.

mod expense;
mod income;
mod user;

pub use expense::SQLiteExpenseStore;
pub use income::SQLiteIncomeStore;
pub use user::SQLiteUserStore;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{AppState, Error, db::initialize};

/// An alias for an [AppState] that uses SQLite for the backend.
pub type SqlAppState = AppState<SQLiteUserStore, SQLiteIncomeStore, SQLiteExpenseStore>;

/// Creates an [AppState] instance that uses SQLite for the backend.
///
/// This function will modify the database by adding the tables for the domain
/// models to the database.
///
/// # Errors
/// Returns an error if the database cannot be initialized.
pub fn create_app_state(
    db_connection: Connection,
    token_secret: &str,
    token_duration: Duration,
    bcrypt_cost: u32,
) -> Result<SqlAppState, Error> {
    initialize(&db_connection)?;

    let connection = Arc::new(Mutex::new(db_connection));

    Ok(AppState::new(
        token_secret,
        token_duration,
        bcrypt_cost,
        SQLiteUserStore::new(connection.clone()),
        SQLiteIncomeStore::new(connection.clone()),
        SQLiteExpenseStore::new(connection),
    ))
}

/// Render a timestamp as the RFC 3339 string stored in TEXT columns.
pub(crate) fn format_timestamp(value: OffsetDateTime) -> Result<String, Error> {
    value
        .format(&Rfc3339)
        .map_err(|error| Error::InvalidTimestamp(error.to_string()))
}

/// Parse a stored RFC 3339 string back into a timestamp.
pub(crate) fn parse_timestamp(raw: &str, column: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(error))
    })
}
