//! This file defines an expense record.

use serde::Serialize;
use time::OffsetDateTime;

use crate::models::{DatabaseID, UserID};

/// Money going out for a user.
///
/// Amounts are integers in the smallest currency unit (e.g., cents).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The expense's ID in the database.
    pub id: DatabaseID,
    /// The user the expense belongs to.
    pub user_id: UserID,
    /// The amount spent in the smallest currency unit.
    pub amount: i64,
    /// What kind of spending this was.
    pub category: String,
    /// Free-form notes about the spending.
    pub description: Option<String>,
    /// When the money was spent.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
