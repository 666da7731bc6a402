//! Defines the income store trait.

use time::OffsetDateTime;

use crate::{
    Error,
    models::{DatabaseID, Frequency, Income, UserID},
};

/// The fields needed to create a new income.
pub struct NewIncome {
    /// The user the income belongs to.
    pub user_id: UserID,
    /// The amount received in the smallest currency unit. Must be positive.
    pub amount: i64,
    /// Where the money came from.
    pub source: String,
    /// When the money was received.
    pub date: OffsetDateTime,
    /// Whether the income repeats.
    pub is_recurring: bool,
    /// How often the income repeats.
    pub frequency: Frequency,
}

/// A partial update to an income. Only the fields that are `Some` are written.
#[derive(Default)]
pub struct IncomeUpdate {
    /// Replace the amount.
    pub amount: Option<i64>,
    /// Replace the source.
    pub source: Option<String>,
    /// Replace the date.
    pub date: Option<OffsetDateTime>,
    /// Replace the recurrence flag.
    pub is_recurring: Option<bool>,
    /// Replace the recurrence frequency.
    pub frequency: Option<Frequency>,
}

/// Handles the creation and retrieval of incomes.
pub trait IncomeStore {
    /// Create a new income in the store.
    ///
    /// Returns [Error::InvalidForeignKey] if `user_id` does not refer to a
    /// live user.
    fn create(&mut self, new_income: NewIncome) -> Result<Income, Error>;

    /// Retrieve every income in the store, in storage order.
    fn get_all(&self) -> Result<Vec<Income>, Error>;

    /// Retrieve an income from the store.
    ///
    /// Returns [Error::NotFound] if `id` does not match a row.
    fn get(&self, id: DatabaseID) -> Result<Income, Error>;

    /// Apply `update` to the income with `id` and return the updated row.
    ///
    /// Returns [Error::NotFound] if `id` does not match a row.
    fn update(&mut self, id: DatabaseID, update: IncomeUpdate) -> Result<Income, Error>;

    /// Remove the income with `id` from the store.
    ///
    /// Returns [Error::NotFound] if `id` does not match a row.
    fn delete(&mut self, id: DatabaseID) -> Result<(), Error>;
}
