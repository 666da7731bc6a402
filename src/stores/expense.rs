//! Defines the expense store trait.

use time::OffsetDateTime;

use crate::{
    Error,
    models::{DatabaseID, Expense, UserID},
};

/// The fields needed to create a new expense.
pub struct NewExpense {
    /// The user the expense belongs to.
    pub user_id: UserID,
    /// The amount spent in the smallest currency unit. Must be positive.
    pub amount: i64,
    /// What kind of spending this was.
    pub category: String,
    /// Free-form notes about the spending.
    pub description: Option<String>,
    /// When the money was spent.
    pub date: OffsetDateTime,
}

/// A partial update to an expense. Only the fields that are `Some` are written.
#[derive(Default)]
pub struct ExpenseUpdate {
    /// Replace the amount.
    pub amount: Option<i64>,
    /// Replace the category.
    pub category: Option<String>,
    /// Replace the description.
    pub description: Option<String>,
    /// Replace the date.
    pub date: Option<OffsetDateTime>,
}

/// Handles the creation and retrieval of expenses.
pub trait ExpenseStore {
    /// Create a new expense in the store.
    ///
    /// Returns [Error::InvalidForeignKey] if `user_id` does not refer to a
    /// live user.
    fn create(&mut self, new_expense: NewExpense) -> Result<Expense, Error>;

    /// Retrieve every expense in the store, in storage order.
    fn get_all(&self) -> Result<Vec<Expense>, Error>;

    /// Retrieve an expense from the store.
    ///
    /// Returns [Error::NotFound] if `id` does not match a row.
    fn get(&self, id: DatabaseID) -> Result<Expense, Error>;

    /// Apply `update` to the expense with `id` and return the updated row.
    ///
    /// Returns [Error::NotFound] if `id` does not match a row.
    fn update(&mut self, id: DatabaseID, update: ExpenseUpdate) -> Result<Expense, Error>;

    /// Remove the expense with `id` from the store.
    ///
    /// Returns [Error::NotFound] if `id` does not match a row.
    fn delete(&mut self, id: DatabaseID) -> Result<(), Error>;
}
