//! Implements a SQLite backed expense store.
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{DatabaseID, Expense, UserID},
    stores::{ExpenseStore, ExpenseUpdate, NewExpense},
    stores::sqlite::{format_timestamp, parse_timestamp},
};

const EXPENSE_COLUMNS: &str = "id, user_id, amount, category, description, date, created_at";

/// Stores expenses in a SQLite database.
///
/// Expense rows reference the [User](crate::models::User) model, so the users
/// table must be set up in the database.
#[derive(Debug, Clone)]
pub struct SQLiteExpenseStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteExpenseStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl ExpenseStore for SQLiteExpenseStore {
    /// Create a new expense in the database.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidForeignKey] if `user_id` does not refer to a valid user,
    /// - [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, new_expense: NewExpense) -> Result<Expense, Error> {
        let created_at = time::OffsetDateTime::now_utc();

        let expense = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "INSERT INTO expenses (user_id, amount, category, description, date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING {EXPENSE_COLUMNS}",
            ))?
            .query_row(
                (
                    new_expense.user_id.as_i64(),
                    new_expense.amount,
                    &new_expense.category,
                    &new_expense.description,
                    format_timestamp(new_expense.date)?,
                    format_timestamp(created_at)?,
                ),
                Self::map_row,
            )?;

        Ok(expense)
    }

    /// Retrieve every expense in the database, in storage order.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is an SQL error.
    fn get_all(&self) -> Result<Vec<Expense>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!("SELECT {EXPENSE_COLUMNS} FROM expenses"))?
            .query_map([], Self::map_row)?
            .map(|maybe_expense| maybe_expense.map_err(Error::SqlError))
            .collect()
    }

    /// Retrieve an expense in the database by its `id`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid expense,
    /// - [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: DatabaseID) -> Result<Expense, Error> {
        let expense = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = :id"))?
            .query_row(&[(":id", &id)], Self::map_row)?;

        Ok(expense)
    }

    /// Apply `update` to the expense with `id` and return the updated row.
    ///
    /// Fields that are `None` are left untouched. An update with no fields
    /// set returns the row unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid expense,
    /// - [Error::SqlError] if there is some other SQL error.
    fn update(&mut self, id: DatabaseID, update: ExpenseUpdate) -> Result<Expense, Error> {
        let mut set_clauses = Vec::new();
        let mut parameters = Vec::new();

        if let Some(amount) = update.amount {
            parameters.push(Value::Integer(amount));
            set_clauses.push(format!("amount = ?{}", parameters.len()));
        }

        if let Some(category) = update.category {
            parameters.push(Value::Text(category));
            set_clauses.push(format!("category = ?{}", parameters.len()));
        }

        if let Some(description) = update.description {
            parameters.push(Value::Text(description));
            set_clauses.push(format!("description = ?{}", parameters.len()));
        }

        if let Some(date) = update.date {
            parameters.push(Value::Text(format_timestamp(date)?));
            set_clauses.push(format!("date = ?{}", parameters.len()));
        }

        if set_clauses.is_empty() {
            return self.get(id);
        }

        parameters.push(Value::Integer(id));

        let query_string = format!(
            "UPDATE expenses SET {} WHERE id = ?{} RETURNING {EXPENSE_COLUMNS}",
            set_clauses.join(", "),
            parameters.len(),
        );

        let expense = self
            .connection
            .lock()
            .unwrap()
            .prepare(&query_string)?
            .query_row(params_from_iter(parameters.iter()), Self::map_row)?;

        Ok(expense)
    }

    /// Remove the expense with `id` from the database.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid expense,
    /// - [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, id: DatabaseID) -> Result<(), Error> {
        let rows_deleted = self
            .connection
            .lock()
            .unwrap()
            .execute("DELETE FROM expenses WHERE id = ?1", [id])?;

        if rows_deleted == 0 {
            Err(Error::NotFound)
        } else {
            Ok(())
        }
    }
}

impl CreateTable for SQLiteExpenseStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS expenses (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    amount INTEGER NOT NULL,
                    category TEXT NOT NULL,
                    description TEXT,
                    date TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES users(id)
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteExpenseStore {
    type ReturnType = Expense;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;
        let user_id = UserID::new(row.get(offset + 1)?);
        let amount = row.get(offset + 2)?;
        let category = row.get(offset + 3)?;
        let description = row.get(offset + 4)?;
        let raw_date: String = row.get(offset + 5)?;
        let raw_created_at: String = row.get(offset + 6)?;

        let date = parse_timestamp(&raw_date, offset + 5)?;
        let created_at = parse_timestamp(&raw_created_at, offset + 6)?;

        Ok(Expense {
            id,
            user_id,
            amount,
            category,
            description,
            date,
            created_at,
        })
    }
}
