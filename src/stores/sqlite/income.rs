//! Implements a SQLite backed income store.
use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{DatabaseID, Frequency, Income, UserID},
    stores::{IncomeStore, IncomeUpdate, NewIncome},
    stores::sqlite::{format_timestamp, parse_timestamp},
};

const INCOME_COLUMNS: &str = "id, user_id, amount, source, date, is_recurring, frequency, created_at";

/// Stores incomes in a SQLite database.
///
/// Income rows reference the [User](crate::models::User) model, so the users
/// table must be set up in the database.
#[derive(Debug, Clone)]
pub struct SQLiteIncomeStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteIncomeStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl IncomeStore for SQLiteIncomeStore {
    /// Create a new income in the database.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidForeignKey] if `user_id` does not refer to a valid user,
    /// - [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, new_income: NewIncome) -> Result<Income, Error> {
        let created_at = time::OffsetDateTime::now_utc();

        let income = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "INSERT INTO incomes (user_id, amount, source, date, is_recurring, frequency, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING {INCOME_COLUMNS}",
            ))?
            .query_row(
                (
                    new_income.user_id.as_i64(),
                    new_income.amount,
                    &new_income.source,
                    format_timestamp(new_income.date)?,
                    new_income.is_recurring,
                    new_income.frequency.as_str(),
                    format_timestamp(created_at)?,
                ),
                Self::map_row,
            )?;

        Ok(income)
    }

    /// Retrieve every income in the database, in storage order.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    /// This function will return a [Error::SqlError] if there is an SQL error.
    fn get_all(&self) -> Result<Vec<Income>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!("SELECT {INCOME_COLUMNS} FROM incomes"))?
            .query_map([], Self::map_row)?
            .map(|maybe_income| maybe_income.map_err(Error::SqlError))
            .collect()
    }

    /// Retrieve an income in the database by its `id`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid income,
    /// - [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: DatabaseID) -> Result<Income, Error> {
        let income = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!("SELECT {INCOME_COLUMNS} FROM incomes WHERE id = :id"))?
            .query_row(&[(":id", &id)], Self::map_row)?;

        Ok(income)
    }

    /// Apply `update` to the income with `id` and return the updated row.
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
    /// - [Error::NotFound] if `id` does not refer to a valid income,
    /// - [Error::SqlError] if there is some other SQL error.
    fn update(&mut self, id: DatabaseID, update: IncomeUpdate) -> Result<Income, Error> {
        let mut set_clauses = Vec::new();
        let mut parameters = Vec::new();

        if let Some(amount) = update.amount {
            parameters.push(Value::Integer(amount));
            set_clauses.push(format!("amount = ?{}", parameters.len()));
        }

        if let Some(source) = update.source {
            parameters.push(Value::Text(source));
            set_clauses.push(format!("source = ?{}", parameters.len()));
        }

        if let Some(date) = update.date {
            parameters.push(Value::Text(format_timestamp(date)?));
            set_clauses.push(format!("date = ?{}", parameters.len()));
        }

        if let Some(is_recurring) = update.is_recurring {
            parameters.push(Value::Integer(i64::from(is_recurring)));
            set_clauses.push(format!("is_recurring = ?{}", parameters.len()));
        }

        if let Some(frequency) = update.frequency {
            parameters.push(Value::Text(frequency.as_str().to_string()));
            set_clauses.push(format!("frequency = ?{}", parameters.len()));
        }

        if set_clauses.is_empty() {
            return self.get(id);
        }

        parameters.push(Value::Integer(id));

        let query_string = format!(
            "UPDATE incomes SET {} WHERE id = ?{} RETURNING {INCOME_COLUMNS}",
            set_clauses.join(", "),
            parameters.len(),
        );

        let income = self
            .connection
            .lock()
            .unwrap()
            .prepare(&query_string)?
            .query_row(params_from_iter(parameters.iter()), Self::map_row)?;

        Ok(income)
    }

    /// Remove the income with `id` from the database.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid income,
    /// - [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, id: DatabaseID) -> Result<(), Error> {
        let rows_deleted = self
            .connection
            .lock()
            .unwrap()
            .execute("DELETE FROM incomes WHERE id = ?1", [id])?;

        if rows_deleted == 0 {
            Err(Error::NotFound)
        } else {
            Ok(())
        }
    }
}

impl CreateTable for SQLiteIncomeStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS incomes (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    amount INTEGER NOT NULL,
                    source TEXT NOT NULL,
                    date TEXT NOT NULL,
                    is_recurring INTEGER NOT NULL DEFAULT 0,
                    frequency TEXT NOT NULL DEFAULT 'one-time'
                        CHECK(frequency IN ('daily', 'weekly', 'monthly', 'yearly', 'one-time')),
                    created_at TEXT NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES users(id)
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteIncomeStore {
    type ReturnType = Income;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;
        let user_id = UserID::new(row.get(offset + 1)?);
        let amount = row.get(offset + 2)?;
        let source = row.get(offset + 3)?;
        let raw_date: String = row.get(offset + 4)?;
        let is_recurring = row.get(offset + 5)?;
        let raw_frequency: String = row.get(offset + 6)?;
        let raw_created_at: String = row.get(offset + 7)?;

        let date = parse_timestamp(&raw_date, offset + 4)?;
        let frequency = Frequency::from_str(&raw_frequency).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 6,
                rusqlite::types::Type::Text,
                error.into(),
            )
        })?;
        let created_at = parse_timestamp(&raw_created_at, offset + 7)?;

        Ok(Income {
            id,
            user_id,
            amount,
            source,
            date,
            is_recurring,
            frequency,
            created_at,
        })
    }
}

#[cfg(test)]
mod sqlite_income_store_tests {
    use std::str::FromStr;

    use email_address::EmailAddress;
    use rusqlite::Connection;
    use time::{OffsetDateTime, format_description::well_known::Rfc3339};

    use crate::{
        models::{Frequency, PasswordHash, UserID},
        stores::{
            IncomeUpdate, NewIncome, NewUser, UserStore,
            sqlite::{SqlAppState, create_app_state},
        },
    };

    use super::{Error, IncomeStore};

    fn get_app_state() -> (SqlAppState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        let mut state = create_app_state(conn, "wubba lubba dub dub", time::Duration::days(90), 4)
            .expect("Could not create app state");

        let user = state
            .user_store
            .create(NewUser {
                name: "Test User".to_string(),
                email: EmailAddress::from_str("foo@bar.baz").unwrap(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                pin_hash: PasswordHash::new_unchecked("4242"),
            })
            .expect("Could not create test user");

        let user_id = user.id();
        (state, user_id)
    }

    fn new_test_income(user_id: UserID) -> NewIncome {
        NewIncome {
            user_id,
            amount: 50_000,
            source: "Salary".to_string(),
            date: OffsetDateTime::parse("2023-10-01T00:00:00Z", &Rfc3339).unwrap(),
            is_recurring: true,
            frequency: Frequency::Monthly,
        }
    }

    #[test]
    fn create_succeeds() {
        let (mut state, user_id) = get_app_state();

        let income = state
            .income_store
            .create(new_test_income(user_id))
            .unwrap();

        assert!(income.id > 0);
        assert_eq!(income.user_id, user_id);
        assert_eq!(income.amount, 50_000);
        assert_eq!(income.source, "Salary");
        assert!(income.is_recurring);
        assert_eq!(income.frequency, Frequency::Monthly);
    }

    #[test]
    fn create_fails_on_invalid_user_id() {
        let (mut state, _) = get_app_state();

        let maybe_income = state
            .income_store
            .create(new_test_income(UserID::new(999)));

        assert_eq!(maybe_income, Err(Error::InvalidForeignKey));
    }

    #[test]
    fn get_income_by_id_succeeds() {
        let (mut state, user_id) = get_app_state();
        let income = state
            .income_store
            .create(new_test_income(user_id))
            .unwrap();

        let selected_income = state.income_store.get(income.id);

        assert_eq!(Ok(income), selected_income);
    }

    #[test]
    fn get_income_fails_on_invalid_id() {
        let (mut state, user_id) = get_app_state();
        let income = state
            .income_store
            .create(new_test_income(user_id))
            .unwrap();

        let maybe_income = state.income_store.get(income.id + 654);

        assert_eq!(maybe_income, Err(Error::NotFound));
    }

    #[test]
    fn get_all_returns_rows_in_storage_order() {
        let (mut state, user_id) = get_app_state();
        let want = vec![
            state
                .income_store
                .create(new_test_income(user_id))
                .unwrap(),
            state
                .income_store
                .create(NewIncome {
                    source: "Freelance".to_string(),
                    ..new_test_income(user_id)
                })
                .unwrap(),
        ];

        let got = state.income_store.get_all().unwrap();

        assert_eq!(got, want);
    }

    #[test]
    fn update_changes_only_supplied_fields() {
        let (mut state, user_id) = get_app_state();
        let income = state
            .income_store
            .create(new_test_income(user_id))
            .unwrap();

        let updated_income = state
            .income_store
            .update(
                income.id,
                IncomeUpdate {
                    amount: Some(60),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated_income.amount, 60);
        assert_eq!(updated_income.source, income.source);
        assert_eq!(updated_income.date, income.date);
        assert_eq!(updated_income.is_recurring, income.is_recurring);
        assert_eq!(updated_income.frequency, income.frequency);
        assert_eq!(updated_income.created_at, income.created_at);
    }

    #[test]
    fn update_applies_recurrence_flag_false() {
        let (mut state, user_id) = get_app_state();
        let income = state
            .income_store
            .create(new_test_income(user_id))
            .unwrap();
        assert!(income.is_recurring);

        let updated_income = state
            .income_store
            .update(
                income.id,
                IncomeUpdate {
                    is_recurring: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(!updated_income.is_recurring);
    }

    #[test]
    fn update_with_no_fields_returns_row_unchanged() {
        let (mut state, user_id) = get_app_state();
        let income = state
            .income_store
            .create(new_test_income(user_id))
            .unwrap();

        let updated_income = state
            .income_store
            .update(income.id, IncomeUpdate::default())
            .unwrap();

        assert_eq!(updated_income, income);
    }

    #[test]
    fn update_fails_on_invalid_id() {
        let (mut state, _) = get_app_state();

        let maybe_income = state.income_store.update(
            999,
            IncomeUpdate {
                amount: Some(60),
                ..Default::default()
            },
        );

        assert_eq!(maybe_income, Err(Error::NotFound));
    }

    #[test]
    fn delete_removes_row() {
        let (mut state, user_id) = get_app_state();
        let income = state
            .income_store
            .create(new_test_income(user_id))
            .unwrap();

        state.income_store.delete(income.id).unwrap();

        assert_eq!(state.income_store.get(income.id), Err(Error::NotFound));
    }

    #[test]
    fn delete_fails_on_missing_row() {
        let (mut state, user_id) = get_app_state();
        let income = state
            .income_store
            .create(new_test_income(user_id))
            .unwrap();

        state.income_store.delete(income.id).unwrap();

        assert_eq!(state.income_store.delete(income.id), Err(Error::NotFound));
    }
}
