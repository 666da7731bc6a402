//! Implements a SQLite backed user store.
use std::sync::{Arc, Mutex};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{PasswordHash, User, UserID},
    stores::{NewUser, UserStore},
    stores::sqlite::{format_timestamp, parse_timestamp},
};

/// Handles the creation and retrieval of User objects.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new user store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SQLiteUserStore {
    /// Create and insert a new user into the database.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateEmail] if the email is already taken, or
    /// [Error::SqlError] if an SQL related error occurred.
    fn create(&mut self, new_user: NewUser) -> Result<User, Error> {
        let created_at = time::OffsetDateTime::now_utc();

        let connection = self.connection.lock().unwrap();

        connection.execute(
            "INSERT INTO users (name, email, password, pin, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &new_user.name,
                &new_user.email.to_string(),
                new_user.password_hash.to_string(),
                new_user.pin_hash.to_string(),
                format_timestamp(created_at)?,
            ),
        )?;

        let id = UserID::new(connection.last_insert_rowid());

        Ok(User::new(
            id,
            new_user.name,
            new_user.email,
            new_user.password_hash,
            new_user.pin_hash,
            created_at,
        ))
    }

    /// Get the user from the database that has the specified `id`, or return [Error::NotFound] if such user does not exist.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    ///
    /// Returns a [Error::NotFound] error if there is no user with the specified id or [Error::SqlError] if there are SQL related errors.
    fn get(&self, id: UserID) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare("SELECT id, name, email, password, pin, created_at FROM users WHERE id = :id")?
            .query_row(&[(":id", &id.as_i64())], SQLiteUserStore::map_row)
            .map_err(|e| e.into())
    }

    /// Get the user from the database that has the specified `email` address, or return [Error::NotFound] if such user does not exist.
    ///
    /// The lookup is an exact, case-sensitive match on the stored email.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or is poisoned.
    ///
    /// # Errors
    ///
    /// Returns a [Error::NotFound] error if there is no user with the specified email or [Error::SqlError] if there are SQL related errors.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, name, email, password, pin, created_at FROM users WHERE email = :email",
            )?
            .query_row(&[(":email", &email.to_string())], SQLiteUserStore::map_row)
            .map_err(|e| e.into())
    }
}

impl CreateTable for SQLiteUserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    password TEXT NOT NULL,
                    pin TEXT NOT NULL,
                    created_at TEXT NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteUserStore {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_id = row.get(offset)?;
        let name = row.get(offset + 1)?;
        let raw_email: String = row.get(offset + 2)?;
        let raw_password_hash: String = row.get(offset + 3)?;
        let raw_pin_hash: String = row.get(offset + 4)?;
        let raw_created_at: String = row.get(offset + 5)?;

        let id = UserID::new(raw_id);
        let email = EmailAddress::new_unchecked(raw_email);
        let password_hash = PasswordHash::new_unchecked(&raw_password_hash);
        let pin_hash = PasswordHash::new_unchecked(&raw_pin_hash);
        let created_at = parse_timestamp(&raw_created_at, offset + 5)?;

        Ok(Self::ReturnType::new(
            id,
            name,
            email,
            password_hash,
            pin_hash,
            created_at,
        ))
    }
}

#[cfg(test)]
mod user_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{
        db::CreateTable,
        models::{PasswordHash, UserID},
        stores::NewUser,
    };

    use super::{Error, SQLiteUserStore, UserStore};

    fn get_store() -> SQLiteUserStore {
        let conn = Connection::open_in_memory().unwrap();
        SQLiteUserStore::create_table(&conn).unwrap();

        SQLiteUserStore::new(Arc::new(Mutex::new(conn)))
    }

    fn new_test_user(email: &str) -> NewUser {
        NewUser {
            name: "Test User".to_string(),
            email: EmailAddress::from_str(email).unwrap(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            pin_hash: PasswordHash::new_unchecked("4242"),
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let mut store = get_store();

        let inserted_user = store.create(new_test_user("hello@world.com")).unwrap();

        assert!(inserted_user.id().as_i64() > 0);
        assert_eq!(inserted_user.name(), "Test User");
        assert_eq!(inserted_user.email().as_str(), "hello@world.com");
        assert_eq!(
            inserted_user.password_hash(),
            &PasswordHash::new_unchecked("hunter2")
        );
        assert_eq!(inserted_user.pin_hash(), &PasswordHash::new_unchecked("4242"));
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let mut store = get_store();

        assert!(store.create(new_test_user("hello@world.com")).is_ok());

        assert_eq!(
            store.create(new_test_user("hello@world.com")),
            Err(Error::DuplicateEmail)
        );
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let store = get_store();

        let id = UserID::new(42);

        assert_eq!(store.get(id), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let mut store = get_store();

        let test_user = store.create(new_test_user("foo@bar.baz")).unwrap();

        let retrieved_user = store.get(test_user.id()).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_fails_with_non_existent_email() {
        let store = get_store();

        // This email is not in the database.
        let email = EmailAddress::from_str("notavalidemail@foo.bar").unwrap();

        assert_eq!(store.get_by_email(&email), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_email() {
        let mut store = get_store();

        let test_user = store.create(new_test_user("foo@bar.baz")).unwrap();

        let retrieved_user = store.get_by_email(test_user.email()).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_email_is_case_sensitive() {
        let mut store = get_store();

        store.create(new_test_user("foo@bar.baz")).unwrap();

        let email = EmailAddress::from_str("FOO@bar.baz").unwrap();

        assert_eq!(store.get_by_email(&email), Err(Error::NotFound));
    }
}
