//! Implements a struct that holds the state of the REST server.

use jsonwebtoken::{DecodingKey, EncodingKey};
use time::Duration;

use crate::stores::{ExpenseStore, IncomeStore, UserStore};

/// The state of the REST server.
///
/// The stores are injected so that route handlers only depend on the store
/// traits, not on the SQLite backend.
#[derive(Clone)]
pub struct AppState<U, I, E>
where
    U: UserStore + Send + Sync,
    I: IncomeStore + Send + Sync,
    E: ExpenseStore + Send + Sync,
{
    /// The store for managing [users](crate::models::User).
    pub user_store: U,
    /// The store for managing [incomes](crate::models::Income).
    pub income_store: I,
    /// The store for managing [expenses](crate::models::Expense).
    pub expense_store: E,
    /// The key used for signing bearer tokens.
    pub encoding_key: EncodingKey,
    /// The key used for verifying bearer tokens.
    pub decoding_key: DecodingKey,
    /// How long issued bearer tokens stay valid.
    pub token_duration: Duration,
    /// The bcrypt work factor used when hashing passwords and PINs.
    pub bcrypt_cost: u32,
}

impl<U, I, E> AppState<U, I, E>
where
    U: UserStore + Send + Sync,
    I: IncomeStore + Send + Sync,
    E: ExpenseStore + Send + Sync,
{
    /// Create a new [AppState].
    pub fn new(
        token_secret: &str,
        token_duration: Duration,
        bcrypt_cost: u32,
        user_store: U,
        income_store: I,
        expense_store: E,
    ) -> Self {
        Self {
            user_store,
            income_store,
            expense_store,
            encoding_key: EncodingKey::from_secret(token_secret.as_ref()),
            decoding_key: DecodingKey::from_secret(token_secret.as_ref()),
            token_duration,
            bcrypt_cost,
        }
    }
}
