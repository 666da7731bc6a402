//! This module defines the domain data types.

pub use expense::Expense;
pub use income::{Frequency, Income};
pub use password::PasswordHash;
pub use user::{User, UserID};

mod expense;
mod income;
mod password;
mod user;

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;
