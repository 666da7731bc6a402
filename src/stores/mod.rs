//! Contains traits and implementations for objects that store the domain [models](crate::models).

mod expense;
mod income;
mod user;

pub mod sqlite;

pub use expense::{ExpenseStore, ExpenseUpdate, NewExpense};
pub use income::{IncomeStore, IncomeUpdate, NewIncome};
pub use user::{NewUser, UserStore};
