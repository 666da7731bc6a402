//! The CRUD endpoints for incomes.

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    envelope::{fail, invalid_json, success},
    models::{Frequency, UserID},
    routes::parse_id,
    stores::{ExpenseStore, IncomeStore, IncomeUpdate, NewIncome, UserStore},
    validation::{
        FieldError, optional_bool, optional_datetime, optional_frequency,
        optional_positive_integer, optional_string, required_datetime, required_integer,
        required_positive_integer, required_string, validation_failed,
    },
};

/// The state needed for the income endpoints.
#[derive(Debug, Clone)]
pub struct IncomeState<I>
where
    I: IncomeStore + Send + Sync,
{
    /// The store for managing [incomes](crate::models::Income).
    pub income_store: I,
}

impl<U, I, E> FromRef<AppState<U, I, E>> for IncomeState<I>
where
    U: UserStore + Clone + Send + Sync,
    I: IncomeStore + Clone + Send + Sync,
    E: ExpenseStore + Clone + Send + Sync,
{
    fn from_ref(state: &AppState<U, I, E>) -> Self {
        Self {
            income_store: state.income_store.clone(),
        }
    }
}

struct CreateIncomeData {
    user_id: UserID,
    amount: i64,
    source: String,
    date: OffsetDateTime,
    is_recurring: Option<bool>,
    frequency: Option<Frequency>,
}

fn parse_create_income(body: &Value) -> Result<CreateIncomeData, Vec<FieldError>> {
    let mut errors = Vec::new();

    let user_id = required_integer(body, "userId", &mut errors);
    let amount = required_positive_integer(body, "amount", &mut errors);
    let source = required_string(body, "source", 1, &mut errors);
    let date = required_datetime(body, "date", &mut errors);
    let is_recurring = optional_bool(body, "isRecurring", &mut errors);
    let frequency = optional_frequency(body, "frequency", &mut errors);

    match (user_id, amount, source, date) {
        (Some(user_id), Some(amount), Some(source), Some(date)) if errors.is_empty() => {
            Ok(CreateIncomeData {
                user_id: UserID::new(user_id),
                amount,
                source,
                date,
                is_recurring,
                frequency,
            })
        }
        _ => Err(errors),
    }
}

struct UpdateIncomeData {
    amount: Option<i64>,
    source: Option<String>,
    date: Option<OffsetDateTime>,
    is_recurring: Option<bool>,
    frequency: Option<Frequency>,
}

fn parse_update_income(body: &Value) -> Result<UpdateIncomeData, Vec<FieldError>> {
    let mut errors = Vec::new();

    let amount = optional_positive_integer(body, "amount", &mut errors);
    let source = optional_string(body, "source", 1, &mut errors);
    let date = optional_datetime(body, "date", &mut errors);
    let is_recurring = optional_bool(body, "isRecurring", &mut errors);
    let frequency = optional_frequency(body, "frequency", &mut errors);

    if errors.is_empty() {
        Ok(UpdateIncomeData {
            amount,
            source,
            date,
            is_recurring,
            frequency,
        })
    } else {
        Err(errors)
    }
}

/// Create a new income row and respond with it.
pub async fn create_income<I>(
    State(state): State<IncomeState<I>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    I: IncomeStore + Clone + Send + Sync + 'static,
{
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_json(&rejection),
    };

    let data = match parse_create_income(&body) {
        Ok(data) => data,
        Err(errors) => return validation_failed(errors),
    };

    let mut income_store = state.income_store;

    match income_store.create(NewIncome {
        user_id: data.user_id,
        amount: data.amount,
        source: data.source,
        date: data.date,
        is_recurring: data.is_recurring.unwrap_or(false),
        frequency: data.frequency.unwrap_or_default(),
    }) {
        Ok(income) => success(StatusCode::CREATED, "income", income),
        Err(error) => error.into_response(),
    }
}

/// List every income row, unfiltered and unpaginated.
pub async fn get_incomes<I>(State(state): State<IncomeState<I>>) -> Response
where
    I: IncomeStore + Clone + Send + Sync + 'static,
{
    match state.income_store.get_all() {
        Ok(incomes) => success(StatusCode::OK, "incomes", incomes),
        Err(error) => error.into_response(),
    }
}

/// Get a single income row by id.
pub async fn get_income<I>(
    State(state): State<IncomeState<I>>,
    Path(id): Path<String>,
) -> Response
where
    I: IncomeStore + Clone + Send + Sync + 'static,
{
    match state.income_store.get(parse_id(&id)) {
        Ok(income) => success(StatusCode::OK, "income", income),
        Err(Error::NotFound) => fail(StatusCode::NOT_FOUND, "Income not found"),
        Err(error) => error.into_response(),
    }
}

/// Apply a partial update to an income row and respond with the updated row.
pub async fn update_income<I>(
    State(state): State<IncomeState<I>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    I: IncomeStore + Clone + Send + Sync + 'static,
{
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_json(&rejection),
    };

    let data = match parse_update_income(&body) {
        Ok(data) => data,
        Err(errors) => return validation_failed(errors),
    };

    // Zero amounts and empty strings are dropped rather than written; the
    // recurrence fields are applied whenever they are present.
    let update = IncomeUpdate {
        amount: data.amount.filter(|&amount| amount != 0),
        source: data.source.filter(|source| !source.is_empty()),
        date: data.date,
        is_recurring: data.is_recurring,
        frequency: data.frequency,
    };

    let mut income_store = state.income_store;

    match income_store.update(parse_id(&id), update) {
        Ok(income) => success(StatusCode::OK, "income", income),
        Err(Error::NotFound) => fail(StatusCode::NOT_FOUND, "Income not found"),
        Err(error) => error.into_response(),
    }
}

/// Delete an income row, responding 204 with an empty body.
pub async fn delete_income<I>(
    State(state): State<IncomeState<I>>,
    Path(id): Path<String>,
) -> Response
where
    I: IncomeStore + Clone + Send + Sync + 'static,
{
    let mut income_store = state.income_store;

    match income_store.delete(parse_id(&id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(Error::NotFound) => fail(StatusCode::NOT_FOUND, "Income not found"),
        Err(error) => error.into_response(),
    }
}
