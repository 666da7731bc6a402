//! The CRUD endpoints for expenses.

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
    models::UserID,
    routes::parse_id,
    stores::{ExpenseStore, ExpenseUpdate, IncomeStore, NewExpense, UserStore},
    validation::{
        FieldError, optional_datetime, optional_positive_integer, optional_string,
        required_datetime, required_integer, required_positive_integer, required_string,
        validation_failed,
    },
};

/// The state needed for the expense endpoints.
#[derive(Debug, Clone)]
pub struct ExpenseState<E>
where
    E: ExpenseStore + Send + Sync,
{
    /// The store for managing [expenses](crate::models::Expense).
    pub expense_store: E,
}

impl<U, I, E> FromRef<AppState<U, I, E>> for ExpenseState<E>
where
    U: UserStore + Clone + Send + Sync,
    I: IncomeStore + Clone + Send + Sync,
    E: ExpenseStore + Clone + Send + Sync,
{
    fn from_ref(state: &AppState<U, I, E>) -> Self {
        Self {
            expense_store: state.expense_store.clone(),
        }
    }
}

struct CreateExpenseData {
    user_id: UserID,
    amount: i64,
    category: String,
    description: Option<String>,
    date: OffsetDateTime,
}

fn parse_create_expense(body: &Value) -> Result<CreateExpenseData, Vec<FieldError>> {
    let mut errors = Vec::new();

    let user_id = required_integer(body, "userId", &mut errors);
    let amount = required_positive_integer(body, "amount", &mut errors);
    let category = required_string(body, "category", 1, &mut errors);
    let description = optional_string(body, "description", 0, &mut errors);
    let date = required_datetime(body, "date", &mut errors);

    match (user_id, amount, category, date) {
        (Some(user_id), Some(amount), Some(category), Some(date)) if errors.is_empty() => {
            Ok(CreateExpenseData {
                user_id: UserID::new(user_id),
                amount,
                category,
                description,
                date,
            })
        }
        _ => Err(errors),
    }
}

struct UpdateExpenseData {
    amount: Option<i64>,
    category: Option<String>,
    description: Option<String>,
    date: Option<OffsetDateTime>,
}

fn parse_update_expense(body: &Value) -> Result<UpdateExpenseData, Vec<FieldError>> {
    let mut errors = Vec::new();

    let amount = optional_positive_integer(body, "amount", &mut errors);
    let category = optional_string(body, "category", 1, &mut errors);
    let description = optional_string(body, "description", 0, &mut errors);
    let date = optional_datetime(body, "date", &mut errors);

    if errors.is_empty() {
        Ok(UpdateExpenseData {
            amount,
            category,
            description,
            date,
        })
    } else {
        Err(errors)
    }
}

/// Create a new expense row and respond with it.
pub async fn create_expense<E>(
    State(state): State<ExpenseState<E>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    E: ExpenseStore + Clone + Send + Sync + 'static,
{
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_json(&rejection),
    };

    let data = match parse_create_expense(&body) {
        Ok(data) => data,
        Err(errors) => return validation_failed(errors),
    };

    let mut expense_store = state.expense_store;

    match expense_store.create(NewExpense {
        user_id: data.user_id,
        amount: data.amount,
        category: data.category,
        description: data.description,
        date: data.date,
    }) {
        Ok(expense) => success(StatusCode::CREATED, "expense", expense),
        Err(error) => error.into_response(),
    }
}

/// List every expense row, unfiltered and unpaginated.
pub async fn get_expenses<E>(State(state): State<ExpenseState<E>>) -> Response
where
    E: ExpenseStore + Clone + Send + Sync + 'static,
{
    match state.expense_store.get_all() {
        Ok(expenses) => success(StatusCode::OK, "expenses", expenses),
        Err(error) => error.into_response(),
    }
}

/// Get a single expense row by id.
pub async fn get_expense<E>(
    State(state): State<ExpenseState<E>>,
    Path(id): Path<String>,
) -> Response
where
    E: ExpenseStore + Clone + Send + Sync + 'static,
{
    match state.expense_store.get(parse_id(&id)) {
        Ok(expense) => success(StatusCode::OK, "expense", expense),
        Err(Error::NotFound) => fail(StatusCode::NOT_FOUND, "Expense not found"),
        Err(error) => error.into_response(),
    }
}

/// Apply a partial update to an expense row and respond with the updated row.
pub async fn update_expense<E>(
    State(state): State<ExpenseState<E>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    E: ExpenseStore + Clone + Send + Sync + 'static,
{
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_json(&rejection),
    };

    let data = match parse_update_expense(&body) {
        Ok(data) => data,
        Err(errors) => return validation_failed(errors),
    };

    // Zero amounts and empty strings are dropped rather than written, so an
    // empty-string description update leaves the stored value untouched.
    let update = ExpenseUpdate {
        amount: data.amount.filter(|&amount| amount != 0),
        category: data.category.filter(|category| !category.is_empty()),
        description: data.description.filter(|description| !description.is_empty()),
        date: data.date,
    };

    let mut expense_store = state.expense_store;

    match expense_store.update(parse_id(&id), update) {
        Ok(expense) => success(StatusCode::OK, "expense", expense),
        Err(Error::NotFound) => fail(StatusCode::NOT_FOUND, "Expense not found"),
        Err(error) => error.into_response(),
    }
}

/// Delete an expense row, responding 204 with an empty body.
pub async fn delete_expense<E>(
    State(state): State<ExpenseState<E>>,
    Path(id): Path<String>,
) -> Response
where
    E: ExpenseStore + Clone + Send + Sync + 'static,
{
    let mut expense_store = state.expense_store;

    match expense_store.delete(parse_id(&id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(Error::NotFound) => fail(StatusCode::NOT_FOUND, "Expense not found"),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod expense_route_tests {
    use std::str::FromStr;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use email_address::EmailAddress;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::Duration;

    use crate::{
        build_router,
        endpoints::{self, format_endpoint},
        models::PasswordHash,
        stores::{NewUser, UserStore, sqlite::create_app_state},
    };

    fn get_test_server() -> TestServer {
        let conn = Connection::open_in_memory().expect("Could not open database in memory.");
        let state = create_app_state(conn, "wubba lubba dub dub", Duration::days(90), 4)
            .expect("Could not create app state.");

        let mut user_store = state.user_store.clone();
        user_store
            .create(NewUser {
                name: "Test User".to_string(),
                email: EmailAddress::from_str("foo@bar.baz").unwrap(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                pin_hash: PasswordHash::new_unchecked("4242"),
            })
            .expect("Could not create test user.");

        TestServer::new(build_router(state))
    }

    fn expense_body() -> Value {
        json!({
            "userId": 1,
            "amount": 2500,
            "category": "Groceries",
            "description": "Weekly shop",
            "date": "2023-10-01T00:00:00.000Z",
        })
    }

    async fn create_expense(server: &TestServer) -> i64 {
        let response = server.post(endpoints::EXPENSES).json(&expense_body()).await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["data"]["expense"]["id"]
            .as_i64()
            .expect("Created expense should have an integer id.")
    }

    #[tokio::test]
    async fn create_expense_succeeds() {
        let server = get_test_server();

        let response = server.post(endpoints::EXPENSES).json(&expense_body()).await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["status"], "success");
        let expense = &body["data"]["expense"];
        assert!(expense["id"].is_i64());
        assert_eq!(expense["userId"], 1);
        assert_eq!(expense["amount"], 2500);
        assert_eq!(expense["category"], "Groceries");
        assert_eq!(expense["description"], "Weekly shop");
        assert_eq!(expense["date"], "2023-10-01T00:00:00Z");
    }

    #[tokio::test]
    async fn create_expense_succeeds_without_description() {
        let server = get_test_server();

        let response = server
            .post(endpoints::EXPENSES)
            .json(&json!({
                "userId": 1,
                "amount": 2500,
                "category": "Groceries",
                "date": "2023-10-01T00:00:00.000Z",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["data"]["expense"]["description"], Value::Null);
    }

    #[tokio::test]
    async fn create_expense_fails_validation_with_missing_category() {
        let server = get_test_server();

        let response = server
            .post(endpoints::EXPENSES)
            .json(&json!({
                "userId": 1,
                "amount": 2500,
                "date": "2023-10-01T00:00:00.000Z",
            }))
            .await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"][0]["path"], "body.category");
    }

    #[tokio::test]
    async fn get_expenses_returns_all_rows() {
        let server = get_test_server();
        create_expense(&server).await;
        create_expense(&server).await;

        let response = server.get(endpoints::EXPENSES).await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["data"]["expenses"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn get_expense_fails_with_unknown_id() {
        let server = get_test_server();

        let response = server.get(&format_endpoint(endpoints::EXPENSE, 999)).await;

        response.assert_status_not_found();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "Expense not found");
    }

    #[tokio::test]
    async fn get_expense_with_non_numeric_id_is_not_found_rather_than_invalid() {
        let server = get_test_server();
        create_expense(&server).await;

        let response = server.get("/api/v1/expenses/abc").await;

        response.assert_status_not_found();
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Expense not found");
    }

    #[tokio::test]
    async fn update_expense_changes_only_supplied_fields() {
        let server = get_test_server();
        let id = create_expense(&server).await;

        let response = server
            .patch(&format_endpoint(endpoints::EXPENSE, id))
            .json(&json!({"amount": 60}))
            .await;

        response.assert_status_ok();
        let expense = &response.json::<Value>()["data"]["expense"];
        assert_eq!(expense["amount"], 60);
        assert_eq!(expense["category"], "Groceries");
        assert_eq!(expense["description"], "Weekly shop");
        assert_eq!(expense["date"], "2023-10-01T00:00:00Z");
    }

    #[tokio::test]
    async fn update_expense_skips_empty_string_description() {
        let server = get_test_server();
        let id = create_expense(&server).await;

        let response = server
            .patch(&format_endpoint(endpoints::EXPENSE, id))
            .json(&json!({"description": ""}))
            .await;

        response.assert_status_ok();
        let expense = &response.json::<Value>()["data"]["expense"];
        assert_eq!(expense["description"], "Weekly shop");
    }

    #[tokio::test]
    async fn update_expense_fails_with_unknown_id() {
        let server = get_test_server();

        let response = server
            .patch(&format_endpoint(endpoints::EXPENSE, 999))
            .json(&json!({"amount": 60}))
            .await;

        response.assert_status_not_found();
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Expense not found");
    }

    #[tokio::test]
    async fn delete_expense_returns_no_content_then_not_found() {
        let server = get_test_server();
        let id = create_expense(&server).await;

        let response = server
            .delete(&format_endpoint(endpoints::EXPENSE, id))
            .await;
        response.assert_status(StatusCode::NO_CONTENT);
        assert!(response.text().is_empty());

        let response = server
            .delete(&format_endpoint(endpoints::EXPENSE, id))
            .await;
        response.assert_status_not_found();
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Expense not found");
    }
}
