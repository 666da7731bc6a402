//! Registration and login endpoints.

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use jsonwebtoken::EncodingKey;
use serde::Serialize;
use serde_json::Value;
use time::Duration;

use crate::{
    AppState, Error,
    auth::sign_token,
    envelope::{fail, invalid_json, success_with_token},
    models::{PasswordHash, User},
    stores::{ExpenseStore, IncomeStore, NewUser, UserStore},
    validation::{
        FieldError, required_email, required_pin, required_string, validation_failed,
    },
};

/// The state needed for the registration and login endpoints.
#[derive(Clone)]
pub struct AuthRouteState<U>
where
    U: UserStore + Send + Sync,
{
    /// The store for managing [users](crate::models::User).
    pub user_store: U,
    /// The key used for signing bearer tokens.
    pub encoding_key: EncodingKey,
    /// How long issued bearer tokens stay valid.
    pub token_duration: Duration,
    /// The bcrypt work factor used when hashing passwords and PINs.
    pub bcrypt_cost: u32,
}

impl<U, I, E> FromRef<AppState<U, I, E>> for AuthRouteState<U>
where
    U: UserStore + Clone + Send + Sync,
    I: IncomeStore + Clone + Send + Sync,
    E: ExpenseStore + Clone + Send + Sync,
{
    fn from_ref(state: &AppState<U, I, E>) -> Self {
        Self {
            user_store: state.user_store.clone(),
            encoding_key: state.encoding_key.clone(),
            token_duration: state.token_duration,
            bcrypt_cost: state.bcrypt_cost,
        }
    }
}

/// The non-sensitive user fields echoed back by registration and login.
#[derive(Serialize)]
struct UserPayload {
    id: i64,
    name: String,
    email: String,
}

fn user_payload(user: &User) -> UserPayload {
    UserPayload {
        id: user.id().as_i64(),
        name: user.name().to_owned(),
        email: user.email().to_string(),
    }
}

struct RegisterData {
    name: String,
    email: EmailAddress,
    password: String,
    pin: String,
}

fn parse_register(body: &Value) -> Result<RegisterData, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = required_string(body, "name", 1, &mut errors);
    let email = required_email(body, "email", &mut errors);
    let password = required_string(body, "password", 6, &mut errors);
    let pin = required_pin(body, "pin", &mut errors);

    match (name, email, password, pin) {
        (Some(name), Some(email), Some(password), Some(pin)) if errors.is_empty() => {
            Ok(RegisterData {
                name,
                email,
                password,
                pin,
            })
        }
        _ => Err(errors),
    }
}

struct LogInData {
    email: EmailAddress,
    password: String,
}

fn parse_log_in(body: &Value) -> Result<LogInData, Vec<FieldError>> {
    let mut errors = Vec::new();

    let email = required_email(body, "email", &mut errors);
    let password = required_string(body, "password", 1, &mut errors);

    match (email, password) {
        (Some(email), Some(password)) if errors.is_empty() => Ok(LogInData { email, password }),
        _ => Err(errors),
    }
}

/// Register a new user and issue them a bearer token.
///
/// Responds 201 with the token and the new user's non-sensitive fields, or
/// 400 if the email is already taken.
pub async fn register<U>(
    State(state): State<AuthRouteState<U>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    U: UserStore + Clone + Send + Sync + 'static,
{
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_json(&rejection),
    };

    let data = match parse_register(&body) {
        Ok(data) => data,
        Err(errors) => return validation_failed(errors),
    };

    let mut user_store = state.user_store;

    match user_store.get_by_email(&data.email) {
        Ok(_) => return fail(StatusCode::BAD_REQUEST, "Email already in use"),
        Err(Error::NotFound) => {}
        Err(error) => return error.into_response(),
    }

    let cost = state.bcrypt_cost;
    let password = data.password;
    let pin = data.pin;
    let hashes = tokio::task::spawn_blocking(move || -> Result<_, Error> {
        Ok((
            PasswordHash::from_raw_password(&password, cost)?,
            PasswordHash::from_raw_password(&pin, cost)?,
        ))
    })
    .await;

    let (password_hash, pin_hash) = match hashes {
        Ok(Ok(hashes)) => hashes,
        Ok(Err(error)) => return error.into_response(),
        Err(join_error) => return Error::HashingError(join_error.to_string()).into_response(),
    };

    let user = match user_store.create(NewUser {
        name: data.name,
        email: data.email,
        password_hash,
        pin_hash,
    }) {
        Ok(user) => user,
        Err(Error::DuplicateEmail) => return fail(StatusCode::BAD_REQUEST, "Email already in use"),
        Err(error) => return error.into_response(),
    };

    let token = match sign_token(user.id(), &state.encoding_key, state.token_duration) {
        Ok(token) => token,
        Err(error) => return error.into_response(),
    };

    success_with_token(StatusCode::CREATED, &token, "user", user_payload(&user))
}

/// Log in an existing user and issue them a bearer token.
///
/// An unknown email and a wrong password both produce the same 401 message so
/// that the endpoint cannot be used to probe which emails are registered.
pub async fn log_in<U>(
    State(state): State<AuthRouteState<U>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response
where
    U: UserStore + Clone + Send + Sync + 'static,
{
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_json(&rejection),
    };

    let data = match parse_log_in(&body) {
        Ok(data) => data,
        Err(errors) => return validation_failed(errors),
    };

    let user = match state.user_store.get_by_email(&data.email) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            return fail(StatusCode::UNAUTHORIZED, "Incorrect email or password");
        }
        Err(error) => return error.into_response(),
    };

    let password_hash = user.password_hash().clone();
    let password = data.password;
    let password_matches =
        tokio::task::spawn_blocking(move || password_hash.verify(&password)).await;

    match password_matches {
        Ok(Ok(true)) => {}
        Ok(Ok(false)) => return fail(StatusCode::UNAUTHORIZED, "Incorrect email or password"),
        Ok(Err(error)) => return Error::HashingError(error.to_string()).into_response(),
        Err(join_error) => return Error::HashingError(join_error.to_string()).into_response(),
    }

    let token = match sign_token(user.id(), &state.encoding_key, state.token_duration) {
        Ok(token) => token,
        Err(error) => return error.into_response(),
    };

    success_with_token(StatusCode::OK, &token, "user", user_payload(&user))
}

#[cfg(test)]
mod auth_route_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::Duration;

    use crate::{build_router, endpoints, stores::sqlite::create_app_state};

    fn get_test_server() -> TestServer {
        let conn = Connection::open_in_memory().expect("Could not open database in memory.");
        let state = create_app_state(conn, "wubba lubba dub dub", Duration::days(90), 4)
            .expect("Could not create app state.");

        TestServer::new(build_router(state))
    }

    fn register_body() -> Value {
        json!({
            "name": "Jane Doe",
            "email": "jane@example.com",
            "password": "hunter22",
            "pin": "4242",
        })
    }

    #[tokio::test]
    async fn register_succeeds_with_fresh_email() {
        let server = get_test_server();

        let response = server.post(endpoints::REGISTER).json(&register_body()).await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["status"], "success");
        assert!(body["token"].is_string());
        assert_eq!(body["data"]["user"]["name"], "Jane Doe");
        assert_eq!(body["data"]["user"]["email"], "jane@example.com");
        assert!(body["data"]["user"]["id"].is_i64());
    }

    #[tokio::test]
    async fn register_never_echoes_password_or_pin() {
        let server = get_test_server();

        let response = server.post(endpoints::REGISTER).json(&register_body()).await;

        let body = response.json::<Value>();
        let user = body["data"]["user"]
            .as_object()
            .expect("Response should carry a user object.");
        assert!(user.contains_key("id"));
        assert!(user.contains_key("name"));
        assert!(user.contains_key("email"));
        assert!(!user.contains_key("password"));
        assert!(!user.contains_key("pin"));
    }

    #[tokio::test]
    async fn register_fails_with_duplicate_email() {
        let server = get_test_server();

        server
            .post(endpoints::REGISTER)
            .json(&register_body())
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server.post(endpoints::REGISTER).json(&register_body()).await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "Email already in use");
    }

    #[tokio::test]
    async fn register_fails_validation_with_short_password() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "password": "short",
                "pin": "4242",
            }))
            .await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"][0]["path"], "body.password");
    }

    #[tokio::test]
    async fn register_fails_validation_with_non_digit_pin() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "password": "hunter22",
                "pin": "12a4",
            }))
            .await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert_eq!(body["errors"][0]["message"], "PIN must be 4 digits");
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server();
        server
            .post(endpoints::REGISTER)
            .json(&register_body())
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "jane@example.com",
                "password": "hunter22",
            }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "success");
        assert!(body["token"].is_string());
        assert_eq!(body["data"]["user"]["email"], "jane@example.com");
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let server = get_test_server();
        server
            .post(endpoints::REGISTER)
            .json(&register_body())
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "jane@example.com",
                "password": "definitelyNotTheCorrectPassword",
            }))
            .await;

        response.assert_status_unauthorized();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "Incorrect email or password");
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email_using_same_message() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "nobody@example.com",
                "password": "hunter22",
            }))
            .await;

        response.assert_status_unauthorized();
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Incorrect email or password");
    }
}
