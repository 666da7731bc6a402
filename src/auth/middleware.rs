//! Middleware that guards routes behind a bearer token.

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::DecodingKey;
use serde::Serialize;

use crate::{
    AppState, Error,
    auth::decode_token,
    envelope::fail,
    models::UserID,
    stores::{ExpenseStore, IncomeStore, UserStore},
};

/// The authenticated principal resolved from a bearer token.
///
/// Route handlers behind [protect] can receive it with
/// `Extension(user): Extension<CurrentUser>`.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    /// The user's ID in the database.
    pub id: i64,
    /// The user's display name.
    pub name: String,
    /// The user's email address.
    pub email: String,
}

/// The state needed for the bearer-token guard.
#[derive(Clone)]
pub struct GuardState<U>
where
    U: UserStore + Send + Sync,
{
    /// The store used to resolve a token's user ID to a live user.
    pub user_store: U,
    /// The key used for verifying bearer tokens.
    pub decoding_key: DecodingKey,
}

impl<U, I, E> FromRef<AppState<U, I, E>> for GuardState<U>
where
    U: UserStore + Clone + Send + Sync,
    I: IncomeStore + Clone + Send + Sync,
    E: ExpenseStore + Clone + Send + Sync,
{
    fn from_ref(state: &AppState<U, I, E>) -> Self {
        Self {
            user_store: state.user_store.clone(),
            decoding_key: state.decoding_key.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token in the
/// Authorization header.
///
/// On success a [CurrentUser] is placed into the request extensions and the
/// request executes normally; otherwise a 401 failure envelope is returned.
pub async fn protect<U>(
    State(state): State<GuardState<U>>,
    request: Request,
    next: Next,
) -> Response
where
    U: UserStore + Clone + Send + Sync + 'static,
{
    let (mut parts, body) = request.into_parts();

    let bearer = match parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
    {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(_) => {
            return fail(
                StatusCode::UNAUTHORIZED,
                "You are not logged in! Please log in to get access.",
            );
        }
    };

    let claims = match decode_token(bearer.token(), &state.decoding_key) {
        Ok(claims) => claims,
        Err(_) => {
            return fail(
                StatusCode::UNAUTHORIZED,
                "Invalid token. Please log in again.",
            );
        }
    };

    let user = match state.user_store.get(UserID::new(claims.id)) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            return fail(
                StatusCode::UNAUTHORIZED,
                "The user belonging to this token does no longer exist.",
            );
        }
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(CurrentUser {
        id: user.id().as_i64(),
        name: user.name().to_owned(),
        email: user.email().to_string(),
    });

    next.run(Request::from_parts(parts, body)).await
}
