//! Bearer-token authentication: token signing, verification, and the route
//! guard that resolves a token to a user.

mod middleware;

pub use middleware::{CurrentUser, GuardState, protect};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, models::UserID};

/// The contents of a bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub id: i64,
    /// The time the token was issued as a unix timestamp.
    pub iat: usize,
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
}

/// Sign a bearer token carrying `user_id` that expires after `expires_in`.
///
/// # Errors
/// Returns an [Error::TokenError] if the token could not be signed.
pub fn sign_token(
    user_id: UserID,
    encoding_key: &EncodingKey,
    expires_in: Duration,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        id: user_id.as_i64(),
        iat: now.unix_timestamp() as usize,
        exp: (now + expires_in).unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, encoding_key)
        .map_err(|error| Error::TokenError(error.to_string()))
}

/// Verify a bearer token and return its claims.
///
/// # Errors
/// Returns an [Error::TokenError] if the token is malformed, carries a bad
/// signature, or has expired.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| Error::TokenError(error.to_string()))
}
