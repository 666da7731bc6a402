//! Defines the user store trait.

use email_address::EmailAddress;

use crate::{
    Error,
    models::{PasswordHash, User, UserID},
};

/// The fields needed to create a new user.
pub struct NewUser {
    /// The user's display name.
    pub name: String,
    /// The user's email address. Must be unique.
    pub email: EmailAddress,
    /// The user's hashed password.
    pub password_hash: PasswordHash,
    /// The user's hashed PIN.
    pub pin_hash: PasswordHash,
}

/// Handles the creation and retrieval of User objects.
pub trait UserStore {
    /// Create a new user.
    ///
    /// Returns [Error::DuplicateEmail] if the email is already taken.
    fn create(&mut self, new_user: NewUser) -> Result<User, Error>;

    /// Get a user by their ID.
    ///
    /// Returns [Error::NotFound] if no user with the given ID exists.
    fn get(&self, id: UserID) -> Result<User, Error>;

    /// Get a user by their email.
    ///
    /// The match is exact and case-sensitive. Returns [Error::NotFound] if no
    /// user with the given email exists.
    fn get_by_email(&self, email: &EmailAddress) -> Result<User, Error>;
}
