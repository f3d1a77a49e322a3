use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainResult, UserId};

use crate::{Owned, validate};

/// A registered user, as exposed outside of the store.
///
/// The password hash never leaves the persistence layer in this type; see
/// [`UserCredentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A profile is owned by the user it describes.
impl Owned for User {
    fn owner_id(&self) -> UserId {
        self.id
    }
}

/// A user together with the stored password hash (login only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Insert payload for a new user. New users are never admins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial update applied by the store; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Registration request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterUser {
    pub fn validate(&self) -> DomainResult<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// Login request. Users log in by email; the username plays no part.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginUser {
    pub email: String,
    pub password: String,
}

impl LoginUser {
    pub fn validate(&self) -> DomainResult<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// Profile update request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UpdateUser {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        Ok(())
    }
}

fn validate_username(username: &str) -> DomainResult<()> {
    validate::length("username", username, 2, 15)
}

fn validate_email(email: &str) -> DomainResult<()> {
    validate::length("email", email, 3, 20)?;
    validate::email("email", email)
}

fn validate_password(password: &str) -> DomainResult<()> {
    validate::min_length("password", password, 6)
}
