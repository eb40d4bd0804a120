//! Identity types shared by the auth facade and the session store.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// The signed-in user, as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// An authenticated identity: the user plus their bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: SecretString,
}

impl Session {
    pub fn new(user: User, token: impl Into<String>) -> Self {
        Self {
            user,
            token: SecretString::from(token.into()),
        }
    }

    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}
