//! The identity that scopes every read and write.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The ID of an authenticated user.
///
/// Sessions are handled by an external authentication service, this type
/// only guarantees that the ID is not blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user ID.
    ///
    /// # Errors
    ///
    /// Returns [Error::Unauthenticated] if `id` is empty or only whitespace.
    pub fn new(id: &str) -> Result<Self, Error> {
        let id = id.trim();

        if id.is_empty() {
            Err(Error::Unauthenticated)
        } else {
            Ok(Self(id.to_owned()))
        }
    }

    /// Create a user ID without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Get the user ID from the session, failing if no user is logged in.
///
/// # Errors
///
/// Returns [Error::Unauthenticated] if there is no session user or the ID is blank.
pub fn require_user(session_user: Option<&str>) -> Result<UserId, Error> {
    session_user
        .ok_or(Error::Unauthenticated)
        .and_then(UserId::new)
}

#[cfg(test)]
mod tests {
    use crate::{Error, user::require_user};

    use super::UserId;

    #[test]
    fn new_fails_on_blank_id() {
        assert_eq!(UserId::new(" \t"), Err(Error::Unauthenticated));
    }

    #[test]
    fn new_trims_whitespace() {
        let user_id = UserId::new(" user-1 ").unwrap();

        assert_eq!(user_id.as_str(), "user-1");
    }

    #[test]
    fn require_user_fails_without_session() {
        assert_eq!(require_user(None), Err(Error::Unauthenticated));
    }

    #[test]
    fn require_user_returns_session_user() {
        assert_eq!(
            require_user(Some("user-1")),
            Ok(UserId::new_unchecked("user-1"))
        );
    }
}
