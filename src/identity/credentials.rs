use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const USERNAME_FIELD: &str = "username";
pub const PASSWORD_FIELD: &str = "password";

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 64;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 64;

/// Login fields keyed by their semantic name, e.g. `username` and `password`.
///
/// The set of fields is not fixed: it is up to the `UsersRegistry` to decide
/// which of them identify a user and which of them prove the identity.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Credentials(HashMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(field.into(), value.into())
    }

    /// Returns the field value, or an empty string when the field is absent.
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(String::as_str).unwrap_or_default()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

// Values are secrets more often than not.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("fields", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCheck {
    pub is_correct: bool,
    pub details: String,
}

impl FieldCheck {
    pub fn correct() -> Self {
        Self {
            is_correct: true,
            details: String::new(),
        }
    }

    pub fn incorrect(details: impl Into<String>) -> Self {
        Self {
            is_correct: false,
            details: details.into(),
        }
    }
}

/// Per-field correctness report produced by a `UsersRegistry` during sign up.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CredentialsCheck(HashMap<String, FieldCheck>);

impl CredentialsCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, check: FieldCheck) -> Self {
        self.0.insert(field.into(), check);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, check: FieldCheck) -> Option<FieldCheck> {
        self.0.insert(field.into(), check)
    }

    pub fn get(&self, field: &str) -> Option<&FieldCheck> {
        self.0.get(field)
    }

    /// First field marked as incorrect. Iteration order is unspecified.
    pub fn has_incorrect(&self) -> Option<(&str, &FieldCheck)> {
        self.0
            .iter()
            .find(|(_, check)| !check.is_correct)
            .map(|(field, check)| (field.as_str(), check))
    }
}

/// Fixed-shape username/password pair as it arrives in a request body.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct PlainCredentials {
    pub username: String,
    pub password: String,
}

impl PlainCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Checks the username first, then the password, and stops at the
    /// first violation.
    pub fn is_valid(&self) -> Result<(), String> {
        self.is_valid_username()?;
        self.is_valid_password()
    }

    pub fn is_valid_username(&self) -> Result<(), String> {
        let n = self.username.chars().count();

        if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&n) {
            return Err(format!(
                "Username min length is {MIN_USERNAME_LENGTH} and max length is {MAX_USERNAME_LENGTH}"
            ));
        }

        Ok(())
    }

    pub fn is_valid_password(&self) -> Result<(), String> {
        let n = self.password.chars().count();

        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&n) {
            return Err(format!(
                "Password min length is {MIN_PASSWORD_LENGTH} and max length is {MAX_PASSWORD_LENGTH}"
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for PlainCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl From<PlainCredentials> for Credentials {
    fn from(plain: PlainCredentials) -> Self {
        Credentials::new()
            .with(USERNAME_FIELD, plain.username)
            .with(PASSWORD_FIELD, plain.password)
    }
}
