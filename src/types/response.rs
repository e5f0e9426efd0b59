use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::identity::credentials::CredentialsCheck;
use crate::identity::pair::{StringTokenPair, TokenPair};
use crate::identity::provider::{SigninResult, SignupResult};
use crate::types::user::AuthorizedUser;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct User {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<&AuthorizedUser> for User {
    fn from(user: &AuthorizedUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Signup {
    pub(crate) user: Option<User>,
    pub(crate) already_exists: bool,
    pub(crate) invalid_credentials: bool,
    pub(crate) credentials_check: Option<CredentialsCheck>,
    pub(crate) tokens: StringTokenPair,
}

impl From<SignupResult<AuthorizedUser>> for Signup {
    fn from(result: SignupResult<AuthorizedUser>) -> Self {
        Self {
            user: result.user.as_ref().map(User::from),
            already_exists: result.already_exists,
            invalid_credentials: result.invalid_credentials,
            credentials_check: result.credentials_check,
            tokens: string_pair(result.tokens.as_ref()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Signin {
    pub(crate) user: Option<User>,
    pub(crate) not_authorized: bool,
    pub(crate) user_not_found: bool,
    pub(crate) invalid_credentials: bool,
    pub(crate) tokens: StringTokenPair,
}

impl From<SigninResult<AuthorizedUser>> for Signin {
    fn from(result: SigninResult<AuthorizedUser>) -> Self {
        Self {
            user: result.user.as_ref().map(User::from),
            not_authorized: result.not_authorized,
            user_not_found: result.user_not_found,
            invalid_credentials: result.invalid_credentials,
            tokens: string_pair(result.tokens.as_ref()),
        }
    }
}

fn string_pair(tokens: Option<&TokenPair>) -> StringTokenPair {
    tokens.map(TokenPair::as_string_pair).unwrap_or_default()
}
