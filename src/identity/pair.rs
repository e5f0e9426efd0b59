use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::token::{Token, TokenValidation};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: Option<Token>,
    pub refresh_token: Option<Token>,
}

/// What leaves the service: raw compact strings only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StringTokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: Token, refresh_token: Token) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
        }
    }

    pub fn as_string_pair(&self) -> StringTokenPair {
        StringTokenPair {
            access_token: self
                .access_token
                .as_ref()
                .map(|token| token.raw().to_owned())
                .unwrap_or_default(),
            refresh_token: self
                .refresh_token
                .as_ref()
                .map(|token| token.raw().to_owned())
                .unwrap_or_default(),
        }
    }

    pub fn count(&self) -> usize {
        usize::from(self.access_token.is_some()) + usize::from(self.refresh_token.is_some())
    }

    pub fn kinds(&self) -> &'static str {
        match (&self.access_token, &self.refresh_token) {
            (Some(_), Some(_)) => "Access Token and Refresh Token",
            (Some(_), None) => "Access Token",
            (None, Some(_)) => "Refresh Token",
            (None, None) => "No tokens",
        }
    }
}

#[derive(Debug)]
pub struct ValidatedToken {
    pub token: Token,
    pub validation: TokenValidation,
}

impl ValidatedToken {
    pub fn new(token: Token, validation: TokenValidation) -> Self {
        Self { token, validation }
    }

    pub fn is_valid(&self) -> bool {
        self.validation.is_ok()
    }
}

/// Tokens found on an inbound request, each with its own validation outcome.
#[derive(Debug, Default)]
pub struct ValidatedTokenPair {
    pub access_token: Option<ValidatedToken>,
    pub refresh_token: Option<ValidatedToken>,
}

impl ValidatedTokenPair {
    pub fn has_valid_access(&self) -> bool {
        self.access_token
            .as_ref()
            .is_some_and(ValidatedToken::is_valid)
    }

    /// Subject of the access token, falling back to the refresh token.
    pub fn user_id(&self) -> Option<Uuid> {
        self.access_token
            .as_ref()
            .and_then(|access| access.token.user_id())
            .or_else(|| {
                self.refresh_token
                    .as_ref()
                    .and_then(|refresh| refresh.token.user_id())
            })
    }
}
