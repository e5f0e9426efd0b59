use chrono::TimeDelta;
use tracing::instrument;
use uuid::Uuid;

use crate::core::error::Error;
use crate::identity::credentials::{Credentials, CredentialsCheck};
use crate::identity::pair::TokenPair;
use crate::identity::registry::{User, UserStub, UsersRegistry};
use crate::identity::token::{Token, TokenCodec, TokenPurpose};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: TimeDelta,
    pub refresh: TimeDelta,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: TimeDelta::minutes(15),
            refresh: TimeDelta::days(7),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SignupResult<U> {
    pub user: Option<U>,
    pub already_exists: bool,
    pub invalid_credentials: bool,
    pub credentials_check: Option<CredentialsCheck>,
    pub tokens: Option<TokenPair>,
}

impl<U> SignupResult<U> {
    fn created(user: Option<U>, tokens: TokenPair) -> Self {
        Self {
            user,
            already_exists: false,
            invalid_credentials: false,
            credentials_check: None,
            tokens: Some(tokens),
        }
    }

    fn already_exists() -> Self {
        Self {
            user: None,
            already_exists: true,
            invalid_credentials: false,
            credentials_check: None,
            tokens: None,
        }
    }

    fn invalid_credentials(check: CredentialsCheck) -> Self {
        Self {
            user: None,
            already_exists: false,
            invalid_credentials: true,
            credentials_check: Some(check),
            tokens: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SigninResult<U> {
    pub user: Option<U>,
    pub not_authorized: bool,
    pub user_not_found: bool,
    pub invalid_credentials: bool,
    pub tokens: Option<TokenPair>,
}

impl<U> SigninResult<U> {
    fn authorized(user: U, tokens: TokenPair) -> Self {
        Self {
            user: Some(user),
            not_authorized: false,
            user_not_found: false,
            invalid_credentials: false,
            tokens: Some(tokens),
        }
    }

    fn user_not_found() -> Self {
        Self {
            user: None,
            not_authorized: true,
            user_not_found: true,
            invalid_credentials: false,
            tokens: None,
        }
    }

    fn invalid_credentials() -> Self {
        Self {
            user: None,
            not_authorized: true,
            user_not_found: false,
            invalid_credentials: true,
            tokens: None,
        }
    }
}

/// Sign up, sign in, refresh and token-to-user resolution on top of a
/// `UsersRegistry`.
///
/// Holds no per-user state. Every operation either succeeds, succeeds with a
/// negative outcome flagged in its result, or fails with an error; registry
/// and signing errors are returned as is.
#[derive(Clone, Debug)]
pub struct RegistryProvider<R> {
    registry: R,
    codec: TokenCodec,
    lifetimes: TokenLifetimes,
}

impl<R: UsersRegistry> RegistryProvider<R> {
    pub fn new(registry: R, codec: TokenCodec, lifetimes: TokenLifetimes) -> Self {
        Self {
            registry,
            codec,
            lifetimes,
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    #[instrument(skip_all)]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SigninResult<R::User>, Error> {
        if credentials.is_empty() {
            return Err(Error::NoCredentials);
        }

        let Some(user) = self.registry.get_user_by_credentials(credentials).await? else {
            tracing::debug!("no user matches the credentials");
            return Ok(SigninResult::user_not_found());
        };

        if !self.registry.user_has_credentials(&user, credentials).await? {
            tracing::debug!(user_id = %user.id(), "credentials mismatch");
            return Ok(SigninResult::invalid_credentials());
        }

        let tokens = self.issue_token_pair(&user.id())?;

        Ok(SigninResult::authorized(user, tokens))
    }

    #[instrument(skip_all)]
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<SignupResult<R::User>, Error> {
        if credentials.is_empty() {
            return Err(Error::NoCredentials);
        }

        let check = self.registry.check_fields_correctness(credentials).await?;

        if let Some(field) = check.has_incorrect().map(|(field, _)| field.to_owned()) {
            tracing::debug!(field = %field, "incorrect sign up field");
            return Ok(SignupResult::invalid_credentials(check));
        }

        let user_id = Uuid::now_v7();

        let created = self
            .registry
            .create_user(UserStub {
                id: user_id,
                credentials: credentials.clone(),
            })
            .await?;

        if created.already_exists {
            tracing::debug!("user already exists");
            return Ok(SignupResult::already_exists());
        }

        let tokens = self.issue_token_pair(&user_id)?;

        Ok(SignupResult::created(created.user, tokens))
    }

    /// Issues a new pair for the token's subject. The token is expected to
    /// be validated by the caller; it stays usable until it expires.
    #[instrument(skip_all)]
    pub fn refresh(&self, token: Option<&Token>) -> Result<TokenPair, Error> {
        let token = token.ok_or(Error::NoToken)?;
        let user_id = token.user_id().ok_or(Error::InvalidSubject)?;

        self.issue_token_pair(&user_id)
    }

    #[instrument(skip_all)]
    pub async fn get_token_user(&self, token: Option<&Token>) -> Result<Option<R::User>, Error> {
        let token = token.ok_or(Error::NoToken)?;
        let user_id = token.user_id().ok_or(Error::InvalidSubject)?;

        Ok(self.registry.get_user_by_id(user_id).await?)
    }

    fn issue_token_pair(&self, user_id: &Uuid) -> Result<TokenPair, Error> {
        let sign = |purpose, duration| {
            self.codec
                .sign(user_id, purpose, duration)
                .inspect_err(|e| tracing::error!(%user_id, ?purpose, "token signing failure: {e}"))
        };

        let access = sign(TokenPurpose::Access, self.lifetimes.access)?;
        let refresh = sign(TokenPurpose::Refresh, self.lifetimes.refresh)?;

        Ok(TokenPair::new(access, refresh))
    }
}
