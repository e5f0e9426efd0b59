use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::identity::pair::{ValidatedToken, ValidatedTokenPair};
use crate::identity::provider::RegistryProvider;
use crate::identity::registry::{User, UsersRegistry};

pub const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";
pub const REFRESH_TOKEN_HEADER: &str = "X-Refresh-Token";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenHeaders {
    pub access: HeaderName,
    pub refresh: HeaderName,
}

impl Default for TokenHeaders {
    fn default() -> Self {
        Self {
            access: HeaderName::from_static("x-access-token"),
            refresh: HeaderName::from_static("x-refresh-token"),
        }
    }
}

impl TokenHeaders {
    pub fn new(access: &str, refresh: &str) -> Result<Self, header::InvalidHeaderName> {
        Ok(Self {
            access: HeaderName::try_from(access)?,
            refresh: HeaderName::try_from(refresh)?,
        })
    }
}

/// What an optional guard decides when the request carries no access token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnonymousPolicy {
    #[default]
    Allow,
    Deny,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GuardOptions {
    pub is_optional: bool,
    pub is_user_fetch_disabled: bool,
    pub anonymous: AnonymousPolicy,
}

impl GuardOptions {
    pub fn required() -> Self {
        Self::default()
    }

    pub fn optional() -> Self {
        Self {
            is_optional: true,
            ..Self::default()
        }
    }

    pub fn without_user_fetch(self) -> Self {
        Self {
            is_user_fetch_disabled: true,
            ..self
        }
    }

    pub fn with_anonymous(self, anonymous: AnonymousPolicy) -> Self {
        Self { anonymous, ..self }
    }
}

#[derive(Debug)]
pub struct GuardResult<U> {
    pub user: Option<U>,
    pub tokens: ValidatedTokenPair,
    /// Set when the request was turned away and the caller has nothing
    /// left to do but answer `401`.
    pub is_responded: bool,
    pub options: GuardOptions,
}

impl<U: User> GuardResult<U> {
    pub fn is_authorized(&self) -> bool {
        if self.tokens.access_token.is_none() {
            return self.options.is_optional && self.options.anonymous == AnonymousPolicy::Allow;
        }

        self.tokens.has_valid_access() && (self.options.is_optional || self.user.is_some())
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user
            .as_ref()
            .map(User::id)
            .or_else(|| self.tokens.user_id())
    }
}

#[derive(Clone, Debug)]
pub struct Guard<R> {
    provider: RegistryProvider<R>,
    headers: TokenHeaders,
}

impl<R: UsersRegistry> Guard<R> {
    pub fn new(provider: RegistryProvider<R>, headers: TokenHeaders) -> Self {
        Self { provider, headers }
    }

    pub fn headers(&self) -> &TokenHeaders {
        &self.headers
    }

    pub async fn check(
        &self,
        headers: &HeaderMap,
        options: GuardOptions,
    ) -> Result<GuardResult<R::User>, Error> {
        let tokens = self.tokens_from_headers(headers)?;

        let mut result = GuardResult {
            user: None,
            tokens,
            is_responded: false,
            options,
        };

        if !options.is_optional && !result.tokens.has_valid_access() {
            tracing::debug!("access token is either invalid or absent");
            result.is_responded = true;
            return Ok(result);
        }

        if options.is_user_fetch_disabled || !result.tokens.has_valid_access() {
            return Ok(result);
        }

        let access = result.tokens.access_token.as_ref().map(|access| &access.token);
        result.user = self.provider.get_token_user(access).await?;

        Ok(result)
    }

    /// Parses whichever tokens the request carries, headers first, cookies
    /// second. Key-class failures and undecodable token headers are errors.
    pub fn tokens_from_headers(&self, headers: &HeaderMap) -> Result<ValidatedTokenPair, Error> {
        Ok(ValidatedTokenPair {
            access_token: self.parse_from(headers, &self.headers.access)?,
            refresh_token: self.parse_from(headers, &self.headers.refresh)?,
        })
    }

    fn parse_from(
        &self,
        headers: &HeaderMap,
        name: &HeaderName,
    ) -> Result<Option<ValidatedToken>, Error> {
        let from_header = match headers.get(name) {
            Some(value) => Some(value.to_str()?.trim()).filter(|raw| !raw.is_empty()),
            None => None,
        };

        match from_header.or_else(|| cookie_value(headers, name.as_str())) {
            Some(raw) => self.provider.codec().parse(raw).map(Some),
            None => Ok(None),
        }
    }
}

// Cookie headers that are not visible ASCII are skipped.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim())
        })
        .filter(|raw| !raw.is_empty())
}

pub(crate) async fn authorize(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let result = state
        .guard
        .check(request.headers(), GuardOptions::required())
        .await?;

    if result.is_responded || !result.is_authorized() {
        return Err(Error::Unauthorized);
    }

    let Some(user) = result.user else {
        return Err(Error::Unauthorized);
    };

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
