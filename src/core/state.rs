use chrono::TimeDelta;

use crate::controllers::user::UserController;
use crate::core::config::{Args, parse_audience};
use crate::core::error::ConfigError;
use crate::identity::provider::{RegistryProvider, TokenLifetimes};
use crate::identity::token::{BaseClaims, TokenCodec, TokenKeys};
use crate::utils::auth::{Guard, TokenHeaders};

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pub(crate) provider: RegistryProvider<UserController>,
    pub(crate) guard: Guard<UserController>,
    pub(crate) token_headers: TokenHeaders,
}

impl AppState {
    pub(crate) fn new(args: &Args) -> Result<Self, ConfigError> {
        let private_pem = std::fs::read(&args.private_key_path)?;
        let public_pem = std::fs::read(&args.public_key_path)?;

        let codec = TokenCodec::new(
            Some(TokenKeys::from_ec_pem(&private_pem, &public_pem)?),
            BaseClaims::new(args.issuer.clone(), parse_audience(&args.audience)),
        );

        let lifetimes = TokenLifetimes {
            access: lifetime(args.access_token_ttl)?,
            refresh: lifetime(args.refresh_token_ttl)?,
        };

        let token_headers = TokenHeaders::new(&args.access_token_header, &args.refresh_token_header)?;

        tracing::debug!(
            issuer = %args.issuer,
            access_ttl = args.access_token_ttl,
            refresh_ttl = args.refresh_token_ttl,
            "token codec configured"
        );

        Ok(Self::from_parts(
            UserController::new(args.bcrypt_cost)?,
            codec,
            lifetimes,
            token_headers,
        ))
    }

    pub(crate) fn from_parts(
        users: UserController,
        codec: TokenCodec,
        lifetimes: TokenLifetimes,
        token_headers: TokenHeaders,
    ) -> Self {
        let provider = RegistryProvider::new(users, codec, lifetimes);

        AppState {
            guard: Guard::new(provider.clone(), token_headers.clone()),
            provider,
            token_headers,
        }
    }
}

fn lifetime(seconds: i64) -> Result<TimeDelta, ConfigError> {
    match TimeDelta::try_seconds(seconds) {
        Some(ttl) if ttl > TimeDelta::zero() => Ok(ttl),
        _ => Err(ConfigError::TokenLifetime(seconds)),
    }
}
