use axum::BoxError;
use axum::http::StatusCode;
use axum::http::header::{InvalidHeaderName, InvalidHeaderValue, ToStrError};
use axum::response::{IntoResponse, Response};

use crate::identity::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Token key error: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] InvalidHeaderName),
    #[error("Invalid token lifetime: {0} seconds")]
    TokenLifetime(i64),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("No credentials provided")]
    NoCredentials,
    #[error("No token provided")]
    NoToken,
    #[error("No token signing key configured")]
    MissingKey,
    #[error("Token subject is not a user id")]
    InvalidSubject,
    #[error("Expired JWT")]
    ExpiredJWT,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("Blocking task error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Header decode error: {0}")]
    HeaderDecode(#[from] ToStrError),
    #[error("Invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("{:?}", self);

        let (status, message) = match self {
            Error::Jwt(_) => (StatusCode::INTERNAL_SERVER_ERROR, "JWT error"),
            Error::NoCredentials => (StatusCode::BAD_REQUEST, "No credentials provided"),
            Error::NoToken => (StatusCode::BAD_REQUEST, "No token provided"),
            Error::MissingKey => (StatusCode::INTERNAL_SERVER_ERROR, "Token signing unavailable"),
            Error::InvalidSubject => (StatusCode::UNAUTHORIZED, "Token subject is not a user id"),
            Error::ExpiredJWT => (StatusCode::UNAUTHORIZED, "Expired JWT"),
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            Error::Registry(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Registry error"),
            Error::Bcrypt(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Bcrypt error"),
            Error::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
            Error::HeaderDecode(_) => (StatusCode::BAD_REQUEST, "Header decode error"),
            Error::Header(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Invalid header value"),
        };

        (status, message).into_response()
    }
}

pub(crate) async fn handle_middleware_errors(err: BoxError) -> (StatusCode, &'static str) {
    tracing::error!("Unhandled error: {:?}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}
