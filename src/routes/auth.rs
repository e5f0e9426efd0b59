use axum::Json;
use axum::extract::{Extension, State};
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use crate::core::error::Error;
use crate::core::state::AppState;
use crate::identity::credentials::{Credentials, PlainCredentials};
use crate::identity::pair::{TokenPair, ValidatedToken};
use crate::identity::token::TokenValidation;
use crate::types::response;
use crate::types::user::AuthorizedUser;
use crate::utils::auth::TokenHeaders;

#[instrument(skip_all)]
pub(crate) async fn signup(
    State(state): State<AppState>,
    Json(plain): Json<PlainCredentials>,
) -> Result<Response, Error> {
    if let Err(message) = plain.is_valid() {
        return Ok((StatusCode::BAD_REQUEST, message).into_response());
    }

    let result = state.provider.sign_up(&Credentials::from(plain)).await?;

    let status = if result.already_exists {
        StatusCode::CONFLICT
    } else if result.invalid_credentials {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };

    Ok((status, Json(response::Signup::from(result))).into_response())
}

#[instrument(skip_all)]
pub(crate) async fn signin(
    State(state): State<AppState>,
    Json(plain): Json<PlainCredentials>,
) -> Result<Response, Error> {
    if let Err(message) = plain.is_valid() {
        return Ok((
            StatusCode::BAD_REQUEST,
            format!("Invalid signin credentials: {message}"),
        )
            .into_response());
    }

    let result = state.provider.sign_in(&Credentials::from(plain)).await?;

    let status = match result.not_authorized {
        true => StatusCode::UNAUTHORIZED,
        false => StatusCode::OK,
    };

    Ok((status, Json(response::Signin::from(result))).into_response())
}

#[instrument(skip_all)]
pub(crate) async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    let ValidatedToken { token, validation } = state
        .guard
        .tokens_from_headers(&headers)?
        .refresh_token
        .ok_or(Error::NoToken)?;

    if let Some(err) = rejection(validation) {
        return Err(err);
    }

    let tokens = state.provider.refresh(Some(&token))?;

    respond_with_token_pair(&state.token_headers, &tokens)
}

#[instrument(skip_all)]
pub(crate) async fn check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    let Some(ValidatedToken { token, validation }) =
        state.guard.tokens_from_headers(&headers)?.access_token
    else {
        return Ok((StatusCode::UNAUTHORIZED, "Unauthorized: no access token").into_response());
    };

    if let Some(err) = rejection(validation) {
        return Err(err);
    }

    let remaining = token.remaining().map_or(0, |left| left.num_seconds());

    Ok(format!("CheckAuth: token is valid for duration: {remaining}s").into_response())
}

pub(crate) async fn current_user(Extension(user): Extension<AuthorizedUser>) -> impl IntoResponse {
    Json(response::User::from(&user))
}

fn rejection(validation: TokenValidation) -> Option<Error> {
    if validation.is_expired {
        return Some(Error::ExpiredJWT);
    }

    if validation.is_malformed {
        return Some(Error::Unauthorized);
    }

    validation.error.map(Error::Jwt)
}

fn respond_with_token_pair(names: &TokenHeaders, tokens: &TokenPair) -> Result<Response, Error> {
    let mut headers = HeaderMap::new();

    for (name, token) in [
        (&names.access, &tokens.access_token),
        (&names.refresh, &tokens.refresh_token),
    ] {
        let Some(token) = token else { continue };

        headers.insert(name.clone(), HeaderValue::from_str(token.raw())?);
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_str(&token.as_cookie(name.as_str()))?,
        );
    }

    let body = format!(
        "Success: {} tokens, {}, have been placed to headers",
        tokens.count(),
        tokens.kinds()
    );

    Ok((headers, body).into_response())
}
