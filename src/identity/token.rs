use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{self, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Error;
use crate::identity::pair::ValidatedToken;

pub const ALGORITHM: Algorithm = Algorithm::ES256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenPurpose {
    Access,
    Refresh,
}

impl TokenPurpose {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Access => "at",
            Self::Refresh => "rt",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jti: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iss: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aud: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BaseClaims {
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub audience: Vec<String>,
}

impl BaseClaims {
    pub fn new(issuer: impl Into<String>, audience: Vec<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience,
        }
    }

    /// Fills the issuer only when the filler has none and appends the base
    /// audience as is, duplicates included.
    pub fn merge(&self, mut filler: Claims) -> Claims {
        if filler.iss.is_empty() {
            filler.iss.clone_from(&self.issuer);
        }

        filler.aud.extend(self.audience.iter().cloned());
        filler
    }
}

#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_ec_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self {
            encoding: EncodingKey::from_ec_pem(private_pem)?,
            decoding: DecodingKey::from_ec_pem(public_pem)?,
        })
    }
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}

/// A signed token: the compact string and, once parsed or issued, its claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    raw: String,
    claims: Option<Claims>,
}

impl Token {
    pub fn new(raw: impl Into<String>, claims: Option<Claims>) -> Self {
        Self {
            raw: raw.into(),
            claims,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        let claims = self.claims.as_ref()?;

        Uuid::try_parse(&claims.sub).ok()
    }

    pub fn remaining(&self) -> Option<TimeDelta> {
        let claims = self.claims.as_ref()?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)?;

        Some(expires_at - Utc::now())
    }

    pub fn as_cookie(&self, name: &str) -> String {
        let Some(remaining) = self.remaining() else {
            return format!("{name}={}", self.raw);
        };

        let max_age = match remaining.num_seconds() {
            secs if secs <= 0 => -1,
            secs => secs,
        };

        format!(
            "{name}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}",
            self.raw
        )
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Outcome of parsing an inbound token. At most one flag is set.
#[derive(Debug, Default)]
pub struct TokenValidation {
    pub error: Option<jsonwebtoken::errors::Error>,
    pub is_expired: bool,
    pub is_malformed: bool,
    pub is_parse_error: bool,
}

impl TokenValidation {
    pub fn expired() -> Self {
        Self {
            is_expired: true,
            ..Self::default()
        }
    }

    /// Sorts a decode failure into expired or malformed. Key and crypto
    /// failures are not a property of the token and come back as `Err`.
    pub fn from_error(err: jsonwebtoken::errors::Error) -> Result<Self, Error> {
        let mut validation = Self::default();

        match err.kind() {
            ErrorKind::ExpiredSignature => validation.is_expired = true,
            ErrorKind::InvalidToken
            | ErrorKind::Json(_)
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::Base64(_)
            | ErrorKind::Utf8(_) => validation.is_malformed = true,
            _ => return Err(Error::Jwt(err)),
        }

        validation.error = Some(err);
        Ok(validation)
    }

    pub fn parse_error(typ: &str) -> Self {
        tracing::debug!(typ, "unexpected token type");

        Self {
            error: Some(ErrorKind::InvalidToken.into()),
            is_parse_error: true,
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none() && !self.is_expired && !self.is_malformed && !self.is_parse_error
    }
}

/// Signs and parses ES256 tokens. Cheap to clone; keys are shared.
#[derive(Clone, Debug)]
pub struct TokenCodec {
    keys: Option<Arc<TokenKeys>>,
    base_claims: Arc<BaseClaims>,
}

impl TokenCodec {
    pub fn new(keys: Option<TokenKeys>, base_claims: BaseClaims) -> Self {
        Self {
            keys: keys.map(Arc::new),
            base_claims: Arc::new(base_claims),
        }
    }

    pub fn base_claims(&self) -> &BaseClaims {
        &self.base_claims
    }

    pub fn sign(
        &self,
        user_id: &Uuid,
        purpose: TokenPurpose,
        duration: TimeDelta,
    ) -> Result<Token, Error> {
        let keys = self.keys.as_deref().ok_or(Error::MissingKey)?;

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let uid = user_id.to_string();
        let nanos = now.timestamp_nanos_opt().unwrap_or_default();

        let claims = self.base_claims.merge(Claims {
            jti: format!("{}-{uid}-{nanos}", purpose.prefix()),
            sub: uid,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            ..Claims::default()
        });

        let raw = jsonwebtoken::encode(&Header::new(ALGORITHM), &claims, &keys.encoding)?;

        Ok(Token::new(raw, Some(claims)))
    }

    pub fn parse(&self, raw: &str) -> Result<ValidatedToken, Error> {
        let keys = self.keys.as_deref().ok_or(Error::MissingKey)?;

        if let Ok(Header { typ: Some(typ), .. }) = jsonwebtoken::decode_header(raw) {
            if !typ.eq_ignore_ascii_case("JWT") {
                return Ok(ValidatedToken::new(
                    Token::new(raw, None),
                    TokenValidation::parse_error(&typ),
                ));
            }
        }

        let now = Utc::now().timestamp();

        match jsonwebtoken::decode::<Claims>(raw, &keys.decoding, &self.validation()) {
            Ok(data) if data.claims.iat > now => Ok(ValidatedToken::new(
                Token::new(raw, None),
                TokenValidation::from_error(ErrorKind::ImmatureSignature.into())?,
            )),
            // Second resolution: a token expiring this very second is already spent.
            Ok(data) if data.claims.exp <= now => Ok(ValidatedToken::new(
                Token::new(raw, Some(data.claims)),
                TokenValidation::expired(),
            )),
            Ok(data) => Ok(ValidatedToken::new(
                Token::new(raw, Some(data.claims)),
                TokenValidation::default(),
            )),
            Err(err) => {
                let claims = match err.kind() {
                    ErrorKind::ExpiredSignature => self.expired_claims(raw, keys),
                    _ => None,
                };

                let validation = TokenValidation::from_error(err)?;

                Ok(ValidatedToken::new(Token::new(raw, claims), validation))
            }
        }
    }

    // Signature is checked before expiry, so an expired token still carries
    // trustworthy claims.
    fn expired_claims(&self, raw: &str, keys: &TokenKeys) -> Option<Claims> {
        let mut validation = self.validation();
        validation.validate_exp = false;

        jsonwebtoken::decode::<Claims>(raw, &keys.decoding, &validation)
            .ok()
            .map(|data| data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        if !self.base_claims.issuer.is_empty() {
            validation.set_issuer(&[&self.base_claims.issuer]);
        }

        if self.base_claims.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(self.base_claims.audience.as_slice());
        }

        validation
    }
}
