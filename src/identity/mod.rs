//! Identity core: credentials, signed token pairs and the registry-backed
//! provider that issues them.

pub mod credentials;
pub mod pair;
pub mod provider;
pub mod registry;
pub mod token;

#[cfg(test)]
pub(crate) mod mock;

pub use credentials::{Credentials, CredentialsCheck, FieldCheck, PlainCredentials};
pub use pair::{StringTokenPair, TokenPair, ValidatedToken, ValidatedTokenPair};
pub use provider::{RegistryProvider, SigninResult, SignupResult, TokenLifetimes};
pub use registry::{CreateUserResult, RegistryError, User, UserStub, UsersRegistry};
pub use token::{BaseClaims, Claims, Token, TokenCodec, TokenKeys, TokenPurpose, TokenValidation};
