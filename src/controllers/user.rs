use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::{self, Error};
use crate::identity::credentials::{
    Credentials, CredentialsCheck, FieldCheck, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH,
    PASSWORD_FIELD, USERNAME_FIELD,
};
use crate::identity::registry::{CreateUserResult, RegistryError, UserStub, UsersRegistry};
use crate::types::user::AuthorizedUser;

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<Uuid, AuthorizedUser>,
    by_username: HashMap<String, Uuid>,
}

impl Users {
    fn get_by_username(&self, username: &str) -> Option<&AuthorizedUser> {
        self.by_username
            .get(username)
            .and_then(|id| self.by_id.get(id))
    }
}

/// In-memory user registry with bcrypt-hashed passwords.
#[derive(Clone)]
pub(crate) struct UserController {
    users: Arc<RwLock<Users>>,
    username_pattern: Regex,
    bcrypt_cost: u32,
}

impl std::fmt::Debug for UserController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserController")
            .field("username_pattern", &self.username_pattern.as_str())
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl UserController {
    pub(crate) fn new(bcrypt_cost: u32) -> Result<Self, error::ConfigError> {
        Ok(Self {
            users: Arc::new(RwLock::new(Users::default())),
            username_pattern: Regex::new(r"^[a-zA-Z0-9_.-]{3,64}$")?,
            bcrypt_cost,
        })
    }

    async fn hash(&self, password: &str) -> Result<String, Error> {
        let (password, cost) = (password.to_owned(), self.bcrypt_cost);

        Ok(tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, Error> {
        let (password, hash) = (password.to_owned(), hash.to_owned());

        Ok(tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
    }
}

#[async_trait]
impl UsersRegistry for UserController {
    type User = AuthorizedUser;

    async fn create_user(
        &self,
        stub: UserStub,
    ) -> Result<CreateUserResult<AuthorizedUser>, RegistryError> {
        let username = stub.credentials.get(USERNAME_FIELD);

        if let Some(existing) = self.users.read().await.get_by_username(username) {
            return Ok(CreateUserResult::already_exists(Some(existing.clone())));
        }

        let password_hash = self.hash(stub.credentials.get(PASSWORD_FIELD)).await?;

        let mut users = self.users.write().await;

        // Another sign up may have won while the password was hashing.
        if let Some(existing) = users.get_by_username(username) {
            return Ok(CreateUserResult::already_exists(Some(existing.clone())));
        }

        let user = AuthorizedUser {
            id: stub.id,
            username: username.to_owned(),
            password_hash,
            created_at: Utc::now(),
        };

        users.by_username.insert(user.username.clone(), user.id);
        users.by_id.insert(user.id, user.clone());

        tracing::debug!(user_id = %user.id, "user created");

        Ok(CreateUserResult::created(user))
    }

    async fn get_user_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<AuthorizedUser>, RegistryError> {
        let users = self.users.read().await;

        Ok(users
            .get_by_username(credentials.get(USERNAME_FIELD))
            .cloned())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<AuthorizedUser>, RegistryError> {
        Ok(self.users.read().await.by_id.get(&id).cloned())
    }

    async fn check_fields_correctness(
        &self,
        credentials: &Credentials,
    ) -> Result<CredentialsCheck, RegistryError> {
        let username = credentials.get(USERNAME_FIELD);
        let password_length = credentials.get(PASSWORD_FIELD).chars().count();

        let username_check = if self.username_pattern.is_match(username) {
            FieldCheck::correct()
        } else {
            FieldCheck::incorrect(
                "Username must be 3 to 64 letters, digits, dots, dashes or underscores",
            )
        };

        let password_check =
            if (MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&password_length) {
                FieldCheck::correct()
            } else {
                FieldCheck::incorrect(format!(
                    "Password min length is {MIN_PASSWORD_LENGTH} and max length is {MAX_PASSWORD_LENGTH}"
                ))
            };

        Ok(CredentialsCheck::new()
            .with(USERNAME_FIELD, username_check)
            .with(PASSWORD_FIELD, password_check))
    }

    async fn user_has_credentials(
        &self,
        user: &AuthorizedUser,
        credentials: &Credentials,
    ) -> Result<bool, RegistryError> {
        Ok(self
            .verify(credentials.get(PASSWORD_FIELD), &user.password_hash)
            .await?)
    }
}
