use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::identity::credentials::{
    Credentials, CredentialsCheck, FieldCheck, PASSWORD_FIELD, USERNAME_FIELD,
};
use crate::identity::registry::{CreateUserResult, RegistryError, User, UserStub, UsersRegistry};
use crate::identity::token::{BaseClaims, TokenCodec, TokenKeys};

pub(crate) fn test_keys() -> TokenKeys {
    TokenKeys::from_ec_pem(
        include_bytes!("../../keys/test_es256_private.pem"),
        include_bytes!("../../keys/test_es256_public.pem"),
    )
    .unwrap()
}

pub(crate) fn other_keys() -> TokenKeys {
    TokenKeys::from_ec_pem(
        include_bytes!("../../keys/test_es256_other_private.pem"),
        include_bytes!("../../keys/test_es256_other_public.pem"),
    )
    .unwrap()
}

pub(crate) fn test_codec() -> TokenCodec {
    TokenCodec::new(Some(test_keys()), BaseClaims::default())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TestUser {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) password: String,
}

impl User for TestUser {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Plain-text registry keyed by username.
#[derive(Clone, Debug, Default)]
pub(crate) struct MockUserRegistry {
    users: Arc<Mutex<HashMap<String, TestUser>>>,
}

impl MockUserRegistry {
    pub(crate) fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UsersRegistry for MockUserRegistry {
    type User = TestUser;

    async fn create_user(
        &self,
        stub: UserStub,
    ) -> Result<CreateUserResult<TestUser>, RegistryError> {
        let username = stub.credentials.get(USERNAME_FIELD);
        let mut users = self.users.lock().unwrap();

        if let Some(existing) = users.get(username) {
            return Ok(CreateUserResult::already_exists(Some(existing.clone())));
        }

        let user = TestUser {
            id: stub.id,
            username: username.to_owned(),
            password: stub.credentials.get(PASSWORD_FIELD).to_owned(),
        };
        users.insert(user.username.clone(), user.clone());

        Ok(CreateUserResult::created(user))
    }

    async fn get_user_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<TestUser>, RegistryError> {
        let users = self.users.lock().unwrap();

        Ok(users.get(credentials.get(USERNAME_FIELD)).cloned())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<TestUser>, RegistryError> {
        let users = self.users.lock().unwrap();

        Ok(users.values().find(|user| user.id == id).cloned())
    }

    async fn check_fields_correctness(
        &self,
        credentials: &Credentials,
    ) -> Result<CredentialsCheck, RegistryError> {
        let check = |field: &str| {
            if credentials.get(field).is_empty() {
                FieldCheck::incorrect(format!("`{field}` should be non empty"))
            } else {
                FieldCheck::correct()
            }
        };

        Ok(CredentialsCheck::new()
            .with(USERNAME_FIELD, check(USERNAME_FIELD))
            .with(PASSWORD_FIELD, check(PASSWORD_FIELD)))
    }

    async fn user_has_credentials(
        &self,
        user: &TestUser,
        credentials: &Credentials,
    ) -> Result<bool, RegistryError> {
        Ok(user.password == credentials.get(PASSWORD_FIELD))
    }
}

/// Registry whose storage is unreachable.
#[derive(Clone, Debug)]
pub(crate) struct FailingRegistry;

#[async_trait]
impl UsersRegistry for FailingRegistry {
    type User = TestUser;

    async fn create_user(&self, _: UserStub) -> Result<CreateUserResult<TestUser>, RegistryError> {
        Err("registry is down".into())
    }

    async fn get_user_by_credentials(
        &self,
        _: &Credentials,
    ) -> Result<Option<TestUser>, RegistryError> {
        Err("registry is down".into())
    }

    async fn get_user_by_id(&self, _: Uuid) -> Result<Option<TestUser>, RegistryError> {
        Err("registry is down".into())
    }

    async fn check_fields_correctness(
        &self,
        _: &Credentials,
    ) -> Result<CredentialsCheck, RegistryError> {
        Ok(CredentialsCheck::new()
            .with(USERNAME_FIELD, FieldCheck::correct())
            .with(PASSWORD_FIELD, FieldCheck::correct()))
    }

    async fn user_has_credentials(
        &self,
        _: &TestUser,
        _: &Credentials,
    ) -> Result<bool, RegistryError> {
        Err("registry is down".into())
    }
}
