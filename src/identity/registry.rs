use async_trait::async_trait;
use uuid::Uuid;

use crate::identity::credentials::{Credentials, CredentialsCheck};

/// Whatever went wrong inside a registry. The provider passes it through
/// untouched.
pub type RegistryError = Box<dyn std::error::Error + Send + Sync>;

pub trait User: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
}

#[derive(Clone, Debug)]
pub struct UserStub {
    pub id: Uuid,
    pub credentials: Credentials,
}

#[derive(Clone, Debug)]
pub struct CreateUserResult<U> {
    pub already_exists: bool,
    pub user: Option<U>,
}

impl<U> CreateUserResult<U> {
    pub fn created(user: U) -> Self {
        Self {
            already_exists: false,
            user: Some(user),
        }
    }

    pub fn already_exists(user: Option<U>) -> Self {
        Self {
            already_exists: true,
            user,
        }
    }
}

#[async_trait]
pub trait UsersRegistry: Send + Sync {
    type User: User;

    /// Must store the user under `stub.id`; issued tokens carry that id.
    async fn create_user(
        &self,
        stub: UserStub,
    ) -> Result<CreateUserResult<Self::User>, RegistryError>;

    async fn get_user_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Self::User>, RegistryError>;

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<Self::User>, RegistryError>;

    async fn check_fields_correctness(
        &self,
        credentials: &Credentials,
    ) -> Result<CredentialsCheck, RegistryError>;

    async fn user_has_credentials(
        &self,
        user: &Self::User,
        credentials: &Credentials,
    ) -> Result<bool, RegistryError>;
}
