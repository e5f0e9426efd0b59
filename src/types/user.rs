use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::identity::registry::User;

#[derive(Clone, Debug)]
pub(crate) struct AuthorizedUser {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) password_hash: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl User for AuthorizedUser {
    fn id(&self) -> Uuid {
        self.id
    }
}
