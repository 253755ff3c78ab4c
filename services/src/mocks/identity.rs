use super::InMemoryDatabase;
use async_trait::async_trait;
use recsys_core::error::{RepositoryError, RepositoryResult};
use recsys_core::model::{Identity, NewIdentity};
use recsys_core::ports::IdentityRepository;

#[async_trait]
impl IdentityRepository for InMemoryDatabase {
    async fn create_identity(&self, identity: &NewIdentity) -> RepositoryResult<Identity> {
        let mut tables = self.tables("create_identity")?;
        if tables.users.values().any(|u| u.email == identity.email) {
            return Err(RepositoryError::Conflict("email already registered".to_string()));
        }
        let id = tables.next_id();
        let now = tables.now();
        let stored = Identity {
            id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            password_hash: identity.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Identity>> {
        Ok(self
            .tables("find_by_email")?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}
