use super::{InMemoryDatabase, paged};
use async_trait::async_trait;
use recsys_core::error::{RepositoryError, RepositoryResult};
use recsys_core::model::{
    Dislike, Like, Page, ProductId, Purchase, User, UserActions, UserId, UserUpdate,
};
use recsys_core::ports::UserRepository;

fn public(identity: &recsys_core::model::Identity) -> User {
    User {
        id: identity.id,
        name: identity.name.clone(),
        email: identity.email.clone(),
        created_at: identity.created_at,
        updated_at: identity.updated_at,
    }
}

#[async_trait]
impl UserRepository for InMemoryDatabase {
    async fn get_user(&self, id: UserId) -> RepositoryResult<User> {
        self.tables("get_user")?
            .users
            .get(&id)
            .map(public)
            .ok_or_else(|| RepositoryError::not_found("User", id))
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> RepositoryResult<User> {
        let mut tables = self.tables("update_user")?;
        if tables
            .users
            .values()
            .any(|user| user.id != id && user.email == update.email)
        {
            return Err(RepositoryError::Conflict("email already in use".to_string()));
        }
        let now = tables.now();
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("User", id))?;
        user.name.clone_from(&update.name);
        user.email.clone_from(&update.email);
        user.updated_at = now;
        Ok(public(user))
    }

    async fn list_users(&self, page: Page) -> RepositoryResult<Vec<User>> {
        let tables = self.tables("list_users")?;
        Ok(paged(tables.users.values().map(public), page))
    }

    async fn like_product(&self, user_id: UserId, product_id: ProductId) -> RepositoryResult<Like> {
        let mut tables = self.tables("like_product")?;
        if tables
            .likes
            .iter()
            .any(|l| l.user_id == user_id && l.product_id == product_id)
        {
            return Err(RepositoryError::Conflict(format!(
                "like already exists for user {user_id} and product {product_id}"
            )));
        }
        tables
            .dislikes
            .retain(|d| !(d.user_id == user_id && d.product_id == product_id));

        let like = Like {
            id: tables.next_id(),
            user_id,
            product_id,
            liked_at: tables.now(),
        };
        tables.likes.push(like.clone());
        Ok(like)
    }

    async fn dislike_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> RepositoryResult<Dislike> {
        let mut tables = self.tables("dislike_product")?;
        if tables
            .dislikes
            .iter()
            .any(|d| d.user_id == user_id && d.product_id == product_id)
        {
            return Err(RepositoryError::Conflict(format!(
                "dislike already exists for user {user_id} and product {product_id}"
            )));
        }
        tables
            .likes
            .retain(|l| !(l.user_id == user_id && l.product_id == product_id));

        let dislike = Dislike {
            id: tables.next_id(),
            user_id,
            product_id,
            disliked_at: tables.now(),
        };
        tables.dislikes.push(dislike.clone());
        Ok(dislike)
    }

    async fn create_purchase(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> RepositoryResult<Purchase> {
        let mut tables = self.tables("create_purchase")?;
        let purchase = Purchase {
            id: tables.next_id(),
            user_id,
            product_id,
            purchased_at: tables.now(),
        };
        tables.purchases.push(purchase.clone());
        Ok(purchase)
    }

    async fn user_actions(
        &self,
        user_id: UserId,
        product_id: Option<ProductId>,
    ) -> RepositoryResult<UserActions> {
        let tables = self.tables("user_actions")?;
        let matches = |uid: UserId, pid: ProductId| {
            uid == user_id && product_id.is_none_or(|wanted| wanted == pid)
        };

        Ok(UserActions {
            likes: tables
                .likes
                .iter()
                .rev()
                .filter(|l| matches(l.user_id, l.product_id))
                .cloned()
                .collect(),
            dislikes: tables
                .dislikes
                .iter()
                .rev()
                .filter(|d| matches(d.user_id, d.product_id))
                .cloned()
                .collect(),
            purchases: tables
                .purchases
                .iter()
                .rev()
                .filter(|p| matches(p.user_id, p.product_id))
                .cloned()
                .collect(),
        })
    }

    async fn purchases(&self, user_id: UserId, page: Page) -> RepositoryResult<Vec<Purchase>> {
        let tables = self.tables("purchases")?;
        Ok(paged(
            tables
                .purchases
                .iter()
                .rev()
                .filter(|p| p.user_id == user_id)
                .cloned(),
            page,
        ))
    }
}
