//! Product catalogue.

use crate::storage;
use crate::users::InteractionRow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recsys_core::error::{RepositoryError, RepositoryResult};
use recsys_core::model::{Dislike, Like, Page, Product, ProductDetails, ProductId, ProductInput};
use recsys_core::ports::ProductRepository;
use sqlx::PgPool;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: f64,
    category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, category, created_at, updated_at";

/// PostgreSQL product repository.
#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    /// Create a new repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn create_product(&self, input: &ProductInput) -> RepositoryResult<Product> {
        sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products (name, description, price, category)
            VALUES ($1, $2, $3, $4)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.category)
        .fetch_one(&self.pool)
        .await
        .map(Product::from)
        .map_err(storage("create product"))
    }

    async fn get_product(&self, id: ProductId) -> RepositoryResult<ProductDetails> {
        let product = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("get product"))?
        .map(Product::from)
        .ok_or_else(|| RepositoryError::not_found("Product", id))?;

        let likes = sqlx::query_as::<_, InteractionRow>(
            "SELECT id, user_id, product_id, liked_at AS at FROM likes WHERE product_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("list product likes"))?;

        let dislikes = sqlx::query_as::<_, InteractionRow>(
            "SELECT id, user_id, product_id, disliked_at AS at FROM dislikes WHERE product_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("list product dislikes"))?;

        let (purchase_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM purchases WHERE product_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(storage("count product purchases"))?;

        Ok(ProductDetails {
            product,
            likes: likes.into_iter().map(Like::from).collect(),
            dislikes: dislikes.into_iter().map(Dislike::from).collect(),
            purchase_count,
        })
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> RepositoryResult<Product> {
        sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products
            SET name = $2, description = $3, price = $4, category = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.category)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("update product"))?
        .map(Product::from)
        .ok_or_else(|| RepositoryError::not_found("Product", id))
    }

    async fn list_products(&self, page: Page) -> RepositoryResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("list products"))?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn delete_product(&self, id: ProductId) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage("delete product"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Product", id));
        }
        Ok(())
    }
}
