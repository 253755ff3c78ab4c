use super::{InMemoryDatabase, paged};
use async_trait::async_trait;
use recsys_core::error::{RepositoryError, RepositoryResult};
use recsys_core::model::{Page, Product, ProductDetails, ProductId, ProductInput};
use recsys_core::ports::ProductRepository;

#[async_trait]
impl ProductRepository for InMemoryDatabase {
    async fn create_product(&self, input: &ProductInput) -> RepositoryResult<Product> {
        let mut tables = self.tables("create_product")?;
        let id = tables.next_id();
        let now = tables.now();
        let product = Product {
            id,
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            category: input.category.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> RepositoryResult<ProductDetails> {
        let tables = self.tables("get_product")?;
        let product = tables
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("Product", id))?;

        Ok(ProductDetails {
            product,
            likes: tables
                .likes
                .iter()
                .filter(|l| l.product_id == id)
                .cloned()
                .collect(),
            dislikes: tables
                .dislikes
                .iter()
                .filter(|d| d.product_id == id)
                .cloned()
                .collect(),
            purchase_count: tables
                .purchases
                .iter()
                .filter(|p| p.product_id == id)
                .count()
                .try_into()
                .unwrap_or(i64::MAX),
        })
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> RepositoryResult<Product> {
        let mut tables = self.tables("update_product")?;
        let now = tables.now();
        let product = tables
            .products
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("Product", id))?;
        product.name.clone_from(&input.name);
        product.description.clone_from(&input.description);
        product.price = input.price;
        product.category.clone_from(&input.category);
        product.updated_at = now;
        Ok(product.clone())
    }

    async fn list_products(&self, page: Page) -> RepositoryResult<Vec<Product>> {
        let tables = self.tables("list_products")?;
        Ok(paged(tables.products.values().cloned(), page))
    }

    async fn delete_product(&self, id: ProductId) -> RepositoryResult<()> {
        self.tables("delete_product")?
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("Product", id))
    }
}
