//! Product catalogue.

use crate::effects;
use crate::error::{Result, ServiceError};
use recsys_core::event::DomainEvent;
use recsys_core::event_bus::EventBus;
use recsys_core::model::{Page, Product, ProductDetails, ProductId, ProductInput};
use recsys_core::ports::ProductRepository;
use recsys_core::topic::Topic;
use std::sync::Arc;
use tracing::{info, instrument};

/// Product service: CRUD with every write announced on `product_updates`.
#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    event_bus: Arc<dyn EventBus>,
}

impl ProductService {
    /// Create a new product service.
    #[must_use]
    pub fn new(products: Arc<dyn ProductRepository>, event_bus: Arc<dyn EventBus>) -> Self {
        Self {
            products,
            event_bus,
        }
    }

    /// Add a product and publish `product_created`.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank name or category or a negative price,
    /// `Infrastructure` if the store fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product> {
        validate(input)?;
        let product = self.products.create_product(input).await?;
        self.announce(DomainEvent::ProductCreated {
            product: product.clone(),
        })
        .await;
        info!(product_id = product.id, "Product created");
        Ok(product)
    }

    /// Product with its likes, dislikes and purchase count.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Infrastructure`.
    pub async fn get_product(&self, id: ProductId) -> Result<ProductDetails> {
        Ok(self.products.get_product(id).await?)
    }

    /// Overwrite a product and publish `product_updated`.
    ///
    /// # Errors
    ///
    /// `Validation`, `NotFound`, or `Infrastructure`.
    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: ProductId, input: &ProductInput) -> Result<Product> {
        validate(input)?;
        let product = self.products.update_product(id, input).await?;
        self.announce(DomainEvent::ProductUpdated {
            product: product.clone(),
        })
        .await;
        info!("Product updated");
        Ok(product)
    }

    /// Products ordered by id.
    ///
    /// # Errors
    ///
    /// `Infrastructure` if the store fails.
    pub async fn list_products(&self, page: Page) -> Result<Vec<Product>> {
        Ok(self.products.list_products(page).await?)
    }

    /// Remove a product and publish `product_deleted`.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Infrastructure`.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        self.products.delete_product(id).await?;
        self.announce(DomainEvent::ProductDeleted { product_id: id })
            .await;
        info!("Product deleted");
        Ok(())
    }

    async fn announce(&self, event: DomainEvent) {
        effects::publish(self.event_bus.as_ref(), Topic::ProductUpdates, &event).await;
    }
}

fn validate(input: &ProductInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::Validation("name is required".to_string()));
    }
    if input.category.trim().is_empty() {
        return Err(ServiceError::Validation("category is required".to_string()));
    }
    if !input.price.is_finite() || input.price < 0.0 {
        return Err(ServiceError::Validation(
            "price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}
