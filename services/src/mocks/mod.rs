//! In-memory repository implementations for testing.
//!
//! [`InMemoryDatabase`] implements every repository port over one set of
//! tables, so cross-table reads (product details, preference ranking) see the
//! same data a shared Postgres schema would. Clones share state.

mod analytics;
mod identity;
mod products;
mod recommendations;
mod users;

use chrono::{DateTime, Utc};
use recsys_core::error::{RepositoryError, RepositoryResult};
use recsys_core::model::{
    Dislike, Identity, Like, Product, ProductAnalytics, ProductId, Purchase, Recommendation,
    UserAnalytics, UserId,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    last_id: i64,
    /// Monotonic tick so `updated_at` orders writes even within one clock tick.
    last_tick: i64,
    users: BTreeMap<UserId, Identity>,
    products: BTreeMap<ProductId, Product>,
    likes: Vec<Like>,
    dislikes: Vec<Dislike>,
    purchases: Vec<Purchase>,
    scores: HashMap<(UserId, String), f64>,
    recommendations: Vec<Recommendation>,
    product_analytics: HashMap<ProductId, ProductAnalytics>,
    user_analytics: HashMap<UserId, UserAnalytics>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn now(&mut self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        self.last_tick = wall.max(self.last_tick + 1);
        DateTime::from_timestamp_micros(self.last_tick).unwrap_or_default()
    }
}

/// In-memory implementation of every repository port.
///
/// # Example
///
/// ```
/// use recsys_services::mocks::InMemoryDatabase;
/// use recsys_core::ports::ProductRepository;
/// use recsys_core::model::ProductInput;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = InMemoryDatabase::new();
/// let product = db
///     .create_product(&ProductInput {
///         name: "Dune".to_string(),
///         description: String::new(),
///         price: 9.5,
///         category: "books".to_string(),
///     })
///     .await?;
/// assert_eq!(db.get_product(product.id).await?.purchase_count, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
    failing: Arc<Mutex<HashSet<&'static str>>>,
}

impl InMemoryDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the named operation (e.g. `"increment_product"`) fail with a
    /// storage error until cleared.
    pub fn fail_operation(&self, operation: &'static str, failing: bool) {
        if let Ok(mut set) = self.failing.lock() {
            if failing {
                set.insert(operation);
            } else {
                set.remove(operation);
            }
        }
    }

    /// Current score of `(user_id, category)`, if any delta was applied.
    #[must_use]
    pub fn category_score(&self, user_id: UserId, category: &str) -> Option<f64> {
        self.tables
            .lock()
            .ok()?
            .scores
            .get(&(user_id, category.to_string()))
            .copied()
    }

    fn check(&self, operation: &'static str) -> RepositoryResult<()> {
        let failing = self
            .failing
            .lock()
            .map_err(|_| RepositoryError::storage(operation, "lock poisoned"))?;
        if failing.contains(operation) {
            return Err(RepositoryError::storage(operation, "injected failure"));
        }
        Ok(())
    }

    fn tables(&self, operation: &'static str) -> RepositoryResult<MutexGuard<'_, Tables>> {
        self.check(operation)?;
        self.tables
            .lock()
            .map_err(|_| RepositoryError::storage(operation, "lock poisoned"))
    }
}

/// Apply `page` to an already ordered list.
fn paged<T>(items: impl Iterator<Item = T>, page: recsys_core::model::Page) -> Vec<T> {
    let offset = usize::try_from(page.offset).unwrap_or(0);
    let limit = usize::try_from(page.limit).unwrap_or(0);
    items.skip(offset).take(limit).collect()
}
