//! Drink persistence
//!
//! Handlers see storage only through [`DrinkStore`]. Two backends exist: an
//! in-process map for development and tests, and MongoDB.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use tracing::info;

use crate::model::{seed_drinks, Drink, NewDrink};

pub use memory::MemoryDrinkStore;
pub use mongo::MongoDrinkStore;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("drink {0} not found")]
    NotFound(i64),

    /// A uniqueness constraint was violated
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait DrinkStore: Send + Sync {
    /// Backend name for logs and `/health`
    fn backend(&self) -> &'static str;

    /// All drinks ordered by id
    async fn list(&self) -> Result<Vec<Drink>, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Drink>, StoreError>;

    /// Persist a new drink and return it with its assigned id
    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError>;

    /// Overwrite title and recipe of an existing drink
    async fn update(&self, drink: &Drink) -> Result<(), StoreError>;

    async fn delete(&self, drink: &Drink) -> Result<(), StoreError>;

    /// Remove every drink and restart id allocation
    async fn reset(&self) -> Result<(), StoreError>;

    /// Reset, then insert the sample menu
    async fn reset_with_seed(&self) -> Result<Vec<Drink>, StoreError> {
        self.reset().await?;

        let mut seeded = Vec::new();
        for drink in seed_drinks() {
            seeded.push(self.insert(drink).await?);
        }

        info!(backend = self.backend(), count = seeded.len(), "Drink store reset and seeded");
        Ok(seeded)
    }
}
