//! In-memory drink store

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{DrinkStore, StoreError};
use crate::model::{Drink, NewDrink};

#[derive(Debug)]
struct Inner {
    drinks: BTreeMap<i64, Drink>,
    next_id: i64,
}

impl Inner {
    fn title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.drinks
            .values()
            .any(|d| d.title == title && Some(d.id) != except)
    }
}

/// Drinks kept in a map behind an async lock
#[derive(Debug)]
pub struct MemoryDrinkStore {
    inner: RwLock<Inner>,
}

impl MemoryDrinkStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                drinks: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for MemoryDrinkStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DrinkStore for MemoryDrinkStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.drinks.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Drink>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.drinks.get(&id).cloned())
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.title_taken(&drink.title, None) {
            return Err(StoreError::Conflict(format!(
                "title '{}' already exists",
                drink.title
            )));
        }

        let id = inner.next_id;
        inner.next_id += 1;
        let drink = drink.with_id(id);
        inner.drinks.insert(id, drink.clone());

        debug!(id, title = %drink.title, "Drink inserted");
        Ok(drink)
    }

    async fn update(&self, drink: &Drink) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.drinks.contains_key(&drink.id) {
            return Err(StoreError::NotFound(drink.id));
        }
        if inner.title_taken(&drink.title, Some(drink.id)) {
            return Err(StoreError::Conflict(format!(
                "title '{}' already exists",
                drink.title
            )));
        }

        inner.drinks.insert(drink.id, drink.clone());
        Ok(())
    }

    async fn delete(&self, drink: &Drink) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .drinks
            .remove(&drink.id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(drink.id))
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.drinks.clear();
        inner.next_id = 1;
        Ok(())
    }
}
