//! MongoDB drink store
//!
//! Numeric ids come from a counter document incremented with an upsert, so
//! ids keep increasing across restarts until the next reset.

use async_trait::async_trait;
use bson::doc;
use tracing::debug;

use super::{DrinkStore, StoreError};
use crate::db::schemas::{CounterDoc, DrinkDoc, COUNTER_COLLECTION, DRINK_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::model::{Drink, NewDrink};
use crate::types::CoffeeShopError;

const DRINK_SEQUENCE: &str = "drink_id";

pub struct MongoDrinkStore {
    drinks: MongoCollection<DrinkDoc>,
    counters: MongoCollection<CounterDoc>,
}

impl MongoDrinkStore {
    pub async fn new(client: &MongoClient) -> Result<Self, CoffeeShopError> {
        Ok(Self {
            drinks: client.collection(DRINK_COLLECTION).await?,
            counters: client.collection(COUNTER_COLLECTION).await?,
        })
    }

    async fn next_id(&self) -> Result<i64, StoreError> {
        let counter = self
            .counters
            .upsert_and_get(
                doc! { "_id": DRINK_SEQUENCE },
                doc! { "$inc": { "seq": 1_i64 } },
            )
            .await?
            .ok_or_else(|| StoreError::Backend("id counter upsert returned nothing".into()))?;
        Ok(counter.seq)
    }
}

#[async_trait]
impl DrinkStore for MongoDrinkStore {
    fn backend(&self) -> &'static str {
        "mongo"
    }

    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        let docs = self
            .drinks
            .find_many(doc! {}, doc! { "drink_id": 1 })
            .await?;
        Ok(docs.into_iter().map(Drink::from).collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Drink>, StoreError> {
        let doc = self.drinks.find_one(doc! { "drink_id": id }).await?;
        Ok(doc.map(Drink::from))
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        let id = self.next_id().await?;
        let doc = DrinkDoc::new(id, drink);
        let created = Drink::from(doc.clone());

        self.drinks.insert_one(doc).await?;
        debug!(id, title = %created.title, "Drink inserted");
        Ok(created)
    }

    async fn update(&self, drink: &Drink) -> Result<(), StoreError> {
        let matched = self
            .drinks
            .set_fields(
                doc! { "drink_id": drink.id },
                doc! { "title": &drink.title, "recipe": &drink.recipe },
            )
            .await?;

        if matched == 0 {
            return Err(StoreError::NotFound(drink.id));
        }
        Ok(())
    }

    async fn delete(&self, drink: &Drink) -> Result<(), StoreError> {
        let deleted = self.drinks.delete_one(doc! { "drink_id": drink.id }).await?;
        if deleted == 0 {
            return Err(StoreError::NotFound(drink.id));
        }
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let removed = self.drinks.delete_many(doc! {}).await?;
        self.counters
            .delete_one(doc! { "_id": DRINK_SEQUENCE })
            .await?;
        debug!(removed, "Drink collection cleared");
        Ok(())
    }
}
