//! Drink document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::model::{Drink, NewDrink};

/// Collection name for drinks
pub const DRINK_COLLECTION: &str = "drinks";

/// Drink document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DrinkDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Public numeric id, allocated from the counters collection
    pub drink_id: i64,

    pub title: String,

    /// Serialized recipe JSON
    pub recipe: String,
}

impl DrinkDoc {
    pub fn new(drink_id: i64, drink: NewDrink) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            drink_id,
            title: drink.title,
            recipe: drink.recipe,
        }
    }
}

impl From<DrinkDoc> for Drink {
    fn from(doc: DrinkDoc) -> Self {
        Drink {
            id: doc.drink_id,
            title: doc.title,
            recipe: doc.recipe,
        }
    }
}

impl IntoIndexes for DrinkDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "drink_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("drink_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "title": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("title_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for DrinkDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
