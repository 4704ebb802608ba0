//! Sequence counters
//!
//! One document per sequence, `_id` is the sequence name and `seq` the last
//! value handed out.

use bson::Document;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

pub const COUNTER_COLLECTION: &str = "counters";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CounterDoc {
    pub _id: String,

    #[serde(default)]
    pub seq: i64,

    #[serde(default)]
    pub metadata: Metadata,
}

impl IntoIndexes for CounterDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        // _id is the only lookup key
        vec![]
    }
}

impl MutMetadata for CounterDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
