//! Database schemas for Coffee Shop

mod counter;
mod drink;
mod metadata;

pub use counter::{CounterDoc, COUNTER_COLLECTION};
pub use drink::{DrinkDoc, DRINK_COLLECTION};
pub use metadata::Metadata;
