//! Shared types

pub mod error;

pub use error::{CoffeeShopError, Result};
