//! Coffee Shop - drink menu API
//!
//! Serves a small catalogue of drinks over HTTP. Reads of the public menu are
//! open; everything else requires a bearer token whose `permissions` claim
//! grants the route's capability.
//!
//! ## Modules
//!
//! - **auth**: bearer token extraction, JWKS key resolution, claim and
//!   permission checks
//! - **routes**: declarative route table and drink handlers
//! - **server**: hyper server, application state, permission-enforcing dispatcher
//! - **store**: drink persistence (in-memory and MongoDB)
//! - **model**: drink records and their short/long projections

pub mod auth;
pub mod config;
pub mod db;
pub mod model;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{CoffeeShopError, Result};
