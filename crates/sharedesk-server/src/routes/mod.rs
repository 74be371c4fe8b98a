//! HTTP route modules.
//!
//! Each module exposes a `router()` returning a `Router<Arc<AppState>>`
//! that is nested under its prefix by [`crate::app`].

pub mod collections;
pub mod data;
pub mod health;
pub mod schema;
pub mod setup;
