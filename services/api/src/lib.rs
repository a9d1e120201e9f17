//! Video catalog API
//!
//! Browsing, filtering, creating and voting on videos over HTTP. Handlers in
//! [`routes`] call the [`service::VideoService`], which turns listing
//! parameters into a [`query::VideoSearch`] and talks to storage through the
//! [`repositories::VideoStore`] trait.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod query;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod service;
pub mod state;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;
