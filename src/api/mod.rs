//! Remote catalog source.
//!
//! This module provides the [`CatalogClient`] for fetching ordered pages of
//! raw records from the paginated catalog HTTP API, behind the
//! [`CatalogSource`] trait the engine consumes.

pub mod client;
pub mod error;

pub use client::{build_http_client, CatalogClient, CatalogSource};
pub use error::ApiError;
