//! Core library modules for cityprint
//!
//! This module contains the internal implementation of the
//! fetch-batch-reconcile-retry pipeline and the raster stage.

pub mod batch;
pub mod cache;
pub mod cities;
pub mod client;
pub mod encode;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod raster;
pub mod reconcile;
pub mod retry;

// Re-export main types for internal use
pub use client::OverpassClient;
pub use pipeline::{fetch_city, FetchOptions, FetchReport};
