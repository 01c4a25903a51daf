//! Data module
//!
//! - `types` - span records on both sides of normalization
//! - `cache` - the client-side page merge/dedup cache

pub mod cache;
pub mod types;
