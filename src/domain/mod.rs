//! Domain logic
//!
//! - `traces` - normalization, hierarchy assembly, timeline layout
//! - `pricing` - pricing table and cost aggregation

pub mod pricing;
pub mod traces;
