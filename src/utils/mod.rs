//! Utility modules

pub mod string;
pub mod time;
