//! Core module
//!
//! Shared constants used across the assembly pipeline.

pub mod constants;
