//! Core domain types shared across the crate.

pub mod buffer;
pub mod clean;
pub mod errors;
