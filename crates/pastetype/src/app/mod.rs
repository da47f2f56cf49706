//! Application layer orchestrating domain logic and infrastructure.

pub mod notify;
pub mod paste;
