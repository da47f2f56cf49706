//! Infrastructure adapters for IO, config, and external integrations.

pub mod clipboard;
pub mod config;
pub mod runtime;
pub mod webhook;
