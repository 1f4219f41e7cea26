//! CLI command implementations.

pub mod common;
pub mod config;
pub mod devices;
pub mod play;
pub mod tone;
