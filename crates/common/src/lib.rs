//! Shared utilities for the storage policy components

pub mod paths;
pub mod settings;

pub use settings::{PolicySettings, DEFAULT_CLASSIFICATIONS};
