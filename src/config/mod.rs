//! # Configuration Module
//!
//! Pipeline configuration and its validation.

pub mod config;

pub use config::{GramConfig, DEFAULT_TARGET_SIZE, MAX_TARGET_SIZE};
