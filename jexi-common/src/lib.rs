//! # Jexi Common Library
//!
//! Shared code for the Jexi audio backend including:
//! - Event types (JobEvent enum) and the broadcast EventBus
//! - Configuration loading and data folder resolution
//! - Common error types
//! - Timestamp and duration formatting utilities

pub mod config;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
