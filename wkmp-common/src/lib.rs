//! # WKMP Common Library
//!
//! Shared code for WKMP services including:
//! - Common error type
//! - TOML configuration loading and secret resolution
//! - Tracing initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
