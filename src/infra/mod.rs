//! Infrastructure layer for cross-cutting concerns.
//!
//! Provides:
//! - Error taxonomy and result types
//! - Configuration file management

pub mod config;
pub mod error;
