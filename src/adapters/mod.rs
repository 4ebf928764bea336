//! Adapter layer modules for external system integration.
//!
//! Provides:
//! - The `KeyService` capability trait consumed by the service layer
//! - A REST client for the remote key-management service
//! - An in-memory key service performing real cryptography locally

pub mod key_service;
pub mod memory;
pub mod remote;
