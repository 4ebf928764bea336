//! Remote key service adapter.
//!
//! Connects to the key-management REST API over HTTPS and exposes it as a
//! [`crate::KeyService`].

pub mod client;
pub mod protocol;
