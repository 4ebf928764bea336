//! Domain layer: pure value types with no I/O.

pub mod crypto;
pub mod types;
