//! Model layer tests
//!
//! End-to-end tests over whole documents:
//! - Round-trip and idempotence of build/emit
//! - Reference resolution and integrity faults
//! - Passthrough of unknown types, fields and sections
//! - Format handle: bytes, options, parallel batches

pub mod tests_format;
pub mod tests_references;
pub mod tests_roundtrip;
pub mod tests_scenarios;
