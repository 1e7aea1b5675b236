//! Shared fixtures and helpers for integration tests.

pub mod document_fixtures;
pub mod model_helpers;
