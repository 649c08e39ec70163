pub mod config;

/// Common utilities shared across the relquery workspace
///
/// This crate provides functionality used by the translator crate and its
/// binaries:
///
/// - Configuration loading (`config`)
/// - Database connection and tracing setup for tests (`test_helpers`)

// Test helpers module - available for both development and test builds
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

// Re-export commonly used test utilities for easier access
#[cfg(any(test, feature = "test-helpers"))]
pub use test_helpers::{
    create_connection, create_test_connection, get_test_database_url,
    get_test_in_memory_database_url, init_test_tracing,
};
