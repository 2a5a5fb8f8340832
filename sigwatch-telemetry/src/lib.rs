//! Logging setup shared by sigwatch binaries and tests.

pub mod tracing;
