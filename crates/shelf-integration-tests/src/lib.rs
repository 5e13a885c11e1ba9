//! Integration test crate for the Shelf registry.
//!
//! This crate exists solely to run integration tests that span the token and
//! registry crates. It has no public API - all functionality is in the test
//! modules.

#![forbid(unsafe_code)]
