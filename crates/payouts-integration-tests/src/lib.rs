//! Integration test crate for the payouts pipeline.
//!
//! This crate has no library code. Its tests drive discovery, batching,
//! submission and the reports across the workspace crates against the
//! in-process chain model, and discovery against a local JSON-RPC gateway.
//!
//! ```sh
//! cargo test -p payouts-integration-tests
//! ```
