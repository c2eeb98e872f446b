//! Runnable demos for the schema-history crates.
//!
//! Run with `cargo run -p schema-history-demos --example sqlite_history`.
