//! Deterministic JSON serialization for profile files.
//!
//! Keeps the local storage and cookie files diffable by:
//! - Sorting object keys alphabetically (via `BTreeMap` in the stored types)
//! - Using 2-space indentation
//! - Adding trailing newline

mod json;

pub use json::*;
