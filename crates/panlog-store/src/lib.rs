//! panlog-store - Persistent per-profile, per-category log cache
//!
//! One XML file per profile and category holds the accumulated raw entries.
//! Merging is modelled over typed [`RawEntry`](panlog_core::RawEntry) values,
//! never over the serialized document; the XML format is a pure encode/decode
//! boundary provided by `panlog_core::xml`.

mod store;

pub use store::{LogStore, MergeMode, StoreError};

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
