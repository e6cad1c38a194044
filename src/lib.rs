//! Profile the objects stored in a memcached server.
//!
//! Dumps every key through the `stats cachedump` introspection command, keeps
//! the keys whose names match a set of regular expressions and reports the
//! size distribution of the matches: count, total, smallest, largest, average
//! and the 50th/90th/95th/99th percentiles.

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod percentile;
pub mod profile;
pub mod report;

pub use error::{Error, Result};
