//! Data models for the price dashboard
//!
//! This module organizes the value types shared by the cache, the vendor
//! clients, the normalizer and the board. Each model is plain data; the
//! behaviour lives in `services`.

pub mod cache;
pub mod chart;
pub mod coin;
pub mod resolution;
pub mod snapshot;

// Re-export commonly used types for convenience
pub use cache::{CacheEntry, CachedValue};
pub use chart::PricePoint;
pub use coin::{find_coin, CoinDescriptor, Vendor, COINS};
pub use resolution::Resolution;
pub use snapshot::CoinSnapshot;
