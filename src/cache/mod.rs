//! Response caching.
//!
//! # Data Flow
//! ```text
//! SearchQuery
//!     → key.rs (exact JSON-encoded key + TTL class)
//!     → store.rs (lookup; on miss the routed envelope is stored)
//! ```
//!
//! # Design Decisions
//! - Cached envelopes keep the engine annotation they were served with
//! - No invalidation beyond TTL; expired entries go lazily, live ones
//!   are evicted soonest-expiring first once `max_entries` is reached

pub mod key;
pub mod store;

pub use key::{cache_key, TtlClass};
pub use store::ResponseCache;
