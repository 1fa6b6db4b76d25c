//! Content-addressed build cache
//!
//! Layout under the cache root:
//!
//! ```text
//! geo/ elev/ imagery/              reserved, created empty
//! build/build_{hex}/scene.json
//!                   buildings.json
//!                   parking.json
//!                   lights.json
//!                   dsf_stub.txt
//! ```
//!
//! Entries are write-once and never evicted.

mod key;
mod store;

pub use key::{canonical_json, key_for, CacheKey};
pub use store::{BuildCache, CacheEntry, CacheLookup, ARTIFACTS, RESERVED_DIRS};
