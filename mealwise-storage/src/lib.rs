//! Mealwise Storage
//!
//! Disk-backed persistence for Mealwise:
//!
//! - [`LookupCache`]: one JSON file per normalized food query, expired
//!   passively by TTL and bounded by entry count.
//! - [`SnapshotFiles`]: the paired embeddings/facts files behind the
//!   knowledge store.
//!
//! Reads degrade instead of failing; writes report [`StorageError`]s.
//!
//! [`StorageError`]: mealwise_core::StorageError

pub mod cache;
pub mod snapshot;

pub use cache::{cache_key, CacheStats, LookupCache};
pub use snapshot::{KnowledgeSnapshot, SnapshotFiles, EMBEDDINGS_FILE, FACTS_FILE};
