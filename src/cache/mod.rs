//! Named, persistent response cache keyed by request identity.
//!
//! The store is the only shared mutable resource in the proxy: the install
//! path is its single writer and the intercept path only reads, so no
//! coordination beyond the backend's own lock is needed. Backends implement
//! [`CacheStore`]; [`SqliteStore`] persists across restarts of the host
//! runtime, [`MemoryStore`] lives for the process only.

mod storage;
mod traits;

pub use storage::{MemoryStore, SqliteStore};
pub use traits::{CacheStore, CachedEntry};
