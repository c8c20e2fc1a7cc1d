//! Tag-aware read-through/write-through caching for wrapped operations.
//!
//! ## Architecture
//!
//! ```text
//! caller → Cached::invoke(args, op)
//!              │
//!              ├─ bind args to a name → value map          (args)
//!              ├─ run resolvers, collect key material      (resolve)
//!              ├─ derive the cache key                     (key)
//!              ├─ CacheStore get ── hit ──→ decoded value  (store)
//!              │        └ miss / store down
//!              ├─ run the wrapped operation
//!              └─ best-effort store set (TTL + tags), return result
//! ```
//!
//! `ClearCache` is the companion aspect: it purges tags and/or the derived
//! key, then always runs the wrapped operation.
//!
//! ## Graceful Degradation
//!
//! Store outages never fail a request. Every store interaction inside the
//! aspects is caught and logged; the wrapped operation runs as if the cache
//! were empty. Only programmer errors (bad config, unbidable arguments) and
//! the operation's own errors reach the caller.
//!
//! ## Concurrency
//!
//! There is no cross-request single-flight guard: concurrent misses on one
//! key each run the wrapped operation and race the final write. Single-key
//! store operations are atomic in the backend and tag updates are
//! idempotent, so the race is bounded to duplicated work.

pub mod args;
pub mod aspect;
pub mod bridge;
pub mod error;
pub mod invalidate;
pub mod key;
pub mod resolve;
pub mod store;

pub use args::bind;
pub use aspect::{CacheConfig, CacheConfigBuilder, Cached};
pub use error::{BindError, ConfigError, StoreError};
pub use invalidate::{ClearCache, ClearConfig, ClearConfigBuilder};
pub use key::{KEY_NAMESPACE, make_key, tag_key};
pub use resolve::{ParamResolver, Resolver, ResolverFuture, WriterResolver};
pub use store::{CacheStore, MemoryStore, RedisStore, StoreBackend, Ttl};
