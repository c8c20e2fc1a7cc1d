//! Integration tests for the caching aspects against the in-process store.
//!
//! A counter inside each wrapped operation observes how often the real body
//! runs, which is what the read-through/invalidation contracts are about.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use bilet_cache::{
    BindError, CacheConfig, CacheStore, Cached, ClearCache, ClearConfig, MemoryStore,
    ParamResolver, Resolver, StoreBackend, StoreError, Ttl, WriterResolver,
};

#[derive(Debug, PartialEq)]
enum TestError {
    Bind,
    BadToken,
}

impl From<BindError> for TestError {
    fn from(_: BindError) -> Self {
        TestError::Bind
    }
}

#[derive(Serialize)]
struct DoubleArgs {
    x: i64,
}

/// A backend that refuses every operation, simulating a dead store.
struct DeadStore;

#[async_trait]
impl StoreBackend for DeadStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn set(
        &self,
        _key: &str,
        _value: &str,
        _tags: &[String],
        _ttl: Ttl,
    ) -> Result<(), StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn delete_tags(&self, _tags: &[String]) -> Result<(), StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn tag_size(&self, _tag: &str) -> Result<u64, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }
}

/// An aspect keyed on the wrapped operation's `x` argument via a data
/// template — the usual configuration for argument-sensitive operations.
fn cached(store: &CacheStore, name: &str, tag: &str) -> Cached<TestError> {
    Cached::new(
        store.clone(),
        CacheConfig::builder(name)
            .tag(tag)
            .data("x")
            .build()
            .unwrap(),
    )
}

async fn double(
    aspect: &Cached<TestError>,
    calls: &AtomicUsize,
    x: i64,
) -> Result<i64, TestError> {
    aspect
        .invoke(&DoubleArgs { x }, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(x * 2)
        })
        .await
}

#[tokio::test]
async fn read_through_runs_the_body_once() {
    let store = CacheStore::in_memory();
    let aspect = cached(&store, "test_sync", "test_sync");
    let calls = AtomicUsize::new(0);

    assert_eq!(double(&aspect, &calls, 10).await.unwrap(), 20);
    assert_eq!(double(&aspect, &calls, 10).await.unwrap(), 20);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // different arguments are a different key
    assert_eq!(double(&aspect, &calls, 11).await.unwrap(), 22);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn fail_open_on_store_outage() {
    let store = CacheStore::from_backend(Arc::new(DeadStore));
    let aspect = cached(&store, "outage", "outage");
    let calls = AtomicUsize::new(0);

    // every call recomputes, none of them errors
    assert_eq!(double(&aspect, &calls, 10).await.unwrap(), 20);
    assert_eq!(double(&aspect, &calls, 10).await.unwrap(), 20);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalidation_also_fails_open() {
    let store = CacheStore::from_backend(Arc::new(DeadStore));
    let clear: ClearCache<TestError> = ClearCache::new(
        store,
        ClearConfig::builder("outage")
            .delete_tag("outage")
            .build()
            .unwrap(),
    );

    let result = clear
        .invoke(&DoubleArgs { x: 1 }, || async { Ok("mutated") })
        .await
        .unwrap();
    assert_eq!(result, "mutated");
}

#[tokio::test]
async fn tag_invalidation_forces_recompute() {
    let store = CacheStore::in_memory();
    let aspect = cached(&store, "g", "clear_tag");
    let clear: ClearCache<TestError> = ClearCache::new(
        store.clone(),
        ClearConfig::builder("g")
            .delete_tag("clear_tag")
            .build()
            .unwrap(),
    );
    let calls = AtomicUsize::new(0);

    assert_eq!(double(&aspect, &calls, 2).await.unwrap(), 4);
    assert_eq!(double(&aspect, &calls, 2).await.unwrap(), 4);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clear
        .invoke(&DoubleArgs { x: 2 }, || async { Ok(()) })
        .await
        .unwrap();

    // same arguments, but the entry is gone
    assert_eq!(double(&aspect, &calls, 2).await.unwrap(), 4);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn param_resolver_sees_substituted_runtime_values() {
    let store = CacheStore::in_memory();
    let seen: Arc<std::sync::Mutex<Vec<Value>>> = Arc::default();
    let seen_in_resolver = Arc::clone(&seen);

    let config = CacheConfig::builder("resolver-sub")
        .resolver(Resolver::param(
            ParamResolver::new(move |args, _| {
                let seen = Arc::clone(&seen_in_resolver);
                Box::pin(async move {
                    seen.lock().unwrap().extend(args);
                    Ok(Value::Null)
                })
            })
            .arg("auth_token"),
        ))
        .build()
        .unwrap();
    let aspect: Cached<TestError> = Cached::new(store, config);

    #[derive(Serialize)]
    struct Args<'a> {
        auth_token: &'a str,
    }

    aspect
        .invoke(&Args { auth_token: "abc" }, || async { Ok(1) })
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![json!("abc")]);
}

#[tokio::test]
async fn failing_resolver_blocks_the_operation() {
    let store = CacheStore::in_memory();
    let config = CacheConfig::builder("resolver-err")
        .resolver(Resolver::param(ParamResolver::new(|_, _| {
            Box::pin(async { Err(TestError::BadToken) })
        })))
        .build()
        .unwrap();
    let aspect: Cached<TestError> = Cached::new(store, config);
    let calls = AtomicUsize::new(0);

    let err = aspect
        .invoke(&DoubleArgs { x: 1 }, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap_err();

    assert_eq!(err, TestError::BadToken);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn writer_output_distinguishes_keys() {
    let store = CacheStore::in_memory();
    // a writer that returns a different "resolved user" every invocation
    let next_user = Arc::new(AtomicI64::new(0));
    let next_user_in_writer = Arc::clone(&next_user);

    let config = CacheConfig::builder("per-user")
        .resolver(Resolver::writer(WriterResolver::new(move || {
            let next_user = Arc::clone(&next_user_in_writer);
            Box::pin(async move { Ok(json!(next_user.fetch_add(1, Ordering::SeqCst))) })
        })))
        .build()
        .unwrap();
    let aspect: Cached<TestError> = Cached::new(store, config);
    let calls = AtomicUsize::new(0);

    // identical explicit arguments, different writer output: no false hit
    assert_eq!(double(&aspect, &calls, 5).await.unwrap(), 10);
    assert_eq!(double(&aspect, &calls, 5).await.unwrap(), 10);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn blocking_entry_point_behaves_identically() {
    let store = CacheStore::in_memory();
    let aspect = cached(&store, "test_sync_blocking", "test_sync_blocking");
    let clear: ClearCache<TestError> = ClearCache::new(
        store.clone(),
        ClearConfig::builder("test_sync_blocking")
            .delete_tag("test_sync_blocking")
            .build()
            .unwrap(),
    );
    let calls = AtomicUsize::new(0);

    let mut run = |x: i64| {
        aspect
            .invoke_blocking(&DoubleArgs { x }, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(x * 2)
            })
            .unwrap()
    };

    assert_eq!(run(10), 20);
    assert_eq!(run(10), 20);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    clear
        .invoke_blocking(&DoubleArgs { x: 10 }, || Ok(()))
        .unwrap();

    assert_eq!(run(10), 20);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn round_trip_preserves_json_types() {
    let store = CacheStore::in_memory();
    let aspect = cached(&store, "round-trip", "round-trip");

    #[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
    struct Payload {
        id: i64,
        price: f64,
        active: bool,
        tags: Vec<String>,
        nested: Vec<Value>,
    }

    let payload = Payload {
        id: 9,
        price: 19.5,
        active: true,
        tags: vec!["vip".into()],
        nested: vec![json!({"count": 3, "ok": false})],
    };

    let first: Payload = aspect
        .invoke(&DoubleArgs { x: 1 }, || async { Ok(payload.clone()) })
        .await
        .unwrap();
    // second call is served from the store
    let second: Payload = aspect
        .invoke(&DoubleArgs { x: 1 }, || async {
            panic!("must be served from cache")
        })
        .await
        .unwrap();

    assert_eq!(first, payload);
    assert_eq!(second, payload);
}

#[tokio::test]
async fn corrupt_entries_are_deleted_and_recomputed() {
    let backend = Arc::new(MemoryStore::new());
    let store = CacheStore::from_backend(backend);
    let aspect = cached(&store, "self-heal", "self-heal");
    let calls = AtomicUsize::new(0);

    assert_eq!(double(&aspect, &calls, 3).await.unwrap(), 6);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // derive the stored key and poison it with non-JSON garbage
    let mut material = serde_json::Map::new();
    material.insert("__data__".to_string(), json!([3]));
    let key = bilet_cache::make_key("self-heal", &material);
    store
        .set(&key, "{not json", &["self-heal".to_string()], Ttl::Never)
        .await
        .unwrap();

    // the poisoned entry is discarded, the body runs again, the new value sticks
    assert_eq!(double(&aspect, &calls, 3).await.unwrap(), 6);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(double(&aspect, &calls, 3).await.unwrap(), 6);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn data_templates_key_by_named_argument() {
    let store = CacheStore::in_memory();
    let config = CacheConfig::builder("by-event")
        .data("event_id")
        .build()
        .unwrap();
    let aspect: Cached<TestError> = Cached::new(store, config);
    let calls = AtomicUsize::new(0);

    #[derive(Serialize)]
    struct Args {
        event_id: i64,
        noise: &'static str,
    }

    let mut run = |event_id: i64, noise: &'static str| {
        let aspect = &aspect;
        let calls = &calls;
        async move {
            aspect
                .invoke(&Args { event_id, noise }, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(event_id * 100)
                })
                .await
                .unwrap()
        }
    };

    assert_eq!(run(1, "a").await, 100);
    // only `event_id` is key material, so changed noise still hits
    assert_eq!(run(1, "b").await, 100);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(run(2, "a").await, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
