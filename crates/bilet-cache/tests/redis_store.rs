//! Integration tests for the Redis store backend.
//!
//! These spin up a real Redis instance via testcontainers and are ignored by
//! default; run them with `cargo test -- --ignored` on a machine with a
//! Docker daemon.

use std::time::Duration;

use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::Redis;
use tokio::sync::OnceCell;

use bilet_cache::{CacheStore, Ttl};

// Shared Redis container for all tests
static SHARED_REDIS: OnceCell<(ContainerAsync<Redis>, String)> = OnceCell::const_new();

async fn get_redis_url() -> String {
    let (_, url) = SHARED_REDIS
        .get_or_init(|| async {
            let container = Redis::default()
                .start()
                .await
                .expect("start redis container");

            let host_port = container.get_host_port_ipv4(6379).await.expect("get port");
            let url = format!("redis://127.0.0.1:{}", host_port);

            (container, url)
        })
        .await;

    url.clone()
}

async fn connect() -> CacheStore {
    let url = get_redis_url().await;
    CacheStore::connect_redis(&url, 5, Duration::from_millis(5000))
        .await
        .expect("connect to redis")
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn redis_get_set_delete() {
    let store = connect().await;

    store
        .set("bilet:t:cache:getset", "\"value\"", &[], Ttl::Seconds(60))
        .await
        .unwrap();
    assert_eq!(
        store.get("bilet:t:cache:getset").await.unwrap(),
        Some("\"value\"".to_string())
    );

    store.delete("bilet:t:cache:getset").await.unwrap();
    assert_eq!(store.get("bilet:t:cache:getset").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn redis_missing_key_is_none() {
    let store = connect().await;
    assert_eq!(store.get("bilet:t:cache:absent").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn redis_tag_membership_and_purge() {
    let store = connect().await;
    let tags = vec!["itest-tag".to_string()];

    store
        .set("bilet:t:cache:tag-a", "1", &tags, Ttl::Seconds(60))
        .await
        .unwrap();
    store
        .set("bilet:t:cache:tag-b", "2", &tags, Ttl::Seconds(60))
        .await
        .unwrap();

    assert_eq!(store.tag_size("itest-tag").await.unwrap(), 2);

    store.delete_tags(&tags).await.unwrap();

    assert_eq!(store.get("bilet:t:cache:tag-a").await.unwrap(), None);
    assert_eq!(store.get("bilet:t:cache:tag-b").await.unwrap(), None);
    assert_eq!(store.tag_size("itest-tag").await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn redis_never_ttl_persists() {
    let store = connect().await;

    store
        .set("bilet:t:cache:forever", "1", &[], Ttl::Never)
        .await
        .unwrap();
    assert_eq!(
        store.get("bilet:t:cache:forever").await.unwrap(),
        Some("1".to_string())
    );
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn redis_connect_fails_fast_on_dead_backend() {
    let result =
        CacheStore::connect_redis("redis://127.0.0.1:1", 2, Duration::from_millis(300)).await;
    assert!(result.is_err());
}
