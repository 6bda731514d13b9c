//! Caching behavior tests
//!
//! Cache hits must short-circuit before any provider is contacted, and a
//! stored response must come back equal to the original.

use crate::mock_providers::*;
use orchestrator_core::{CallParams, ProviderResponse};
use orchestrator_resilience::{cache_key, MemoryCache, ResponseCache, EVALUATION_TTL};
use orchestrator_routing::{CallOptions, Orchestrator};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

/// A cache hit returns the stored response without invoking any adapter
#[tokio::test]
async fn test_cache_hit_invokes_no_provider() {
    let cache = Arc::new(MemoryCache::new(32));
    let orchestrator = Orchestrator::with_cache(cache);
    let provider = MockProvider::new("p", MockBehavior::Succeed("generated".into()));
    orchestrator
        .register_provider(provider.clone(), test_config("p", 1))
        .expect("register");

    let options = CallOptions::default().with_cache_key("interview:q1");

    let first = orchestrator.call("generate question", options.clone()).await;
    assert!(first.success);
    assert_eq!(provider.calls(), 1);

    let second = orchestrator.call("generate question", options).await;
    assert!(second.success);
    assert_eq!(second.content, "generated");
    assert_eq!(provider.calls(), 1);

    let metrics = orchestrator.get_metrics();
    assert_eq!(metrics.cache_hits, 1);
    assert_eq!(metrics.cache_misses, 1);
}

/// A response stored and retrieved through the cache backend round-trips
/// with content, model, success, tokens, and metadata intact
#[tokio::test]
async fn test_response_round_trip_through_cache() {
    let cache = MemoryCache::new(8);
    let original = ProviderResponse::success("openai-key-1", "the answer", "gpt-4o-mini")
        .with_tokens_used(128)
        .with_response_time(0.9)
        .with_metadata("topic", serde_json::json!("system design"));

    let bytes = serde_json::to_vec(&original).expect("serialize");
    cache
        .set("roundtrip", bytes, EVALUATION_TTL)
        .await
        .expect("set");

    let stored = cache
        .get("roundtrip")
        .await
        .expect("get")
        .expect("entry present");
    let restored: ProviderResponse = serde_json::from_slice(&stored).expect("deserialize");

    assert_eq!(restored.content, original.content);
    assert_eq!(restored.model, original.model);
    assert_eq!(restored.success, original.success);
    assert_eq!(restored.tokens_used, original.tokens_used);
    assert_eq!(restored.metadata, original.metadata);
}

/// Distinct prompts and parameters produce distinct derived keys, so
/// different questions never collide in the cache
#[tokio::test]
async fn test_derived_keys_partition_the_cache() {
    let cache = Arc::new(MemoryCache::new(32));
    let orchestrator = Orchestrator::with_cache(cache);
    let provider = MockProvider::new("p", MockBehavior::Succeed("answer".into()));
    orchestrator
        .register_provider(provider.clone(), test_config("p", 1))
        .expect("register");

    let params = CallParams::default().with_temperature(0.7);
    let key_a = cache_key("interview", "question about rust", &params);
    let key_b = cache_key("interview", "question about sql", &params);
    assert_ne!(key_a, key_b);

    orchestrator
        .call("question about rust", CallOptions::default().with_cache_key(key_a))
        .await;
    orchestrator
        .call("question about sql", CallOptions::default().with_cache_key(key_b))
        .await;

    // Both prompts reached the provider; nothing collided
    assert_eq!(provider.calls(), 2);
}

/// Expired entries behave as misses and the provider is consulted again
#[tokio::test]
async fn test_expired_entry_is_a_miss() {
    let cache = Arc::new(MemoryCache::new(32));
    let orchestrator = Orchestrator::with_cache(cache);
    let provider = MockProvider::new("p", MockBehavior::Succeed("fresh".into()));
    orchestrator
        .register_provider(provider.clone(), test_config("p", 1))
        .expect("register");

    let options = CallOptions::default()
        .with_cache_key("short-lived")
        .with_cache_ttl(Duration::from_millis(20));

    orchestrator.call("q", options.clone()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    orchestrator.call("q", options).await;

    assert_eq!(provider.calls(), 2);
    assert_eq!(orchestrator.get_metrics().cache_misses, 2);
}
