//! Engine lifecycle tests.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use vconv_media::{EngineLifecycle, EngineState};

use super::support::{CountingLoader, MemoryEngine};

fn lifecycle_with(loader: CountingLoader) -> Arc<EngineLifecycle> {
    Arc::new(EngineLifecycle::new(loader))
}

/// Concurrent callers on an unloaded engine share one construction.
#[tokio::test]
async fn test_concurrent_ensure_ready_loads_once() {
    let loader =
        CountingLoader::new(Arc::new(MemoryEngine::new())).with_delay(Duration::from_millis(50));
    let calls = loader.calls();
    let lifecycle = lifecycle_with(loader);

    let (a, b) = tokio::join!(lifecycle.ensure_ready(), lifecycle.ensure_ready());

    let a = a.expect("first caller should see a ready engine");
    let b = b.expect("second caller should see a ready engine");
    assert!(a.same_engine(&b));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(lifecycle.load_attempts(), 1);
    assert_eq!(lifecycle.state(), EngineState::Ready);
}

/// Same guarantee with real worker threads.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ensure_ready_across_threads() {
    let loader =
        CountingLoader::new(Arc::new(MemoryEngine::new())).with_delay(Duration::from_millis(50));
    let calls = loader.calls();
    let lifecycle = lifecycle_with(loader);

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let lifecycle = Arc::clone(&lifecycle);
            tokio::spawn(async move { lifecycle.ensure_ready().await })
        })
        .collect();

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap().unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(handles.windows(2).all(|w| w[0].same_engine(&w[1])));
}

/// Waiters on a failed load observe the same failure.
#[tokio::test]
async fn test_concurrent_failure_is_shared() {
    let loader = CountingLoader::new(Arc::new(MemoryEngine::new()))
        .with_delay(Duration::from_millis(50))
        .failing_first(1);
    let calls = loader.calls();
    let lifecycle = lifecycle_with(loader);

    let (a, b) = tokio::join!(lifecycle.ensure_ready(), lifecycle.ensure_ready());

    let a = a.unwrap_err();
    let b = b.unwrap_err();
    assert_eq!(a.to_string(), b.to_string());
    assert!(a.to_string().contains("connection reset"));
    assert!(!a.is_unsupported());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(lifecycle.state(), EngineState::LoadFailed);
}

/// A failed load is not terminal: the next caller tries again.
#[tokio::test]
async fn test_retry_after_failure() {
    let loader = CountingLoader::new(Arc::new(MemoryEngine::new())).failing_first(1);
    let calls = loader.calls();
    let lifecycle = lifecycle_with(loader);

    assert!(lifecycle.ensure_ready().await.is_err());
    assert!(lifecycle.ensure_ready().await.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(lifecycle.state(), EngineState::Ready);
}

#[tokio::test]
async fn test_unsupported_environment() {
    let lifecycle = lifecycle_with(CountingLoader::new(Arc::new(MemoryEngine::new())).unsupported());

    let err = lifecycle.ensure_ready().await.unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(lifecycle.state(), EngineState::LoadFailed);
}

/// Ready engines are returned without invoking the loader again.
#[tokio::test]
async fn test_ready_engine_is_reused() {
    let loader = CountingLoader::new(Arc::new(MemoryEngine::new()));
    let calls = loader.calls();
    let lifecycle = lifecycle_with(loader);

    let first = lifecycle.ensure_ready().await.unwrap();
    let second = lifecycle.ensure_ready().await.unwrap();
    assert!(first.same_engine(&second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_teardown_then_reload() {
    let loader = CountingLoader::new(Arc::new(MemoryEngine::new()));
    let calls = loader.calls();
    let lifecycle = lifecycle_with(loader);

    assert_eq!(lifecycle.state(), EngineState::Unloaded);
    assert!(!lifecycle.teardown());

    lifecycle.ensure_ready().await.unwrap();
    assert!(lifecycle.teardown());
    assert_eq!(lifecycle.state(), EngineState::Unloaded);

    lifecycle.ensure_ready().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Dropping the loading caller midway must not strand later callers.
#[tokio::test]
async fn test_abandoned_load_is_recovered() {
    let loader =
        CountingLoader::new(Arc::new(MemoryEngine::new())).with_delay(Duration::from_millis(200));
    let calls = loader.calls();
    let lifecycle = lifecycle_with(loader);

    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), lifecycle.ensure_ready()).await;
    assert!(abandoned.is_err());
    assert_eq!(lifecycle.state(), EngineState::Unloaded);

    lifecycle.ensure_ready().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
