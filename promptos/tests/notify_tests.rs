use std::sync::Arc;
use std::time::Duration;

use promptos::backend::memory::MemorySnapshot;
use promptos::{Backend, MemoryBackend, Poller};

#[tokio::test]
async fn poller_delivers_immediately_and_then_on_each_period() {
    let backend = Arc::new(MemoryBackend::new(MemorySnapshot::demo()));
    let session = backend
        .register("Ada", "ada@example.com", "hunter2")
        .await
        .expect("register");
    backend.set_token(Some(session.token));

    let mut poller = Poller::start(backend.clone(), Duration::from_millis(20));

    let first = tokio::time::timeout(Duration::from_secs(2), poller.rx.recv())
        .await
        .expect("first poll")
        .expect("channel open");
    assert!(first.is_empty());

    backend.join_space("MKT2024").await.expect("join");

    let mut latest = Vec::new();
    for _ in 0..50 {
        latest = tokio::time::timeout(Duration::from_secs(2), poller.rx.recv())
            .await
            .expect("next poll")
            .expect("channel open");
        if !latest.is_empty() {
            break;
        }
    }
    assert_eq!(latest.len(), 1);
    assert!(latest[0].message.contains("Marketing Team"));

    poller.stop().await;
}

#[tokio::test]
async fn failed_polls_are_skipped_until_stopped() {
    let backend = Arc::new(MemoryBackend::new(MemorySnapshot::demo()));
    let mut poller = Poller::start(backend, Duration::from_millis(10));

    let nothing = tokio::time::timeout(Duration::from_millis(100), poller.rx.recv()).await;
    assert!(nothing.is_err(), "signed-out polls should deliver nothing");

    tokio::time::timeout(Duration::from_secs(2), poller.stop())
        .await
        .expect("poller should stop promptly");
}
