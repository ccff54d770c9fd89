use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use emitter::{EmitOptions, Emitter};
use orchestrator::{Orchestrator, WatchEvent, WatchOptions, Watcher};
use plugins::testing::StubPlugin;
use plugins::{GenerateOptions, PluginError};
use tempfile::TempDir;
use tokio::time::timeout;

fn schema_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("schema.prisma");
    std::fs::write(&path, "model User { id String @id }").expect("Failed to write schema");
    path
}

fn manual(path: &Path) -> WatchOptions {
    WatchOptions {
        initial_run: false,
        watch_files: false,
        ..WatchOptions::new(path, GenerateOptions::new("generated", path.display().to_string()))
            .with_debounce(Duration::from_millis(50))
    }
}

async fn next(watcher: &mut Watcher) -> WatchEvent {
    timeout(Duration::from_secs(5), watcher.next_event())
        .await
        .expect("Timed out waiting for a watch event")
        .expect("Watcher closed")
}

async fn assert_quiet(watcher: &mut Watcher, window: Duration) {
    if let Ok(event) = timeout(window, watcher.next_event()).await {
        panic!("Unexpected watch event: {:?}", event);
    }
}

async fn wait_until_running(watcher: &Watcher) {
    timeout(Duration::from_secs(5), async {
        while !watcher.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Run never started");
}

#[tokio::test]
async fn test_burst_of_changes_runs_once() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let path = schema_file(&dir);
    let generator = StubPlugin::new("rest").with_file("a.ts", "a");
    let calls = generator.calls();
    let orchestrator =
        Orchestrator::new().parser(Arc::new(StubPlugin::new("prisma"))).generator(Arc::new(generator));

    let mut watcher = orchestrator.watch(manual(&path)).expect("watch");
    for _ in 0..5 {
        watcher.trigger();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    match next(&mut watcher).await {
        WatchEvent::Generated { files, .. } => assert_eq!(files, 1),
        other => panic!("Expected Generated, got {:?}", other),
    }
    assert_quiet(&mut watcher, Duration::from_millis(300)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    watcher.stop().await;
}

#[tokio::test]
async fn test_changes_during_run_collapse_into_one_follow_up() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let path = schema_file(&dir);
    let generator = StubPlugin::new("rest").with_delay(Duration::from_millis(300));
    let calls = generator.calls();
    let orchestrator =
        Orchestrator::new().parser(Arc::new(StubPlugin::new("prisma"))).generator(Arc::new(generator));

    let options = WatchOptions { initial_run: true, ..manual(&path) };
    let mut watcher = orchestrator.watch(options).expect("watch");

    wait_until_running(&watcher).await;
    watcher.trigger();
    watcher.trigger();
    watcher.trigger();

    assert!(matches!(next(&mut watcher).await, WatchEvent::Generated { .. }));
    assert!(matches!(next(&mut watcher).await, WatchEvent::Generated { .. }));
    assert_quiet(&mut watcher, Duration::from_millis(500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    watcher.stop().await;
}

#[tokio::test]
async fn test_stop_waits_for_in_flight_run() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let path = schema_file(&dir);
    let out = dir.path().join("generated");
    let generator = StubPlugin::new("rest").with_file("index.ts", "x").with_delay(Duration::from_millis(200));
    let calls = generator.calls();
    let orchestrator =
        Orchestrator::new().parser(Arc::new(StubPlugin::new("prisma"))).generator(Arc::new(generator));

    let options = WatchOptions { initial_run: true, ..manual(&path) }.with_emitter(Emitter::new(EmitOptions::new(&out)));
    let watcher = orchestrator.watch(options).expect("watch");

    wait_until_running(&watcher).await;
    watcher.trigger();
    watcher.stop().await;

    assert!(out.join("index.ts").exists());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_run_is_reported_and_watching_continues() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let path = schema_file(&dir);
    let orchestrator = Orchestrator::new()
        .parser(Arc::new(StubPlugin::new("prisma").failing(PluginError::Parse("bad model".to_string()))))
        .generator(Arc::new(StubPlugin::new("rest")));

    let mut watcher = orchestrator.watch(manual(&path)).expect("watch");

    watcher.trigger();
    match next(&mut watcher).await {
        WatchEvent::Failed { error } => {
            assert!(error.contains("prisma"));
            assert!(error.contains("bad model"));
        }
        other => panic!("Expected Failed, got {:?}", other),
    }

    watcher.trigger();
    assert!(next(&mut watcher).await.is_error());

    watcher.stop().await;
}

#[tokio::test]
async fn test_missing_schema_file_fails_run() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let path = dir.path().join("missing.prisma");
    let orchestrator =
        Orchestrator::new().parser(Arc::new(StubPlugin::new("prisma"))).generator(Arc::new(StubPlugin::new("rest")));

    let mut watcher = orchestrator.watch(WatchOptions { initial_run: true, ..manual(&path) }).expect("watch");
    assert!(next(&mut watcher).await.is_error());
    watcher.stop().await;
}

#[tokio::test]
async fn test_file_change_triggers_run() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let path = schema_file(&dir);
    let orchestrator = Orchestrator::new()
        .parser(Arc::new(StubPlugin::new("prisma")))
        .generator(Arc::new(StubPlugin::new("rest").with_file("a.ts", "a")));

    let options = WatchOptions { watch_files: true, ..manual(&path) };
    let mut watcher = orchestrator.watch(options).expect("watch");

    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(&path, "model User { id String @id\n email String }").expect("Failed to modify schema");

    assert!(matches!(next(&mut watcher).await, WatchEvent::Generated { .. }));
    watcher.stop().await;
}
