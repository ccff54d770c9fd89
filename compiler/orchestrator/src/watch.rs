//! Regenerate on schema changes.
//!
//! A [`Watcher`] owns one background task. File events (from `notify`) and
//! manual [`Watcher::trigger`] calls are debounced into runs; a run executes
//! inline in the task, so two runs never overlap. Changes that arrive while
//! a run is in flight collapse into a single follow-up run.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use emitter::{Emitter, WriteReport};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use plugins::{GenerateOptions, SourceInput};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{Orchestrator, OrchestratorError, Result};

/// Default quiet period before a run starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Settings for [`Orchestrator::watch`].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Schema file to read on every run
    pub schema_path: PathBuf,
    /// Options passed to every plugin
    pub generate: GenerateOptions,
    /// Quiet period that collapses bursts of changes
    pub debounce: Duration,
    /// Where to write each run's output, if anywhere
    pub emitter: Option<Emitter>,
    /// Run once immediately after starting
    pub initial_run: bool,
    /// Subscribe to file system events for `schema_path`
    pub watch_files: bool,
}

impl WatchOptions {
    /// Watch `schema_path` with default settings.
    pub fn new(schema_path: impl Into<PathBuf>, generate: GenerateOptions) -> Self {
        Self {
            schema_path: schema_path.into(),
            generate,
            debounce: DEFAULT_DEBOUNCE,
            emitter: None,
            initial_run: true,
            watch_files: true,
        }
    }

    /// Set the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Write every run's output through `emitter`.
    pub fn with_emitter(mut self, emitter: Emitter) -> Self {
        self.emitter = Some(emitter);
        self
    }
}

/// Outcome of one watcher run.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// The run succeeded.
    Generated {
        /// Number of files produced
        files: usize,
        /// Number of merged dependencies
        dependencies: usize,
        /// Wall-clock duration of the run
        elapsed: Duration,
        /// Emitter report, when an emitter is configured
        report: Option<WriteReport>,
    },
    /// The run failed; the watcher keeps going.
    Failed {
        /// Rendered error
        error: String,
    },
}

impl WatchEvent {
    /// Whether this is a failure event.
    pub fn is_error(&self) -> bool { matches!(self, WatchEvent::Failed { .. }) }
}

/// Handle to a running watch loop.
pub struct Watcher {
    changes: mpsc::UnboundedSender<()>,
    stop: watch::Sender<bool>,
    events: mpsc::UnboundedReceiver<WatchEvent>,
    running: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    _fs_watcher: Option<RecommendedWatcher>,
}

impl Orchestrator {
    /// Start watching. Must be called inside a tokio runtime.
    pub fn watch(&self, options: WatchOptions) -> Result<Watcher> {
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        let running = Arc::new(AtomicBool::new(false));

        let fs_watcher =
            if options.watch_files { Some(subscribe(&options.schema_path, changes_tx.clone())?) } else { None };

        if options.initial_run {
            // Cannot fail: the receiver is alive until the task ends.
            let _ = changes_tx.send(());
        }

        let task = tokio::spawn(run_loop(
            self.clone(),
            options,
            changes_rx,
            events_tx,
            stop_rx,
            Arc::clone(&running),
        ));

        Ok(Watcher {
            changes: changes_tx,
            stop: stop_tx,
            events: events_rx,
            running,
            task: Some(task),
            _fs_watcher: fs_watcher,
        })
    }
}

impl Watcher {
    /// Report a change as if the schema file had been touched.
    pub fn trigger(&self) { let _ = self.changes.send(()); }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool { self.running.load(Ordering::SeqCst) }

    /// Next run outcome; `None` once the watcher has stopped and every
    /// event has been received.
    pub async fn next_event(&mut self) -> Option<WatchEvent> { self.events.recv().await }

    /// Prevent future runs, wait for an in-flight run to finish, and return.
    pub async fn stop(mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "watch task ended abnormally");
            }
        }
        debug!("watcher stopped");
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

/// Forward `notify` events concerning `schema_path` into `changes`.
fn subscribe(schema_path: &Path, changes: mpsc::UnboundedSender<()>) -> Result<RecommendedWatcher> {
    let file_name = schema_path.file_name().map(|n| n.to_os_string());
    let directory = match schema_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| match event {
        Ok(event) => {
            if matches!(event.kind, EventKind::Access(_)) {
                return;
            }
            let relevant = event.paths.iter().any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if relevant {
                let _ = changes.send(());
            }
        }
        Err(e) => warn!(error = %e, "file watcher error"),
    })
    .map_err(|e| OrchestratorError::Watch(e.to_string()))?;

    watcher
        .watch(&directory, RecursiveMode::NonRecursive)
        .map_err(|e| OrchestratorError::Watch(e.to_string()))?;

    info!(path = %schema_path.display(), "watching schema");
    Ok(watcher)
}

async fn run_loop(
    orchestrator: Orchestrator,
    options: WatchOptions,
    mut changes: mpsc::UnboundedReceiver<()>,
    events: mpsc::UnboundedSender<WatchEvent>,
    mut stop: watch::Receiver<bool>,
    running: Arc<AtomicBool>,
) {
    let mut pending = false;

    loop {
        if !pending {
            tokio::select! {
                _ = stop.changed() => break,
                change = changes.recv() => if change.is_none() { break },
            }
        }

        // Debounce: wait until no change arrived for a full window.
        loop {
            tokio::select! {
                _ = stop.changed() => return,
                _ = tokio::time::sleep(options.debounce) => break,
                change = changes.recv() => if change.is_none() { return },
            }
        }

        running.store(true, Ordering::SeqCst);
        let event = run_once(&orchestrator, &options).await;
        running.store(false, Ordering::SeqCst);

        if events.send(event).is_err() {
            debug!("watch events receiver dropped");
        }

        if *stop.borrow() {
            break;
        }

        pending = false;
        while changes.try_recv().is_ok() {
            pending = true;
        }
        if pending {
            debug!("changes arrived during the run, scheduling one follow-up run");
        }
    }
}

async fn run_once(orchestrator: &Orchestrator, options: &WatchOptions) -> WatchEvent {
    let started = Instant::now();

    let result = async {
        let bytes = tokio::fs::read(&options.schema_path).await?;
        let input = match String::from_utf8(bytes) {
            Ok(text) => SourceInput::Text(text),
            Err(e) => SourceInput::Bytes(e.into_bytes()),
        };
        let code = orchestrator.generate(&input, Some(&options.schema_path), &options.generate).await?;
        let report = match &options.emitter {
            Some(emitter) => Some(emitter.write(&code).await?),
            None => None,
        };
        Ok::<_, OrchestratorError>((code.files.len(), code.dependencies.len(), report))
    }
    .await;

    let elapsed = started.elapsed();
    match result {
        Ok((files, dependencies, report)) => {
            info!(files, dependencies, elapsed_ms = elapsed.as_millis() as u64, "regenerated");
            WatchEvent::Generated { files, dependencies, elapsed, report }
        }
        Err(e) => {
            warn!(error = %e, "regeneration failed");
            WatchEvent::Failed { error: e.to_string() }
        }
    }
}
