//! # Configuration Hot Reload
//!
//! Watches the files behind reload-enabled layers and reloads a layer when
//! its file changes.
//!
//! Each watched layer owns one debounced `notify` watcher on the file's
//! parent directory. The debouncer coalesces the burst of events from a
//! single save into one batch; batches that mention the file trigger one
//! reload cycle on the debouncer thread.
//!
//! Dropping a [`LayerWatch`] marks it stopped, waits for an in-flight reload
//! to finish and releases the OS watch, so no reload starts after the drop
//! returns.

use crate::layer::WatchState;
use errors::ConfigError;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, DebouncedEvent, Debouncer, new_debouncer};
use parking_lot::{Mutex, ReentrantMutex};
use std::ffi::OsString;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Receiver of debounced change notifications.
pub(crate) trait ReloadTarget: Send + Sync {
    /// Runs one reload cycle for the layer with `order`.
    fn reload_layer(&self, order: u64);
}

/// Live watch resource bound to one file-backed layer.
pub(crate) struct LayerWatch {
    location: String,
    debouncer: Option<Debouncer<RecommendedWatcher>>,
    // Held for the duration of a reload. Reentrant so a change handler on
    // the debouncer thread can tear the watch down.
    gate: Arc<ReentrantMutex<()>>,
    state: Arc<Mutex<WatchState>>,
}

impl LayerWatch {
    /// Starts watching `path` for the layer with `order`.
    ///
    /// ## Events
    /// Any debounced event naming the file triggers a reload. Events for
    /// other files in the same directory are ignored.
    pub(crate) fn start(
        path: &Path,
        order: u64,
        debounce: Duration,
        state: Arc<Mutex<WatchState>>,
        target: Weak<dyn ReloadTarget>,
    ) -> Result<Self, ConfigError> {
        let location = path.display().to_string();
        let watch_error = |reason: String| ConfigError::Watch {
            location: location.clone(),
            reason,
        };

        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| watch_error("path has no file name".to_string()))?;
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let gate = Arc::new(ReentrantMutex::new(()));
        let callback_gate = Arc::clone(&gate);
        let callback_state = Arc::clone(&state);

        let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
            match result {
                Ok(events) if mentions(&events, &file_name) => {
                    let _running = callback_gate.lock();
                    reload(order, &callback_state, &target);
                }
                Ok(events) => debug!("Ignoring {} unrelated event(s)", events.len()),
                Err(e) => warn!("Watch error: {}", e),
            }
        })
        .map_err(|e| watch_error(format!("failed to create file watcher: {}", e)))?;

        debouncer
            .watcher()
            .watch(directory, RecursiveMode::NonRecursive)
            .map_err(|e| watch_error(format!("failed to watch {:?}: {}", directory, e)))?;

        *state.lock() = WatchState::Watching;
        info!("Watching config file: {}", location);

        Ok(Self {
            location,
            debouncer: Some(debouncer),
            gate,
            state,
        })
    }

    fn release(&mut self) {
        {
            let _running = self.gate.lock();
            *self.state.lock() = WatchState::Stopped;
        }

        drop(self.debouncer.take());
        debug!("Stopped watching config file: {}", self.location);
    }
}

impl Drop for LayerWatch {
    fn drop(&mut self) {
        self.release();
    }
}

fn mentions(events: &[DebouncedEvent], file_name: &OsString) -> bool {
    events
        .iter()
        .any(|event| event.path.file_name() == Some(file_name.as_os_str()))
}

fn reload(order: u64, state: &Mutex<WatchState>, target: &Weak<dyn ReloadTarget>) {
    let Some(target) = target.upgrade() else {
        return;
    };

    {
        let mut current = state.lock();
        if *current == WatchState::Stopped {
            return;
        }
        *current = WatchState::Reloading;
    }

    target.reload_layer(order);

    let mut current = state.lock();
    if *current == WatchState::Reloading {
        *current = WatchState::Watching;
    }
}
