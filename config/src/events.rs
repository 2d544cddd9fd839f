//! Change and error notifications.
//!
//! Events are published on a `tokio::sync::broadcast` channel and to any
//! registered synchronous callbacks. Publishing never blocks and does not
//! require a runtime; slow broadcast receivers observe `Lagged` instead of
//! stalling reloads.

use crate::diff::ChangeRecord;
use errors::ConfigError;
use parking_lot::RwLock;
use sources::SourceKind;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A reload changed the merged snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub changes: ChangeRecord,
    /// Location of the layer whose reload caused the change.
    pub location: String,
    pub source_kind: SourceKind,
}

/// A watch could not be established or a reload failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub location: String,
    pub source_kind: SourceKind,
    pub error: ConfigError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigEvent {
    Changed(ChangeEvent),
    Error(ErrorEvent),
}

type ChangeHandler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;
type ErrorHandler = Arc<dyn Fn(&ErrorEvent) + Send + Sync>;

pub(crate) struct EventHub {
    sender: broadcast::Sender<ConfigEvent>,
    change_handlers: RwLock<Vec<ChangeHandler>>,
    error_handlers: RwLock<Vec<ErrorHandler>>,
}

impl EventHub {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            change_handlers: RwLock::new(Vec::new()),
            error_handlers: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ConfigEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn on_change(&self, handler: ChangeHandler) {
        self.change_handlers.write().push(handler);
    }

    pub(crate) fn on_error(&self, handler: ErrorHandler) {
        self.error_handlers.write().push(handler);
    }

    pub(crate) fn publish_change(&self, event: ChangeEvent) {
        // Handlers run without the registry lock held, so they may register
        // further handlers or query the configuration.
        let handlers = self.change_handlers.read().clone();
        for handler in &handlers {
            handler(&event);
        }
        // No receivers is not an error.
        let _ = self.sender.send(ConfigEvent::Changed(event));
    }

    pub(crate) fn publish_error(&self, event: ErrorEvent) {
        let handlers = self.error_handlers.read().clone();
        for handler in &handlers {
            handler(&event);
        }
        let _ = self.sender.send(ConfigEvent::Error(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn change_event() -> ChangeEvent {
        ChangeEvent {
            changes: ChangeRecord::default(),
            location: "/etc/app.json".to_string(),
            source_kind: SourceKind::Json,
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let hub = EventHub::new(4);
        hub.publish_change(change_event());
    }

    #[test]
    fn test_subscriber_receives_change() {
        let hub = EventHub::new(4);
        let mut rx = hub.subscribe();
        hub.publish_change(change_event());

        match rx.try_recv().unwrap() {
            ConfigEvent::Changed(event) => assert_eq!(event.location, "/etc/app.json"),
            other => panic!("Expected Changed event, got {:?}", other),
        }
    }

    #[test]
    fn test_callbacks_invoked() {
        let hub = EventHub::new(4);
        let changes = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&changes);
        hub.on_change(Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        let e = Arc::clone(&errors);
        hub.on_error(Arc::new(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        }));

        hub.publish_change(change_event());
        hub.publish_error(ErrorEvent {
            location: "/etc/app.json".to_string(),
            source_kind: SourceKind::Json,
            error: ConfigError::Disposed,
        });

        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_receiver() {
        let hub = EventHub::new(4);
        let mut rx = hub.subscribe();
        hub.publish_error(ErrorEvent {
            location: "<x>".to_string(),
            source_kind: SourceKind::Yaml,
            error: ConfigError::Disposed,
        });

        let event = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .expect("Timeout waiting for event")
            .expect("Channel closed");
        assert!(matches!(event, ConfigEvent::Error(_)));
    }
}
