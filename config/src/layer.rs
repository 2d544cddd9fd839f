//! # Layer Registry
//!
//! Ordered list of loaded configuration layers. Each layer carries a
//! precedence `order` taken from a single monotonic counter, so two layers
//! never share an order and later registrations always win on collision.

use crate::hot_reload::LayerWatch;
use parking_lot::Mutex;
use serde::Serialize;
use sources::{ConfigSource, FlatMap, SourceKind};
use std::sync::Arc;

/// Lifecycle of the file watch attached to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    /// No watch: dynamic layer, reload disabled, or watch setup failed.
    Unwatched,
    Watching,
    Reloading,
    /// Released at teardown; no further reloads happen.
    Stopped,
}

pub(crate) struct Layer {
    pub(crate) order: u64,
    pub(crate) source: Arc<dyn ConfigSource>,
    pub(crate) location: String,
    pub(crate) kind: SourceKind,
    pub(crate) is_dynamic: bool,
    /// Replaced wholesale on reload, never edited in place.
    pub(crate) data: Arc<FlatMap>,
    pub(crate) watch: Option<LayerWatch>,
    pub(crate) watch_state: Arc<Mutex<WatchState>>,
    /// Serializes load-and-swap cycles of this layer.
    pub(crate) reload_lock: Arc<Mutex<()>>,
}

/// Read-only description of a registered layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerInfo {
    pub order: u64,
    pub location: String,
    pub kind: SourceKind,
    pub is_dynamic: bool,
    pub key_count: usize,
    pub watch_state: WatchState,
}

impl LayerInfo {
    pub fn is_watching(&self) -> bool {
        matches!(
            self.watch_state,
            WatchState::Watching | WatchState::Reloading
        )
    }
}

#[derive(Default)]
pub(crate) struct LayerRegistry {
    layers: Vec<Layer>,
    next_order: u64,
}

impl LayerRegistry {
    /// Appends a layer with the next order and returns that order.
    pub(crate) fn register(&mut self, source: Arc<dyn ConfigSource>, data: FlatMap) -> u64 {
        let order = self.next_order;
        self.next_order += 1;

        self.layers.push(Layer {
            order,
            location: source.location(),
            kind: source.kind(),
            is_dynamic: source.is_dynamic(),
            source,
            data: Arc::new(data),
            watch: None,
            watch_state: Arc::new(Mutex::new(WatchState::Unwatched)),
            reload_lock: Arc::new(Mutex::new(())),
        });

        order
    }

    /// Layers in ascending precedence order.
    pub(crate) fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn get(&self, order: u64) -> Option<&Layer> {
        self.position(order).map(|index| &self.layers[index])
    }

    pub(crate) fn get_mut(&mut self, order: u64) -> Option<&mut Layer> {
        self.position(order).map(|index| &mut self.layers[index])
    }

    /// Replaces a layer's data wholesale. Returns false for unknown orders.
    pub(crate) fn replace_data(&mut self, order: u64, data: FlatMap) -> bool {
        match self.get_mut(order) {
            Some(layer) => {
                layer.data = Arc::new(data);
                true
            }
            None => false,
        }
    }

    /// Detaches every watch so the caller can release them outside any lock.
    pub(crate) fn take_watches(&mut self) -> Vec<LayerWatch> {
        self.layers
            .iter_mut()
            .filter_map(|layer| layer.watch.take())
            .collect()
    }

    pub(crate) fn info(&self) -> Vec<LayerInfo> {
        self.layers
            .iter()
            .map(|layer| LayerInfo {
                order: layer.order,
                location: layer.location.clone(),
                kind: layer.kind,
                is_dynamic: layer.is_dynamic,
                key_count: layer.data.len(),
                watch_state: *layer.watch_state.lock(),
            })
            .collect()
    }

    fn position(&self, order: u64) -> Option<usize> {
        self.layers
            .binary_search_by_key(&order, |layer| layer.order)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::{ConfigKey, MemorySource};

    fn memory(pairs: &[(&str, &str)]) -> (Arc<dyn ConfigSource>, FlatMap) {
        let source = MemorySource::new(pairs.iter().copied());
        let data = source.load().unwrap();
        (Arc::new(source), data)
    }

    #[test]
    fn test_orders_are_strictly_increasing() {
        let mut registry = LayerRegistry::default();
        let (s1, d1) = memory(&[("A", "1")]);
        let (s2, d2) = memory(&[("A", "2")]);
        let (s3, d3) = memory(&[]);

        let o1 = registry.register(s1, d1);
        let o2 = registry.register(s2, d2);
        let o3 = registry.register(s3, d3);

        assert!(o1 < o2 && o2 < o3);
        let orders: Vec<u64> = registry.layers().iter().map(|l| l.order).collect();
        assert_eq!(orders, vec![o1, o2, o3]);
    }

    #[test]
    fn test_replace_data_is_wholesale() {
        let mut registry = LayerRegistry::default();
        let (source, data) = memory(&[("A", "1"), ("B", "2")]);
        let order = registry.register(source, data);

        let mut replacement = FlatMap::new();
        replacement.insert("C".into(), "3".to_string());
        assert!(registry.replace_data(order, replacement));

        let layer = registry.get(order).unwrap();
        assert_eq!(layer.data.len(), 1);
        assert!(layer.data.contains_key(&ConfigKey::from("c")));
        assert!(!registry.replace_data(order + 100, FlatMap::new()));
    }

    #[test]
    fn test_info_reports_layers() {
        let mut registry = LayerRegistry::default();
        let (source, data) = memory(&[("A", "1"), ("B", "2")]);
        registry.register(source, data);

        let info = registry.info();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].location, "<Memory>");
        assert_eq!(info[0].kind, SourceKind::Memory);
        assert!(info[0].is_dynamic);
        assert_eq!(info[0].key_count, 2);
        assert_eq!(info[0].watch_state, WatchState::Unwatched);
    }
}
