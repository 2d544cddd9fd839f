//! # Configuration Precedence
//!
//! Folds all layers into a single merged snapshot.
//!
//! # Precedence Order
//! Layers are applied in ascending registration order; a later layer
//! overwrites any key an earlier layer produced. Typical registration order:
//! 1. Configuration files (lowest priority)
//! 2. Environment variables
//! 3. Command-line arguments (highest priority)
//!
//! Merging is a flat-key overwrite. Nested structure was already flattened by
//! the sources, so no deep merge happens here.

use crate::layer::LayerRegistry;
use sources::FlatMap;

/// Left fold of flat mappings with overwrite on key collision.
///
/// ## Usage
/// ```rust
/// use config::precedence::merge;
/// use sources::{ConfigKey, FlatMap};
///
/// let mut base = FlatMap::new();
/// base.insert("X".into(), "1".to_string());
/// let mut overlay = FlatMap::new();
/// overlay.insert("x".into(), "2".to_string());
///
/// let merged = merge([&base, &overlay]);
/// assert_eq!(merged.get(&ConfigKey::from("X")).unwrap(), "2");
/// ```
pub fn merge<'a, I>(layers: I) -> FlatMap
where
    I: IntoIterator<Item = &'a FlatMap>,
{
    let mut merged = FlatMap::new();
    for data in layers {
        for (key, value) in data {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Recomputes the merged snapshot from every registered layer.
pub(crate) fn rebuild(registry: &LayerRegistry) -> FlatMap {
    let layers = registry.layers();
    debug_assert!(layers.windows(2).all(|pair| pair[0].order < pair[1].order));
    merge(layers.iter().map(|layer| layer.data.as_ref()))
}
