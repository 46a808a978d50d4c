//! Style-keyed caches
//!
//! Entries are never evicted; a cache lives as long as one import.

use geokit_map::{ColorId, Map, MapColor, Rgb};
use std::collections::HashMap;

use crate::style::get_rgb_from_string;

/// Cache from style text to a value, first writer wins
#[derive(Debug, Clone)]
pub struct StyleCache<V> {
    entries: HashMap<String, V>,
}

impl<V> Default for StyleCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V: Clone> StyleCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).cloned()
    }

    /// Insert unless the key is taken. Returns false if it was.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> bool {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, value);
        true
    }

    /// Register a value under the full style key and, if different, the
    /// canonical key of the single tool it came from.
    pub fn register(&mut self, style_key: &str, tool_key: &str, value: V) {
        self.insert(style_key, value.clone());
        if tool_key != style_key {
            self.insert(tool_key, value);
        }
    }

    /// Look up a key, creating and caching the value on a miss.
    pub fn get_or_insert_with<F>(&mut self, key: &str, create: F) -> V
    where
        F: FnOnce() -> V,
    {
        self.entries
            .entry(key.to_string())
            .or_insert_with(create)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Document colors keyed by their source color string
///
/// `None` entries record fully transparent colors.
#[derive(Debug, Clone, Default)]
pub struct ColorCache {
    cache: StyleCache<Option<ColorId>>,
}

impl ColorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The map color for a color string.
    ///
    /// Strings that cannot be parsed resolve to `fallback`; transparent
    /// colors resolve to `None`.
    pub fn get_or_create(
        &mut self,
        map: &mut Map,
        color_string: &str,
        fallback: ColorId,
    ) -> Option<ColorId> {
        self.cache.get_or_insert_with(color_string, || {
            match get_rgb_from_string(color_string) {
                None => Some(fallback),
                Some((_, _, _, 0)) => None,
                Some((r, g, b, _)) => {
                    let id =
                        map.add_color(MapColor::from_rgb(color_string, Rgb::new(r, g, b)));
                    tracing::debug!("Created color {} for '{}'", id.0, color_string);
                    Some(id)
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
