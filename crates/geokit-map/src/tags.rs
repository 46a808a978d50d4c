//! Object tags: an ordered key-value container

use serde::{Deserialize, Serialize};

/// Ordered mapping from tag key to value.
///
/// Keys keep the position of their first insertion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tags {
    entries: Vec<(String, String)>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert a value, replacing the value of an existing key in place.
    pub fn insert_or_assign(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert a value only if the key is not present yet.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains(&key) {
            return false;
        }
        self.entries.push((key, value.into()));
        true
    }

    /// Merge another tag set into this one; keys present in `other` win.
    pub fn merge_from(&mut self, other: &Tags) {
        for (key, value) in other.iter() {
            self.insert_or_assign(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Tags {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for (k, v) in iter {
            tags.insert_or_assign(k, v);
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_or_assign_keeps_order() {
        let mut tags = Tags::new();
        tags.insert_or_assign("a", "1");
        tags.insert_or_assign("b", "2");
        tags.insert_or_assign("a", "3");
        let collected: Vec<_> = tags.iter().collect();
        assert_eq!(collected, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_insert_does_not_overwrite() {
        let mut tags = Tags::new();
        assert!(tags.insert("a", "1"));
        assert!(!tags.insert("a", "2"));
        assert_eq!(tags.get("a"), Some("1"));
    }

    #[test]
    fn test_merge_from() {
        let mut base: Tags = vec![("name".to_string(), "x".to_string())].into_iter().collect();
        let mut other = Tags::new();
        other.insert_or_assign("Rotation", "45");
        base.merge_from(&other);
        assert_eq!(base.len(), 2);
        assert_eq!(base.get("Rotation"), Some("45"));
    }
}
