//! Per-request set of configuration changes.

use std::collections::HashMap;
use std::path::PathBuf;

/// New state requested for a single key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateValue {
    /// Write `key=value`, replacing any existing line for the key.
    Set(String),
    /// Remove every line for the key.
    Delete,
}

impl UpdateValue {
    /// Build a value from raw request input. Blank input means deletion.
    pub fn from_input(raw: Option<&str>) -> Self {
        match raw {
            Some(v) if !v.trim().is_empty() => UpdateValue::Set(v.to_string()),
            _ => UpdateValue::Delete,
        }
    }
}

/// Ordered key → value updates.
///
/// Insertion order is preserved. Re-inserting an existing key replaces its
/// value but keeps the original position, so a later source can override an
/// earlier one without reordering the appended lines.
#[derive(Debug, Clone, Default)]
pub struct UpdateSet {
    entries: Vec<(String, UpdateValue)>,
    /// Key → position in `entries`.
    index: HashMap<String, usize>,
}

impl PartialEq for UpdateSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for UpdateSet {}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or override a key. Empty keys are ignored and reported as `false`.
    pub fn insert(&mut self, key: impl Into<String>, value: UpdateValue) -> bool {
        let key = key.into();
        if key.is_empty() {
            return false;
        }
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
        true
    }

    /// Convenience for `insert(key, UpdateValue::from_input(Some(raw)))`.
    pub fn insert_raw(&mut self, key: impl Into<String>, raw: &str) -> bool {
        self.insert(key, UpdateValue::from_input(Some(raw)))
    }

    /// Record an uploaded file placed at `path`.
    pub fn insert_upload(&mut self, key: impl Into<String>, path: PathBuf) -> bool {
        self.insert(key, UpdateValue::Set(path.to_string_lossy().into_owned()))
    }

    /// Apply `other` on top of `self`; keys in `other` win.
    pub fn extend(&mut self, other: UpdateSet) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&UpdateValue> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UpdateValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, UpdateValue)> for UpdateSet {
    fn from_iter<I: IntoIterator<Item = (K, UpdateValue)>>(iter: I) -> Self {
        let mut set = UpdateSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}
