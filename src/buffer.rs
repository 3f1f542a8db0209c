// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The per-proxy overlay of pending values.
//!
//! Every [`BufferedProxy`](crate::BufferedProxy) owns exactly one [`Buffer`]. Entries remember
//! whether they were produced by a read (a memoized wrapper or primitive) or by a write through
//! the gate. Only written entries count as pending changes.
use crate::{BufferRandomState, proxy::BufferedValue};
use std::collections::HashMap;

/// How a buffer entry came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Memoized on first read, so repeated reads return the same wrapper.
    Read,
    /// Written through the gate.
    Write,
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) value: BufferedValue,
    pub(crate) origin: Origin,
}

/// Mapping from property key to pending value.
#[derive(Debug, Default)]
pub struct Buffer {
    entries: HashMap<String, Entry, BufferRandomState>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the buffer.
    ///
    /// With a non-empty `subset`, only those keys are deleted. Otherwise the whole mapping is
    /// replaced by a fresh, empty one.
    pub fn initialize(&mut self, subset: Option<&[&str]>) {
        match subset {
            Some(keys) if !keys.is_empty() => {
                for key in keys {
                    self.entries.remove(*key);
                }
            }
            _ => self.entries = HashMap::default(),
        }
    }

    pub fn has_entry(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&BufferedValue> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn origin(&self, key: &str) -> Option<Origin> {
        self.entries.get(key).map(|entry| entry.origin)
    }

    /// Stores a written value.
    pub fn set(&mut self, key: impl Into<String>, value: BufferedValue) {
        self.insert(key.into(), value, Origin::Write);
    }

    /// Stores a value produced by a read.
    pub fn cache(&mut self, key: impl Into<String>, value: BufferedValue) {
        self.insert(key.into(), value, Origin::Read);
    }

    fn insert(&mut self, key: String, value: BufferedValue, origin: Origin) {
        tracing::trace!(%key, ?origin, "buffering value");
        self.entries.insert(key, Entry { value, origin });
    }

    pub fn delete(&mut self, key: &str) -> Option<BufferedValue> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Returns true if any entry was written (as opposed to memoized by a read).
    pub fn has_pending(&self) -> bool {
        self.entries
            .values()
            .any(|entry| entry.origin == Origin::Write)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all keys in ascending order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.entries.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Snapshots the entries selected by `subset` (all of them for `None`), in key order.
    pub(crate) fn entries(&self, subset: Option<&[&str]>) -> Vec<(String, Entry)> {
        let mut selected: Vec<_> = self
            .entries
            .iter()
            .filter(|(key, _)| subset.is_none_or(|keys| keys.contains(&key.as_str())))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();
        selected.sort_unstable_by(|(k1, _), (k2, _)| k1.cmp(k2));
        selected
    }
}
