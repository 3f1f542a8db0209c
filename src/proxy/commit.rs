// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Applying and discarding buffered changes.
use super::{BufferedProxy, BufferedValue, PropertyKey};
use crate::{
    BufferRandomState,
    buffer::Origin,
    host::{HostError, Object, Value},
};
use smallvec::SmallVec;
use std::collections::HashSet;

/// A buffered write that content refused during an apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedWrite {
    /// Dotted path of the key, relative to the proxy that was applied.
    pub key: String,
    pub error: HostError,
}

/// The outcome of applying a proxy's buffer to its content.
///
/// Keys of nested proxies and sequences are reported as dotted paths, such as `address.city`
/// or `tags.0.label`. The buffer is cleared whether or not every write went through, so a
/// skipped write is lost unless the caller acts on the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Keys written into content, in the order they were written.
    pub applied: Vec<String>,
    pub skipped: Vec<SkippedWrite>,
}

impl ApplyReport {
    /// Returns true if no write was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub(crate) fn absorb(&mut self, prefix: &str, nested: ApplyReport) {
        self.applied.extend(
            nested
                .applied
                .into_iter()
                .map(|key| format!("{prefix}.{key}")),
        );
        self.skipped
            .extend(nested.skipped.into_iter().map(|SkippedWrite { key, error }| {
                SkippedWrite {
                    key: format!("{prefix}.{key}"),
                    error,
                }
            }));
    }

    fn write(&mut self, content: &Object, key: &str, value: Value) {
        match content.try_set(key, value) {
            Ok(()) => self.applied.push(key.to_owned()),
            Err(error) => {
                tracing::debug!(%key, %error, "skipping buffered write");
                self.skipped.push(SkippedWrite {
                    key: key.to_owned(),
                    error,
                });
            }
        }
    }
}

/// Identities of the proxies and sequences currently being committed or discarded.
#[derive(Debug, Default)]
pub(crate) struct Visiting(HashSet<usize, BufferRandomState>);

impl Visiting {
    /// Marks `id` as in progress. Returns false if it already was.
    pub(crate) fn enter(&mut self, id: usize) -> bool {
        let entered = self.0.insert(id);
        if !entered {
            tracing::debug!(id, "cycle detected, not descending");
        }
        entered
    }

    pub(crate) fn leave(&mut self, id: usize) {
        self.0.remove(&id);
    }
}

impl BufferedProxy {
    /// Writes the buffered entries selected by `subset` (all of them for `None`) into content.
    ///
    /// Nested proxies and sequences are applied recursively first. Afterwards the selected
    /// entries are removed from the buffer, including any whose write content refused; those
    /// are listed in the returned [`ApplyReport`]. An empty `subset` writes nothing and clears
    /// the whole buffer.
    pub fn apply_buffered_changes(&self, subset: Option<&[&str]>) -> ApplyReport {
        self.apply_guarded(subset, &mut Visiting::default())
    }

    /// Applies every buffered change.
    pub fn apply_changes(&self) -> ApplyReport {
        self.apply_buffered_changes(None)
    }

    pub(crate) fn apply_guarded(
        &self,
        subset: Option<&[&str]>,
        visiting: &mut Visiting,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();
        if !visiting.enter(self.id()) {
            return report;
        }

        let (content, entries) = {
            let state = self.0.borrow();
            (state.content.clone(), state.buffer.entries(subset))
        };

        if let Some(content) = &content {
            for (key, entry) in entries {
                match entry.value {
                    // memoized reads may be stale by now, and never carry an edit
                    BufferedValue::Value(_) if entry.origin == Origin::Read => {}
                    BufferedValue::Value(value) => report.write(content, &key, value),
                    BufferedValue::Proxy(nested) => {
                        let current = entry.origin == Origin::Write
                            || content
                                .get(&key)
                                .as_object()
                                .zip(nested.content())
                                .is_some_and(|(stored, wrapped)| stored.ptr_eq(&wrapped));
                        report.absorb(&key, nested.apply_guarded(None, visiting));
                        if current {
                            tracing::trace!(%key, kind = ?nested.element_kind(), "storing nested content");
                            report.write(content, &key, nested.content().into());
                        } else {
                            tracing::debug!(%key, "content was reassigned since the read, not storing");
                        }
                    }
                    BufferedValue::Sequence(sequence) => {
                        let current = entry.origin == Origin::Write
                            || content
                                .get(&key)
                                .as_list()
                                .is_some_and(|list| list.ptr_eq(&sequence.content()));
                        let list = sequence.commit(&key, visiting, &mut report);
                        if current {
                            report.write(content, &key, list.into());
                        } else {
                            tracing::debug!(%key, "content was reassigned since the read, not storing");
                        }
                    }
                }
            }
        }

        {
            let mut state = self.0.borrow_mut();
            state.buffer.initialize(subset);
            state.has_buffered_changes = state.buffer.has_pending();
        }
        visiting.leave(self.id());
        report
    }

    /// Drops the buffered entries selected by `subset` (all of them for `None`).
    ///
    /// Observers are notified for every dropped key, in key order. Dropped nested proxies and
    /// sequences are discarded recursively. An empty `subset` clears the whole buffer without
    /// notifying anyone.
    pub fn discard_buffered_changes(&self, subset: Option<&[&str]>) {
        self.discard_guarded(subset, &mut Visiting::default());
    }

    /// Discards every buffered change.
    pub fn discard_changes(&self) {
        self.discard_buffered_changes(None);
    }

    pub(crate) fn discard_guarded(&self, subset: Option<&[&str]>, visiting: &mut Visiting) {
        if !visiting.enter(self.id()) {
            return;
        }

        let dropped = {
            let mut state = self.0.borrow_mut();
            let dropped = state.buffer.entries(subset);
            state.buffer.initialize(subset);
            state.has_buffered_changes = state.buffer.has_pending();
            dropped
        };

        let mut keys = SmallVec::<[String; 8]>::with_capacity(dropped.len());
        for (key, entry) in dropped {
            match entry.value {
                BufferedValue::Proxy(nested) => nested.discard_guarded(None, visiting),
                BufferedValue::Sequence(sequence) => sequence.discard(visiting),
                BufferedValue::Value(_) => {}
            }
            keys.push(key);
        }
        for key in &keys {
            self.will_change(key);
            self.did_change(key);
        }

        visiting.leave(self.id());
    }

    /// Returns true if `key` has a buffered entry that differs from what content holds.
    ///
    /// Keys that are not strings are never buffered, so they never changed. A memoized nested
    /// proxy or sequence counts as changed once it has pending changes of its own. A written one
    /// also counts as changed while content holds a different object or list.
    pub fn has_changed<K>(&self, key: &K) -> bool
    where
        K: PropertyKey + ?Sized,
    {
        let Some(key) = key.as_property_key() else {
            return false;
        };
        let (entry, origin, content) = {
            let state = self.0.borrow();
            (
                state.buffer.get(key).cloned(),
                state.buffer.origin(key),
                state.content.clone(),
            )
        };
        let Some(entry) = entry else {
            return false;
        };
        let current = content.map_or(Value::Undefined, |content| content.get(key));
        // a wrapper memoized by a read is never stored over a reassigned key
        let written = origin == Some(Origin::Write);

        match entry {
            BufferedValue::Value(value) => value != current,
            BufferedValue::Proxy(nested) => {
                nested.has_deep_changes() || (written && Value::from(nested.content()) != current)
            }
            BufferedValue::Sequence(sequence) => {
                sequence.has_changes() || (written && Value::List(sequence.content()) != current)
            }
        }
    }

    /// Returns true if this proxy, or any proxy or sequence memoized in its buffer, has
    /// pending changes.
    pub fn has_deep_changes(&self) -> bool {
        self.has_deep_changes_guarded(&mut Visiting::default())
    }

    pub(crate) fn has_deep_changes_guarded(&self, visiting: &mut Visiting) -> bool {
        if self.has_buffered_changes() {
            return true;
        }
        if !visiting.enter(self.id()) {
            return false;
        }
        let wrappers: Vec<_> = self
            .0
            .borrow()
            .buffer
            .entries(None)
            .into_iter()
            .map(|(_, entry)| entry.value)
            .filter(|value| !matches!(value, BufferedValue::Value(_)))
            .collect();

        let changed = wrappers.iter().any(|wrapper| match wrapper {
            BufferedValue::Proxy(nested) => nested.has_deep_changes_guarded(visiting),
            BufferedValue::Sequence(sequence) => sequence.has_changes_guarded(visiting),
            BufferedValue::Value(_) => false,
        });
        visiting.leave(self.id());
        changed
    }
}
