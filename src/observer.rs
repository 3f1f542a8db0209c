// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Observe changes to the value visible through a proxy.
//!
//! Observers receive a pre-change and a post-change notification for a key whenever the value a
//! [`BufferedProxy`](crate::BufferedProxy) reports for that key may have changed: when a write
//! is buffered or reverted, and when buffered entries are discarded. They are the hook a host
//! uses to re-render or recompute dependants. They do not fire for writes that turn out to be
//! no-ops, nor for the content mutation performed by an apply.
//!
//! Notifications are delivered while the proxy holds no internal borrow, so an observer may read
//! the proxy it observes. An observer that writes to the proxy it observes will not be notified
//! about its own nested write.
//!
//! For a testing-oriented observer, see [`RecordingObserver`].

/// Receives change notifications from a proxy.
#[expect(unused_variables)]
pub trait ChangeObserver {
    /// Called before the value visible for `key` changes.
    fn will_change(&mut self, key: &str) {}

    /// Called after the value visible for `key` changed.
    fn did_change(&mut self, key: &str) {}
}

/// An observer that does nothing.
pub struct DummyObserver;

impl ChangeObserver for DummyObserver {}

/// An observer that records all calls in a human readable form.
///
/// This is mostly useful for tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    /// A string-representation of each call that the observer has received.
    pub changes_seen: Vec<String>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains the recorded calls into a single line.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.changes_seen).join(", ")
    }
}

impl ChangeObserver for RecordingObserver {
    fn will_change(&mut self, key: &str) {
        self.changes_seen.push(format!("will_change {key}"));
    }

    fn did_change(&mut self, key: &str) {
        self.changes_seen.push(format!("did_change {key}"));
    }
}
