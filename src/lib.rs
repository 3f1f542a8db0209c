// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # Buffered proxies: transactional overlays over mutable object graphs
//!
//! This crate lets you edit a graph of shared, mutable objects *tentatively*. A
//! [`BufferedProxy`] stands in front of a content [`Object`](host::Object): reads see content
//! overlaid with pending edits, writes only ever touch the proxy's own buffer, and nothing
//! reaches content until the edits are applied. At any point the pending edits can be
//! inspected, applied (all of them or a subset of keys), or thrown away.
//!
//! The typical use is an edit form: bind the form to a proxy over the record being edited,
//! let the user change fields, then either save (apply) or cancel (discard). Other views that
//! hold the same record never see half-finished edits.
//!
//! ## Core Concepts
//!
//! - **Content**: the underlying [`Object`](host::Object). Objects and
//!   [`List`](host::List)s are cheap reference-counted handles with identity, so the same
//!   object may be reachable from many places.
//! - **Buffer**: the per-proxy mapping from key to pending value, see [`Buffer`].
//! - **Nested wrapping**: reading an object-valued key yields a nested [`BufferedProxy`], and
//!   reading a list yields a [`SequenceProxy`] whose elements are wrapped individually. The
//!   wrapper is memoized, so every read returns the same one. Applying the outer proxy applies
//!   nested wrappers recursively; discarding discards them.
//! - **Computed properties**: a [`Computed`] descriptor in content declares a getter and the
//!   keys it depends on. Such a property is never buffered: it is evaluated against the proxy,
//!   so it reflects pending edits of its dependencies.
//! - **Observation**: a [`ChangeObserver`](observer::ChangeObserver) registered on a proxy is
//!   told before and after the value visible for a key changes.
//!
//! ```rust
//! use buffered_proxy::{BufferedProxy, host::Value, object};
//!
//! let content = object! { "name" => "Alice", "age" => 30 };
//! let proxy = BufferedProxy::new(content.clone());
//!
//! proxy.set("age", 31);
//! proxy.set("name", "Bob");
//! // writing back what content holds reverts the edit
//! proxy.set("name", "Alice");
//! assert!(proxy.has_changed("age"));
//! assert!(!proxy.has_changed("name"));
//!
//! let report = proxy.apply_changes();
//! assert_eq!(report.applied, ["age"]);
//! assert_eq!(content.get("age"), Value::from(31));
//! ```
//!
//! ## Failed writes
//!
//! Content may refuse a write, for instance when it is a placeholder whose data has not been
//! loaded yet. An apply never fails as a whole: refused writes are dropped from the buffer like
//! every other applied entry, and listed in the returned [`ApplyReport`].
//!
//! ## Threading
//!
//! Everything in this crate is single-threaded and synchronous. Handles are built on `Rc` and
//! `RefCell` and are not `Send`.
//!
//! ## Features
//!
//! - `json`: Enables building host graphs from, and rendering values and proxies to,
//!   `serde_json::Value`. This feature is enabled by default.
//! - `serde`: Provides `serde` support for primitive values and element kinds.
//! - `arbitrary`: Implements `quickcheck::Arbitrary` for primitive values, useful for
//!   property-based testing.
//! - `chrono`: Enables `chrono` timestamps as primitive values. This feature is enabled by
//!   default.
//! - `ulid`: Enables ulids as primitive values. This feature is enabled by default.
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

use ahash::RandomState;
use std::{
    hash::BuildHasher,
    sync::atomic::{AtomicBool, Ordering},
};

// Use a constant seed for hashing to make performance benchmarks have less variance.
pub(crate) const DETERMINISTIC_HASHER: RandomState = RandomState::with_seeds(48, 1516, 23, 42);

pub mod buffer;
pub use buffer::{Buffer, Origin};
pub mod computed;
pub use computed::{Computed, PropertyReader};
pub mod factory;
pub use factory::{ElementKind, ValueClass};
pub mod host;
#[cfg(feature = "json")]
mod json;
/// Macros usable for tests and initialization
pub mod macros;
pub mod observer;
mod proxy;
pub use proxy::{
    ApplyReport, BufferedProxy, BufferedValue, PropertyKey, SequenceProxy, SkippedWrite,
};

// re-export so that callers can name timestamps without depending on chrono themselves
#[cfg(feature = "chrono")]
pub use chrono;

static ENABLE_DETERMINISM: AtomicBool = AtomicBool::new(false);

/// Makes all hash maps in this crate use a fixed seed.
///
/// This should only be enabled for testing and benchmarking, as it increases the odds of DoS
/// scenarios.
#[doc(hidden)]
pub fn enable_determinism() {
    ENABLE_DETERMINISM.store(true, Ordering::Release);
}

/// Checks if determinism is enabled.
#[doc(hidden)]
pub fn determinism_enabled() -> bool {
    ENABLE_DETERMINISM.load(Ordering::Acquire)
}

#[inline]
fn make_random_state() -> RandomState {
    if determinism_enabled() {
        DETERMINISTIC_HASHER
    } else {
        RandomState::new()
    }
}

/// The hasher used by buffers, property maps and cycle guards.
///
/// This is a small wrapper around [`ahash::RandomState`] that switches to a fixed seed once
/// [`enable_determinism`] has been called.
#[derive(Clone)]
pub struct BufferRandomState {
    inner: RandomState,
}

impl Default for BufferRandomState {
    #[inline]
    fn default() -> Self {
        Self {
            inner: make_random_state(),
        }
    }
}

impl std::fmt::Debug for BufferRandomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BufferRandomState")
    }
}

impl BuildHasher for BufferRandomState {
    type Hasher = <RandomState as BuildHasher>::Hasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        self.inner.build_hasher()
    }
}
