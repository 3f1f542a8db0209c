// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Read and write interception.
use super::{BufferedProxy, BufferedValue, Defined, Mode};
use crate::{
    computed::{Computed, is_computed_property},
    factory::{self, ValueClass},
    host::{Property, Value},
};

impl BufferedProxy {
    /// Reads `key` through the proxy.
    ///
    /// Properties defined on the proxy (installed computed properties and template statics)
    /// take precedence. Otherwise a buffered entry is returned if there is one. Failing that,
    /// the content value is read: empty values are returned as they are, computed descriptors
    /// are installed on the proxy and evaluated, and everything else is wrapped if structured
    /// and memoized in the buffer.
    pub fn get(&self, key: &str) -> BufferedValue {
        match self.defined(key) {
            Some(Defined::Static(value)) => value,
            // evaluated with no borrow held, so the getter can read through us
            Some(Defined::Computed(computed)) => BufferedValue::Value(computed.evaluate(self)),
            None => self.unknown_property(key),
        }
    }

    fn unknown_property(&self, key: &str) -> BufferedValue {
        let content = {
            let state = self.0.borrow();
            if let Some(hit) = state.buffer.get(key) {
                return hit.clone();
            }
            state.content.clone()
        };
        let Some(content) = content else {
            return Value::Undefined.into();
        };

        let raw = match content.raw(key) {
            None => return Value::Undefined.into(),
            Some(Property::Value(value)) if value.is_falsy() => return value.into(),
            Some(raw) => raw,
        };

        match (factory::classify_property(&raw), raw) {
            (ValueClass::ComputedDescriptor, Property::Computed(computed)) => {
                self.install(key, Defined::Computed(computed));
                self.get(key)
            }
            _ => {
                let wrapped = factory::proxify(content.get(key).into());
                self.0.borrow_mut().buffer.cache(key, wrapped.clone());
                wrapped
            }
        }
    }

    /// Writes `value` to `key` through the proxy.
    ///
    /// On a template, this defines a static property. On a live proxy the write is buffered,
    /// unless `value` equals what content holds, in which case any buffered entry for `key` is
    /// dropped. Writing the value that is already visible is a no-op and fires no
    /// notification.
    ///
    /// Returns `false` for such a no-op, and `true` otherwise.
    pub fn set(&self, key: &str, value: impl Into<BufferedValue>) -> bool {
        let value = value.into();
        let (content, is_defined) = {
            let mut state = self.0.borrow_mut();
            if state.mode == Mode::Template {
                state.defined.insert(key.to_owned(), Defined::Static(value));
                return true;
            }
            (state.content.clone(), state.defined.contains_key(key))
        };
        if is_defined {
            return self.redefine(key, value);
        }

        let current = BufferedValue::Value(content.map_or(Value::Undefined, |c| c.get(key)));
        let previous = self
            .0
            .borrow()
            .buffer
            .get(key)
            .cloned()
            .unwrap_or_else(|| current.clone());

        if value == previous {
            return false;
        }

        self.will_change(key);
        {
            let mut state = self.0.borrow_mut();
            if value == current {
                state.buffer.delete(key);
                if !state.buffer.has_pending() {
                    state.has_buffered_changes = false;
                }
            } else {
                state.buffer.set(key, value);
                state.has_buffered_changes = true;
            }
        }
        self.did_change(key);

        true
    }

    /// Declares a computed property on this proxy.
    ///
    /// Mostly useful on templates. The property is evaluated against the proxy on every read.
    pub fn define_computed(&self, key: &str, computed: Computed) {
        self.install(key, Defined::Computed(computed));
    }

    /// Reads `key` like [`BufferedProxy::get`], but without memoizing or installing anything.
    #[cfg_attr(not(feature = "json"), expect(dead_code))]
    pub(crate) fn peek(&self, key: &str) -> BufferedValue {
        match self.defined(key) {
            Some(Defined::Static(value)) => return value,
            Some(Defined::Computed(computed)) => return computed.evaluate(self).into(),
            None => {}
        }
        let content = {
            let state = self.0.borrow();
            if let Some(hit) = state.buffer.get(key) {
                return hit.clone();
            }
            state.content.clone()
        };
        match content.as_ref().and_then(|content| content.raw(key)) {
            Some(Property::Computed(computed)) if is_computed_property(&computed) => {
                computed.evaluate(self).into()
            }
            _ => content.map_or(Value::Undefined, |content| content.get(key)).into(),
        }
    }

    /// Keys visible through this proxy: those of content, the buffer and defined properties.
    #[cfg_attr(not(feature = "json"), expect(dead_code))]
    pub(crate) fn visible_keys(&self) -> Vec<String> {
        let state = self.0.borrow();
        let mut keys = state.buffer.keys();
        keys.extend(state.defined.keys().cloned());
        if let Some(content) = &state.content {
            keys.extend(content.keys());
        }
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    fn redefine(&self, key: &str, value: BufferedValue) -> bool {
        if matches!(self.defined(key), Some(Defined::Static(existing)) if existing == value) {
            return false;
        }
        self.will_change(key);
        self.install(key, Defined::Static(value));
        self.did_change(key);
        true
    }

    fn install(&self, key: &str, defined: Defined) {
        self.0
            .borrow_mut()
            .defined
            .insert(key.to_owned(), defined);
    }

    fn defined(&self, key: &str) -> Option<Defined> {
        self.0.borrow().defined.get(key).cloned()
    }
}
