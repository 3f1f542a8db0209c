// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Derived properties.
//!
//! A [`Computed`] descriptor declares a getter and the keys it depends on. Content objects can
//! hold such descriptors in place of plain values. When a [`BufferedProxy`] first reads a key
//! backed by a computed descriptor, it does not buffer a snapshot of the value. Instead the
//! descriptor itself is installed on the proxy, and every later read re-evaluates the getter
//! against the proxy. The getter therefore sees buffered sibling values, and the derived value
//! never takes part in apply or discard.
//!
//! [`BufferedProxy`]: crate::BufferedProxy
use crate::{host::Value, proxy::BufferedValue};
use smallvec::SmallVec;
use std::{fmt, rc::Rc};

/// Read access to sibling properties, handed to a computed getter.
///
/// Implemented by host [`Object`](crate::host::Object)s (which read content) and by
/// [`BufferedProxy`](crate::BufferedProxy) (which reads through the buffer).
pub trait PropertyReader {
    fn read(&self, key: &str) -> BufferedValue;
}

type Getter = dyn Fn(&dyn PropertyReader) -> Value;

/// A derived property definition.
#[derive(Clone)]
pub struct Computed {
    dependent_keys: SmallVec<[String; 2]>,
    getter: Rc<Getter>,
}

impl Computed {
    pub fn new<I, S, F>(dependent_keys: I, getter: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&dyn PropertyReader) -> Value + 'static,
    {
        Self {
            dependent_keys: dependent_keys.into_iter().map(Into::into).collect(),
            getter: Rc::new(getter),
        }
    }

    pub fn dependent_keys(&self) -> &[String] {
        &self.dependent_keys
    }

    /// Runs the getter against `reader`.
    pub fn evaluate(&self, reader: &dyn PropertyReader) -> Value {
        (self.getter)(reader)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("dependent_keys", &self.dependent_keys)
            .finish_non_exhaustive()
    }
}

/// Whether a descriptor should be transferred onto a proxy rather than buffered.
///
/// Only descriptors that declare at least one dependency key qualify. A descriptor without
/// dependencies is resolved once and its value is buffered like any other.
pub fn is_computed_property(descriptor: &Computed) -> bool {
    !descriptor.dependent_keys.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Object;

    #[test]
    fn dependency_keys_decide_passthrough() {
        let derived = Computed::new(["first", "last"], |_| Value::Null);
        assert!(is_computed_property(&derived));
        assert_eq!(derived.dependent_keys(), ["first", "last"]);

        let constant = Computed::new(std::iter::empty::<String>(), |_| 1.into());
        assert!(!is_computed_property(&constant));
    }

    #[test]
    fn evaluate_reads_through_the_reader() {
        let object = Object::new().with("n", 20);
        let doubled = Computed::new(["n"], |this| match this.read("n").as_value() {
            Some(Value::Primitive(p)) if *p == 20 => 40.into(),
            _ => Value::Undefined,
        });
        assert_eq!(doubled.evaluate(&object), Value::from(40));
    }

    #[test]
    fn debug_lists_dependencies() {
        let derived = Computed::new(["a"], |_| Value::Null);
        assert_eq!(
            format!("{derived:?}"),
            r#"Computed { dependent_keys: ["a"], .. }"#
        );
    }
}
