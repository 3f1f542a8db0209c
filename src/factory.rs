// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Classification and wrapping of values read from content.
//!
//! Every value is classified exactly once into a [`ValueClass`]. The gate and [`proxify`] then
//! match on that class instead of probing the value with ad-hoc predicates.
use crate::{
    computed::is_computed_property,
    host::{List, Object, ObjectKind, Property, Value},
    proxy::{BufferedProxy, BufferedValue, SequenceProxy},
};

/// The kind of a value, as far as buffering is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    /// Passed through unchanged: primitives, `undefined` and `null`.
    Primitive,
    /// A derived property definition that is transferred onto the proxy.
    ComputedDescriptor,
    /// An object that gets its own nested buffered proxy.
    PlainStructured,
    /// A list that gets an ordered-sequence proxy.
    OrderedSequence,
    /// Already a proxy or sequence proxy.
    AlreadyProxy,
}

/// Describes what a proxy wraps, or what the first element of a sequence proxy was.
///
/// The tag is fixed when the wrapper is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum ElementKind {
    /// A record, identified by its model name.
    Record(String),
    /// Plain nested data.
    Plain,
    /// A nested list.
    Sequence,
    /// A primitive, `undefined` or `null`.
    Primitive,
    /// Nothing: an empty sequence, or a proxy without content.
    Empty,
}

impl ElementKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(object) => Self::of_object(object),
            Value::List(_) => ElementKind::Sequence,
            Value::Undefined | Value::Null | Value::Primitive(_) => ElementKind::Primitive,
        }
    }

    pub fn of_object(object: &Object) -> Self {
        match object.kind() {
            ObjectKind::Plain => ElementKind::Plain,
            ObjectKind::Record(model) => ElementKind::Record(model),
        }
    }

    /// The kind of the first element of `list`, or [`ElementKind::Empty`].
    pub fn of_first(list: &List) -> Self {
        list.first().map_or(ElementKind::Empty, |first| Self::of(&first))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, ElementKind::Record(_))
    }
}

pub fn classify(value: &Value) -> ValueClass {
    match value {
        Value::Undefined | Value::Null | Value::Primitive(_) => ValueClass::Primitive,
        Value::Object(_) => ValueClass::PlainStructured,
        Value::List(_) => ValueClass::OrderedSequence,
    }
}

pub fn classify_property(property: &Property) -> ValueClass {
    match property {
        Property::Computed(computed) if is_computed_property(computed) => {
            ValueClass::ComputedDescriptor
        }
        // a descriptor without dependencies is resolved and buffered like a plain value
        Property::Computed(_) => ValueClass::Primitive,
        Property::Value(value) => classify(value),
    }
}

pub fn classify_buffered(value: &BufferedValue) -> ValueClass {
    match value {
        BufferedValue::Value(value) => classify(value),
        BufferedValue::Proxy(_) | BufferedValue::Sequence(_) => ValueClass::AlreadyProxy,
    }
}

/// Wraps structured values so that edits to them are buffered.
///
/// Every call on a structured value produces a fresh wrapper. Callers memoize the result.
pub fn proxify(value: BufferedValue) -> BufferedValue {
    match (classify_buffered(&value), value) {
        (ValueClass::PlainStructured, BufferedValue::Value(Value::Object(object))) => {
            BufferedValue::Proxy(BufferedProxy::new(object))
        }
        (ValueClass::OrderedSequence, BufferedValue::Value(Value::List(list))) => {
            BufferedValue::Sequence(SequenceProxy::new(list))
        }
        (_, value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::computed::Computed;

    #[test]
    fn classification() {
        assert_eq!(classify(&Value::Undefined), ValueClass::Primitive);
        assert_eq!(classify(&Value::from("x")), ValueClass::Primitive);
        assert_eq!(
            classify(&Value::from(Object::new())),
            ValueClass::PlainStructured
        );
        assert_eq!(
            classify(&Value::from(List::new())),
            ValueClass::OrderedSequence
        );
        assert_eq!(
            classify_buffered(&BufferedProxy::new(Object::new()).into()),
            ValueClass::AlreadyProxy
        );
        assert_eq!(
            classify_property(&Computed::new(["a"], |_| Value::Null).into()),
            ValueClass::ComputedDescriptor
        );
        assert_eq!(
            classify_property(&Computed::new(Vec::<String>::new(), |_| Value::Null).into()),
            ValueClass::Primitive
        );
    }

    #[test]
    fn primitives_pass_through() {
        let value = BufferedValue::from(Value::from(42));
        assert_eq!(proxify(value.clone()), value);
        assert_eq!(
            proxify(Value::Null.into()),
            BufferedValue::from(Value::Null)
        );
    }

    #[test]
    fn proxies_pass_through() {
        let proxy = BufferedProxy::new(Object::new());
        let wrapped = proxify(proxy.clone().into());
        assert!(wrapped.as_proxy().is_some_and(|p| p.ptr_eq(&proxy)));
    }

    #[test]
    fn objects_get_a_fresh_proxy() {
        let object = Object::record("user");
        let first = proxify(Value::from(object.clone()).into());
        let second = proxify(Value::from(object.clone()).into());

        let first = first.as_proxy().unwrap();
        let second = second.as_proxy().unwrap();
        assert!(!first.ptr_eq(second));
        assert!(first.content().unwrap().ptr_eq(&object));
        assert_eq!(first.element_kind(), ElementKind::Record("user".into()));
    }

    #[test]
    fn lists_are_wrapped_element_wise() {
        let address = Object::new().with("city", "X");
        let list: List = [Value::from(address.clone()), Value::from("loose")]
            .into_iter()
            .collect();

        let wrapped = proxify(Value::from(list.clone()).into());
        let sequence = wrapped.as_sequence().unwrap();
        assert!(sequence.content().ptr_eq(&list));
        assert_eq!(sequence.element_kind(), ElementKind::Plain);
        assert_eq!(sequence.len(), 2);

        let first = sequence.get(0).unwrap();
        assert!(first.as_proxy().unwrap().content().unwrap().ptr_eq(&address));
        assert_eq!(
            sequence.get(1),
            Some(BufferedValue::from(Value::from("loose")))
        );
    }

    #[test]
    fn element_kind_of_first() {
        assert_eq!(ElementKind::of_first(&List::new()), ElementKind::Empty);
        let records: List = [Object::record("tag"), Object::new()].into_iter().collect();
        assert_eq!(
            ElementKind::of_first(&records),
            ElementKind::Record("tag".into())
        );
        let nested: List = [List::new()].into_iter().collect();
        assert_eq!(ElementKind::of_first(&nested), ElementKind::Sequence);
    }
}
