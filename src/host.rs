// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # The host object model
//!
//! A buffered proxy sits on top of a mutable object graph that it does not own. This module
//! provides that graph: shared, interior-mutable [`Object`]s and [`List`]s holding
//! [`Value`]s, plus the handful of capabilities the proxy consumes from its host:
//!
//! - raw property access ([`Object::raw`]), which can surface a [`Computed`] descriptor;
//! - resolved property access ([`Object::get`]), which forces any computation;
//! - a soft write ([`Object::try_set`]) that fails instead of panicking when the target is a
//!   [placeholder](Object::placeholder) that has not been resolved yet;
//! - an emptiness predicate ([`Value::is_falsy`]).
//!
//! Handles are reference counted. Cloning an [`Object`] or a [`List`] yields another handle
//! to the same underlying data, and equality between them is identity.
//!
//! ```rust
//! use buffered_proxy::host::{Object, Value};
//!
//! let user = Object::new().with("name", "Alice").with("age", 30);
//! let alias = user.clone();
//! alias.try_set("age", 31).unwrap();
//!
//! assert_eq!(user.get("age"), Value::from(31));
//! assert_eq!(Value::Object(user), Value::Object(alias));
//! ```
use crate::{
    BufferRandomState,
    computed::{Computed, PropertyReader},
    proxy::BufferedValue,
};
use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

mod primitive;
pub use primitive::Primitive;

/// Error returned by the host when a write cannot be carried out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The target object is a placeholder whose content has not been resolved yet.
    #[error("cannot set `{key}` on an unresolved placeholder")]
    Unresolved { key: String },
}

/// What kind of entity an [`Object`] represents.
///
/// This is set by whoever creates the object and is carried over onto any proxy wrapping it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum ObjectKind {
    /// Plain nested data with no identity of its own beyond the object handle.
    #[default]
    Plain,
    /// A record (a model instance), identified by its model name.
    Record(String),
}

/// A value held by the host.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Primitive(Primitive),
    Object(Object),
    List(List),
}

impl Value {
    /// Returns true if the host treats this value as empty.
    ///
    /// Objects and lists are never empty, even when they hold no entries.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => true,
            Value::Primitive(p) => p.is_falsy(),
            Value::Object(_) | Value::List(_) => false,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Value::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_primitive().and_then(Primitive::as_str)
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
}

// Structured values compare by identity, primitives by value.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Primitive(p1), Value::Primitive(p2)) => p1 == p2,
            (Value::Object(o1), Value::Object(o2)) => o1.ptr_eq(o2),
            (Value::List(l1), Value::List(l2)) => l1.ptr_eq(l2),
            _ => false,
        }
    }
}

macro_rules! impl_from_primitive {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Value::Primitive(value.into())
                }
            }
        )*
    };
}

impl_from_primitive!(
    Primitive, &[u8], Vec<u8>, String, &str, &String, f32, f64, u8, u16, u32, u64, i8, i16, i32,
    i64, bool,
);
#[cfg(feature = "chrono")]
impl_from_primitive!(chrono::DateTime<chrono::Utc>);
#[cfg(feature = "ulid")]
impl_from_primitive!(ulid::Ulid);

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<List> for Value {
    fn from(value: List) -> Self {
        Value::List(value)
    }
}

impl From<Option<Object>> for Value {
    fn from(value: Option<Object>) -> Self {
        value.map_or(Value::Null, Value::Object)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Primitive(p) => p.fmt(f),
            // nested structures are printed shallowly since the graph may be cyclic
            Value::Object(o) => write!(f, "Object({:?} @ {:#x})", o.kind(), o.id()),
            Value::List(l) => write!(f, "List(len={} @ {:#x})", l.len(), l.id()),
        }
    }
}

/// A raw property slot on an [`Object`].
#[derive(Debug, Clone)]
pub enum Property {
    Value(Value),
    Computed(Computed),
}

impl From<Value> for Property {
    fn from(value: Value) -> Self {
        Property::Value(value)
    }
}

impl From<Computed> for Property {
    fn from(value: Computed) -> Self {
        Property::Computed(value)
    }
}

struct ObjectState {
    kind: ObjectKind,
    resolved: bool,
    properties: HashMap<String, Property, BufferRandomState>,
}

/// A shared, mutable host object.
#[derive(Clone)]
pub struct Object(Rc<RefCell<ObjectState>>);

impl Default for Object {
    fn default() -> Self {
        Self::with_kind(ObjectKind::Plain)
    }
}

impl Object {
    /// Creates an empty plain object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record object for the given model.
    pub fn record(model: impl Into<String>) -> Self {
        Self::with_kind(ObjectKind::Record(model.into()))
    }

    pub fn with_kind(kind: ObjectKind) -> Self {
        Self(Rc::new(RefCell::new(ObjectState {
            kind,
            resolved: true,
            properties: HashMap::default(),
        })))
    }

    /// Creates an object whose content is not available yet.
    ///
    /// Until [`Object::resolve`] is called, every property reads as [`Value::Undefined`] and
    /// every [`Object::try_set`] fails with [`HostError::Unresolved`]. Properties may still be
    /// staged with [`Object::insert`] and become visible on resolution.
    pub fn placeholder(kind: ObjectKind) -> Self {
        let object = Self::with_kind(kind);
        object.0.borrow_mut().resolved = false;
        object
    }

    pub fn resolve(&self) {
        self.0.borrow_mut().resolved = true;
    }

    pub fn is_resolved(&self) -> bool {
        self.0.borrow().resolved
    }

    pub fn kind(&self) -> ObjectKind {
        self.0.borrow().kind.clone()
    }

    /// Builder-style [`Object::insert`].
    pub fn with(self, key: impl Into<String>, property: impl Into<Value>) -> Self {
        self.insert(key, property.into());
        self
    }

    /// Builder-style [`Object::define_computed`].
    pub fn with_computed(self, key: impl Into<String>, computed: Computed) -> Self {
        self.define_computed(key, computed);
        self
    }

    /// Stores a property unconditionally, even on an unresolved placeholder.
    pub fn insert(&self, key: impl Into<String>, property: impl Into<Property>) {
        self.0
            .borrow_mut()
            .properties
            .insert(key.into(), property.into());
    }

    pub fn define_computed(&self, key: impl Into<String>, computed: Computed) {
        self.insert(key, computed);
    }

    /// Returns the raw property stored under `key`, without evaluating computed descriptors.
    pub fn raw(&self, key: &str) -> Option<Property> {
        let state = self.0.borrow();
        if !state.resolved {
            return None;
        }
        state.properties.get(key).cloned()
    }

    /// Returns the resolved value of `key`, evaluating computed descriptors against `self`.
    pub fn get(&self, key: &str) -> Value {
        match self.raw(key) {
            None => Value::Undefined,
            Some(Property::Value(value)) => value,
            // the borrow taken by `raw` is released here, so the getter may read `self`
            Some(Property::Computed(computed)) => computed.evaluate(self),
        }
    }

    /// Writes `value` under `key`, replacing any computed descriptor there.
    ///
    /// # Errors
    ///
    /// Fails with [`HostError::Unresolved`] if this object is an unresolved placeholder.
    pub fn try_set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), HostError> {
        let key = key.into();
        let mut state = self.0.borrow_mut();
        if !state.resolved {
            return Err(HostError::Unresolved { key });
        }
        state.properties.insert(key, Property::Value(value.into()));
        Ok(())
    }

    /// Returns the keys of this object in ascending order.
    pub fn keys(&self) -> Vec<String> {
        let state = self.0.borrow();
        if !state.resolved {
            return Vec::new();
        }
        let mut keys: Vec<_> = state.properties.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl PropertyReader for Object {
    fn read(&self, key: &str) -> BufferedValue {
        BufferedValue::Value(self.get(key))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in self.keys() {
            match self.raw(&key) {
                Some(Property::Value(value)) => map.entry(&key, &value),
                Some(Property::Computed(computed)) => map.entry(&key, &computed),
                None => map.entry(&key, &Value::Undefined),
            };
        }
        map.finish()
    }
}

/// A shared, mutable ordered sequence of host values.
#[derive(Clone, Default)]
pub struct List(Rc<RefCell<Vec<Value>>>);

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    pub fn first(&self) -> Option<Value> {
        self.get(0)
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Returns a copy of the elements (the element handles themselves are shared).
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &List) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl<V> FromIterator<V> for List
where
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(Rc::new(RefCell::new(iter.into_iter().map(Into::into).collect())))
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.borrow().iter()).finish()
    }
}
