// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Buffered proxies over host objects.
//!
//! A [`BufferedProxy`] presents the properties of a content [`Object`] while deferring every
//! write into its own [`Buffer`]. Nothing reaches the content until
//! [`apply_changes`](BufferedProxy::apply_changes) is called, and
//! [`discard_changes`](BufferedProxy::discard_changes) throws the buffer away.
//!
//! # Example
//!
//! ```
//! use buffered_proxy::{BufferedProxy, host::Value, object};
//!
//! let content = object! { "name" => "Alice", "age" => 30 };
//! let proxy = BufferedProxy::new(content.clone());
//!
//! proxy.set("age", 31);
//! assert!(proxy.has_changes());
//! assert!(proxy.has_changed("age"));
//! assert_eq!(proxy.get("age"), 31);
//! // content is untouched until the changes are applied
//! assert_eq!(content.get("age"), Value::from(30));
//!
//! proxy.apply_changes();
//! assert!(!proxy.has_changes());
//! assert_eq!(content.get("age"), Value::from(31));
//! ```
//!
//! # Nested values
//!
//! Objects and lists read through a proxy are wrapped lazily: reading an object-valued key
//! yields a nested [`BufferedProxy`] with a buffer of its own, and reading a list yields a
//! [`SequenceProxy`] whose elements are wrapped individually. The wrapper is memoized in the
//! outer buffer, so repeated reads return the same instance. Applying the outer proxy applies
//! nested wrappers recursively.
//!
//! ```
//! use buffered_proxy::{BufferedProxy, host::Value, object};
//!
//! let content = object! { "address" => { "city" => "X" } };
//! let proxy = BufferedProxy::new(content.clone());
//!
//! let address = proxy.get("address").into_proxy().unwrap();
//! address.set("city", "Y");
//! proxy.apply_changes();
//!
//! let stored = content.get("address");
//! assert_eq!(stored.as_object().unwrap().get("city"), Value::from("Y"));
//! ```
//!
//! # Identity
//!
//! Proxies are cheap, reference-counted handles. Cloning a proxy yields another handle to the
//! same buffer. Proxies are not `Send`: the engine is single-threaded and synchronous.
use crate::{
    BufferRandomState,
    buffer::Buffer,
    computed::{Computed, PropertyReader},
    factory::ElementKind,
    host::{List, Object, Primitive, Value},
    observer::ChangeObserver,
};
use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

mod commit;
mod gate;
mod sequence;

pub use commit::{ApplyReport, SkippedWrite};
pub use sequence::SequenceProxy;

/// A value as seen through a proxy: either a plain host value or a wrapper.
#[derive(Clone, Debug)]
pub enum BufferedValue {
    Value(Value),
    Proxy(BufferedProxy),
    Sequence(SequenceProxy),
}

impl BufferedValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            BufferedValue::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&BufferedProxy> {
        match self {
            BufferedValue::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }

    pub fn into_proxy(self) -> Option<BufferedProxy> {
        match self {
            BufferedValue::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&SequenceProxy> {
        match self {
            BufferedValue::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    pub fn into_sequence(self) -> Option<SequenceProxy> {
        match self {
            BufferedValue::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, BufferedValue::Value(Value::Undefined))
    }

    /// The host value this stands for, unwrapping one level of proxying.
    ///
    /// A proxy yields its content object and a sequence proxy the list it wraps. Pending edits
    /// inside the wrapper are not reflected.
    pub fn content_value(&self) -> Value {
        match self {
            BufferedValue::Value(value) => value.clone(),
            BufferedValue::Proxy(proxy) => proxy.content().into(),
            BufferedValue::Sequence(sequence) => Value::List(sequence.content()),
        }
    }
}

// Wrappers compare by identity, like the objects they stand for.
impl PartialEq for BufferedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BufferedValue::Value(v1), BufferedValue::Value(v2)) => v1 == v2,
            (BufferedValue::Proxy(p1), BufferedValue::Proxy(p2)) => p1.ptr_eq(p2),
            (BufferedValue::Sequence(s1), BufferedValue::Sequence(s2)) => s1.ptr_eq(s2),
            _ => false,
        }
    }
}

impl PartialEq<Value> for BufferedValue {
    fn eq(&self, other: &Value) -> bool {
        matches!(self, BufferedValue::Value(value) if value == other)
    }
}

macro_rules! impl_partial_eq {
    ({$($t:ty),+}) => {
        $(impl_partial_eq!($t);)+
    };

    ($t:ty) => {
        impl PartialEq<$t> for BufferedValue {
            fn eq(&self, other: &$t) -> bool {
                matches!(self, BufferedValue::Value(Value::Primitive(p)) if p == other)
            }
        }
    };
}
impl_partial_eq!({&str, bool, f64, i64});
// i32 because it's the "default" inference integer type
impl_partial_eq!(i32);

impl From<Value> for BufferedValue {
    fn from(value: Value) -> Self {
        BufferedValue::Value(value)
    }
}

impl From<BufferedProxy> for BufferedValue {
    fn from(value: BufferedProxy) -> Self {
        BufferedValue::Proxy(value)
    }
}

impl From<SequenceProxy> for BufferedValue {
    fn from(value: SequenceProxy) -> Self {
        BufferedValue::Sequence(value)
    }
}

macro_rules! impl_from_value {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for BufferedValue {
                fn from(value: $source) -> Self {
                    BufferedValue::Value(value.into())
                }
            }
        )*
    };
}

impl_from_value!(
    Object, List, Primitive, &[u8], Vec<u8>, String, &str, &String, f32, f64, u8, u16, u32, u64,
    i8, i16, i32, i64, bool,
);

/// Anything a caller may pass as a property key.
///
/// Only strings name properties. Every other key is treated as never buffered.
pub trait PropertyKey {
    fn as_property_key(&self) -> Option<&str>;
}

impl PropertyKey for str {
    fn as_property_key(&self) -> Option<&str> {
        Some(self)
    }
}

impl PropertyKey for String {
    fn as_property_key(&self) -> Option<&str> {
        Some(self)
    }
}

impl PropertyKey for Value {
    fn as_property_key(&self) -> Option<&str> {
        self.as_str()
    }
}

impl PropertyKey for BufferedValue {
    fn as_property_key(&self) -> Option<&str> {
        self.as_str()
    }
}

macro_rules! impl_non_string_key {
    ($($t:ty),*) => {
        $(
            impl PropertyKey for $t {
                fn as_property_key(&self) -> Option<&str> {
                    None
                }
            }
        )*
    };
}
impl_non_string_key!(i32, i64, u64, f64, bool);

/// A property defined directly on a proxy. Defined properties bypass the buffer.
#[derive(Debug, Clone)]
pub(crate) enum Defined {
    /// A static value, as written on a template.
    Static(BufferedValue),
    /// A derived property transferred from content or declared on a template.
    Computed(Computed),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Live,
    Template,
}

pub(crate) struct ProxyState {
    pub(crate) content: Option<Object>,
    pub(crate) buffer: Buffer,
    pub(crate) has_buffered_changes: bool,
    pub(crate) defined: HashMap<String, Defined, BufferRandomState>,
    pub(crate) mode: Mode,
    pub(crate) element_kind: ElementKind,
    pub(crate) observers: Vec<Rc<RefCell<dyn ChangeObserver>>>,
}

/// A transactional overlay over a content [`Object`].
///
/// See the [module documentation](self) for an overview.
#[derive(Clone)]
pub struct BufferedProxy(Rc<RefCell<ProxyState>>);

impl BufferedProxy {
    /// Creates a live proxy over `content` with an empty buffer.
    pub fn new(content: Object) -> Self {
        let element_kind = ElementKind::of_object(&content);
        Self::with_state(Some(content), Mode::Live, element_kind, HashMap::default())
    }

    /// Creates a proxy acting as a shared template.
    ///
    /// Writes to a template define static properties instead of being buffered, and fire no
    /// notifications. Use [`BufferedProxy::instantiate`] to create live proxies that start out
    /// with the template's properties.
    ///
    /// ```
    /// use buffered_proxy::{BufferedProxy, object};
    ///
    /// let template = BufferedProxy::template();
    /// template.set("status", "draft");
    ///
    /// let proxy = template.instantiate(object! { "title" => "Notes" });
    /// assert_eq!(proxy.get("status"), "draft");
    /// assert_eq!(proxy.get("title"), "Notes");
    /// assert!(!proxy.has_changes());
    /// ```
    pub fn template() -> Self {
        Self::with_state(None, Mode::Template, ElementKind::Empty, HashMap::default())
    }

    /// Creates a live proxy over `content` carrying this template's defined properties.
    pub fn instantiate(&self, content: Object) -> Self {
        let defined = self.0.borrow().defined.clone();
        let element_kind = ElementKind::of_object(&content);
        Self::with_state(Some(content), Mode::Live, element_kind, defined)
    }

    fn with_state(
        content: Option<Object>,
        mode: Mode,
        element_kind: ElementKind,
        defined: HashMap<String, Defined, BufferRandomState>,
    ) -> Self {
        Self(Rc::new(RefCell::new(ProxyState {
            content,
            buffer: Buffer::new(),
            has_buffered_changes: false,
            defined,
            mode,
            element_kind,
            observers: Vec::new(),
        })))
    }

    pub fn is_template(&self) -> bool {
        self.0.borrow().mode == Mode::Template
    }

    /// The wrapped content, or `None` for a template.
    pub fn content(&self) -> Option<Object> {
        self.0.borrow().content.clone()
    }

    /// What the content was when this proxy was created.
    pub fn element_kind(&self) -> ElementKind {
        self.0.borrow().element_kind.clone()
    }

    /// Whether any written value is pending.
    ///
    /// Values memoized by reads, computed properties and changes buffered inside nested
    /// proxies do not count; see [`BufferedProxy::has_deep_changes`] for the latter.
    pub fn has_buffered_changes(&self) -> bool {
        self.0.borrow().has_buffered_changes
    }

    /// Alias for [`BufferedProxy::has_buffered_changes`].
    pub fn has_changes(&self) -> bool {
        self.has_buffered_changes()
    }

    /// Returns the buffered keys (both written and memoized) in ascending order.
    pub fn buffered_keys(&self) -> Vec<String> {
        self.0.borrow().buffer.keys()
    }

    /// Registers an observer for change notifications on this proxy.
    pub fn observe<O>(&self, observer: Rc<RefCell<O>>)
    where
        O: ChangeObserver + 'static,
    {
        self.0.borrow_mut().observers.push(observer);
    }

    pub fn ptr_eq(&self, other: &BufferedProxy) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn will_change(&self, key: &str) {
        for observer in self.observers() {
            // an observer writing back into this proxy is not told about its own write
            match observer.try_borrow_mut() {
                Ok(mut observer) => observer.will_change(key),
                Err(_) => tracing::trace!(%key, "observer busy, dropping will_change"),
            }
        }
    }

    pub(crate) fn did_change(&self, key: &str) {
        for observer in self.observers() {
            match observer.try_borrow_mut() {
                Ok(mut observer) => observer.did_change(key),
                Err(_) => tracing::trace!(%key, "observer busy, dropping did_change"),
            }
        }
    }

    fn observers(&self) -> Vec<Rc<RefCell<dyn ChangeObserver>>> {
        self.0.borrow().observers.clone()
    }
}

impl PropertyReader for BufferedProxy {
    fn read(&self, key: &str) -> BufferedValue {
        self.get(key)
    }
}

impl fmt::Debug for BufferedProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // nested wrappers may point back at us, so only the keys are printed
        match self.0.try_borrow() {
            Ok(state) => f
                .debug_struct("BufferedProxy")
                .field("kind", &state.element_kind)
                .field("buffered", &state.buffer.keys())
                .field("has_buffered_changes", &state.has_buffered_changes)
                .finish(),
            Err(_) => f.write_str("BufferedProxy { <borrowed> }"),
        }
    }
}
