// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! JSON representation
//!
//! Host graphs can be built from a [`serde_json::Value`], and both host values and proxies can
//! be rendered back to one. Rendering a proxy shows its *tentative* state: content overlaid with
//! everything buffered, including edits inside nested proxies and sequences. Rendering never
//! memoizes anything in a buffer.
//!
//! Values that JSON cannot express are mapped as follows:
//!
//! - `undefined` properties are omitted, and `undefined` list elements become `null`;
//! - bytes become a base64 string;
//! - timestamps become an RFC 3339 string, and ulids their canonical string;
//! - an object or proxy that is already being rendered further up (a cycle) becomes `null`.
//!
//! # Example
//!
//! ```rust
//! # use buffered_proxy::{BufferedProxy, host::Value};
//! # use serde_json::json;
//! let content = Value::from_json(&json!({ "name": "Alice", "tags": ["a"] }));
//! let proxy = BufferedProxy::new(content.as_object().unwrap().clone());
//! proxy.set("name", "Bob");
//! proxy.get("tags").into_sequence().unwrap().push("b");
//!
//! assert_eq!(proxy.to_json(), json!({ "name": "Bob", "tags": ["a", "b"] }));
//! assert_eq!(content.to_json(), json!({ "name": "Alice", "tags": ["a"] }));
//! ```
use crate::{
    BufferRandomState,
    host::{List, Object, Primitive, Value},
    proxy::{BufferedProxy, BufferedValue, SequenceProxy},
};
use smallvec::SmallVec;
use std::collections::HashSet;

/// Converts a [`Primitive`] to a [`serde_json::Value`].
impl From<Primitive> for serde_json::Value {
    fn from(val: Primitive) -> Self {
        match val {
            Primitive::Bytes(v) => {
                base64::Engine::encode(&base64::engine::general_purpose::STANDARD, v).into()
            }
            Primitive::String(v) => v.into(),
            Primitive::Float(v) => v.into(),
            Primitive::Double(v) => v.into(),
            Primitive::U64(v) => v.into(),
            Primitive::I64(v) => v.into(),
            Primitive::Bool(v) => v.into(),
            #[cfg(feature = "chrono")]
            Primitive::Timestamp(v) => v.to_rfc3339().into(),
            #[cfg(feature = "ulid")]
            Primitive::Ulid(v) => v.to_string().into(),
        }
    }
}

type Seen = HashSet<usize, BufferRandomState>;

impl Value {
    /// Builds a fresh host graph from `json`.
    ///
    /// Objects become plain [`Object`]s. Integers become `I64` where they fit and `U64`
    /// otherwise, and all other numbers become `Double`.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => (*b).into(),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.into()
                } else if let Some(u) = n.as_u64() {
                    u.into()
                } else {
                    n.as_f64().map_or(Value::Null, Value::from)
                }
            }
            serde_json::Value::String(s) => s.as_str().into(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Value::from_json)
                .collect::<List>()
                .into(),
            serde_json::Value::Object(map) => map
                .iter()
                .fold(Object::new(), |object, (key, value)| {
                    object.with(key.as_str(), Value::from_json(value))
                })
                .into(),
        }
    }

    /// Renders this value as JSON, evaluating computed properties.
    pub fn to_json(&self) -> serde_json::Value {
        value_to_json(self, &mut Seen::default())
    }
}

fn value_to_json(value: &Value, seen: &mut Seen) -> serde_json::Value {
    match value {
        Value::Undefined | Value::Null => serde_json::Value::Null,
        Value::Primitive(p) => p.clone().into(),
        Value::List(list) => {
            if !seen.insert(list.id()) {
                return serde_json::Value::Null;
            }
            let items = list.to_vec().iter().map(|v| value_to_json(v, seen)).collect();
            seen.remove(&list.id());
            serde_json::Value::Array(items)
        }
        Value::Object(object) => {
            if !seen.insert(object.id()) {
                return serde_json::Value::Null;
            }
            let mut map = serde_json::Map::new();
            for key in object.keys() {
                let value = object.get(&key);
                if !value.is_undefined() {
                    map.insert(key, value_to_json(&value, seen));
                }
            }
            seen.remove(&object.id());
            serde_json::Value::Object(map)
        }
    }
}

impl BufferedProxy {
    /// Renders the tentative state of this proxy as JSON.
    ///
    /// Every key of content, of the buffer and of the proxy's defined properties is included,
    /// in ascending order, unless it reads as `undefined`.
    pub fn to_json(&self) -> serde_json::Value {
        proxy_to_json(self, &mut Seen::default())
    }
}

impl SequenceProxy {
    /// Renders the tentative state of this sequence as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        sequence_to_json(self, &mut Seen::default())
    }
}

fn buffered_to_json(value: &BufferedValue, seen: &mut Seen) -> serde_json::Value {
    match value {
        BufferedValue::Value(value) => value_to_json(value, seen),
        BufferedValue::Proxy(proxy) => proxy_to_json(proxy, seen),
        BufferedValue::Sequence(sequence) => sequence_to_json(sequence, seen),
    }
}

fn proxy_to_json(proxy: &BufferedProxy, seen: &mut Seen) -> serde_json::Value {
    // a proxy is on the path if it, or the object it wraps, is being rendered already
    let ids: SmallVec<[usize; 2]> = std::iter::once(proxy.id())
        .chain(proxy.content().map(|content| content.id()))
        .collect();
    if ids.iter().any(|id| seen.contains(id)) {
        return serde_json::Value::Null;
    }
    seen.extend(ids.iter().copied());

    let mut map = serde_json::Map::new();
    for key in proxy.visible_keys() {
        let value = proxy.peek(&key);
        if !value.is_undefined() {
            map.insert(key, buffered_to_json(&value, seen));
        }
    }

    for id in &ids {
        seen.remove(id);
    }
    serde_json::Value::Object(map)
}

fn sequence_to_json(sequence: &SequenceProxy, seen: &mut Seen) -> serde_json::Value {
    let ids = [sequence.id(), sequence.content().id()];
    if ids.iter().any(|id| seen.contains(id)) {
        return serde_json::Value::Null;
    }
    seen.extend(ids);

    let items = sequence
        .elements()
        .iter()
        .map(|element| buffered_to_json(element, seen))
        .collect();

    for id in &ids {
        seen.remove(id);
    }
    serde_json::Value::Array(items)
}
