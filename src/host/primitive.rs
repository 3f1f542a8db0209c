// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Opaque primitive values held by host objects.
//!
//! Primitives are never wrapped in a proxy. They are compared by value when the gate decides
//! whether a write is a no-op or a revert.

/// A primitive value stored in a host [`Object`](super::Object) or [`List`](super::List).
// NOTE: Why no U32 or I32? Make this a serialization concern.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Primitive {
    // NOTE: the #[serde] here is needed to get efficient encoding of byte-arrays for
    // protocols that support it (like msgpack).
    Bytes(#[cfg_attr(feature = "serde", serde(with = "serde_bytes"))] Vec<u8>),
    String(String),
    Float(f32),
    Double(f64),
    U64(u64),
    I64(i64),
    Bool(bool),
    #[cfg(feature = "chrono")]
    Timestamp(chrono::DateTime<chrono::Utc>),
    #[cfg(feature = "ulid")]
    Ulid(ulid::Ulid),
}

impl Primitive {
    /// Returns true if the host treats this value as empty.
    ///
    /// Empty primitives are `false`, numeric zero, NaN, the empty string and empty bytes.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Bytes(b) => b.is_empty(),
            Self::String(s) => s.is_empty(),
            Self::Float(f) => *f == 0.0 || f.is_nan(),
            Self::Double(d) => *d == 0.0 || d.is_nan(),
            Self::U64(u) => *u == 0,
            Self::I64(i) => *i == 0,
            Self::Bool(b) => !b,
            #[cfg(feature = "chrono")]
            Self::Timestamp(_) => false,
            #[cfg(feature = "ulid")]
            Self::Ulid(_) => false,
        }
    }

    /// A short name for the kind of primitive, used in debug output and logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::U64(_) => "u64",
            Self::I64(_) => "i64",
            Self::Bool(_) => "bool",
            #[cfg(feature = "chrono")]
            Self::Timestamp(_) => "timestamp",
            #[cfg(feature = "ulid")]
            Self::Ulid(_) => "ulid",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! impl_from {
(
    $(
        $source:ty => $target:ident $(with $conv:ident)?
    ),* $(,)?
    ) => {
        $(
            impl From<$source> for Primitive {
                fn from(value: $source) -> Self {
                    Self::$target(impl_from!(value$(, $conv)?))
                }
            }
        )*
    };

    ($value:ident, $conv:ident) => {
        $value.$conv()
    };

    ($value:ident) => {
        $value
    };
}

impl_from!(
    &[u8]      => Bytes with into,
    Vec<u8>    => Bytes,
    String     => String,
    &str       => String with to_string,
    &String    => String with clone,
    f32        => Float,
    f64        => Double,
    u8         => U64 with into,
    u16        => U64 with into,
    u32        => U64 with into,
    u64        => U64,
    i8         => I64 with into,
    i16        => I64 with into,
    i32        => I64 with into,
    i64        => I64,
    bool       => Bool,
);

#[cfg(feature = "chrono")]
impl From<chrono::DateTime<chrono::Utc>> for Primitive {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        Self::Timestamp(value)
    }
}

#[cfg(feature = "ulid")]
impl From<ulid::Ulid> for Primitive {
    fn from(value: ulid::Ulid) -> Self {
        Self::Ulid(value)
    }
}

impl std::fmt::Debug for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(inner) => write!(f, "{inner:02X?}"),
            Self::String(inner) => inner.fmt(f),
            Self::Bool(inner) => inner.fmt(f),
            // Make sure to always print at least 1 decimal, so we can non-ambiguously
            // tell apart I64 and floats (this is achieved by {:?} instead of {}).
            Self::Float(inner) => write!(f, "{inner:?}f"),
            Self::Double(inner) => write!(f, "{inner:?}d"),
            Self::U64(inner) => write!(f, "{inner}u"),
            Self::I64(inner) => write!(f, "{inner}"),
            #[cfg(feature = "chrono")]
            Self::Timestamp(inner) => write!(f, "{}", inner.to_rfc3339()),
            #[cfg(feature = "ulid")]
            Self::Ulid(inner) => inner.fmt(f),
        }
    }
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        use Primitive::*;
        match (self, other) {
            (Bytes(b1), Bytes(b2)) => b1.eq(b2),
            (String(s1), String(s2)) => s1.eq(s2),
            (Double(d1), Double(d2)) => float_eq(*d1, *d2),
            (Float(f1), Float(f2)) => float_eq(f64::from(*f1), f64::from(*f2)),
            (Float(f), Double(d)) | (Double(d), Float(f)) => float_eq(f64::from(*f), *d),
            (Double(d), I64(i)) | (I64(i), Double(d)) => float_is_int(*d, i128::from(*i)),
            (Double(d), U64(u)) | (U64(u), Double(d)) => float_is_int(*d, i128::from(*u)),
            (Float(f), I64(i)) | (I64(i), Float(f)) => float_is_int(f64::from(*f), i128::from(*i)),
            (Float(f), U64(u)) | (U64(u), Float(f)) => float_is_int(f64::from(*f), i128::from(*u)),
            (U64(u1), U64(u2)) => u1.eq(u2),
            (I64(i1), I64(i2)) => i1.eq(i2),
            // integers are compared numerically so that a u64 read from the host and an i64
            // written by a caller do not produce a spurious buffered change
            (U64(u), I64(i)) | (I64(i), U64(u)) => u64::try_from(*i).is_ok_and(|i| i == *u),
            (Bool(b1), Bool(b2)) => b1.eq(b2),
            #[cfg(feature = "chrono")]
            (Timestamp(t1), Timestamp(t2)) => t1.eq(t2),
            #[cfg(feature = "ulid")]
            (Ulid(ulid1), Ulid(ulid2)) => ulid1.eq(ulid2),
            _ => false,
        }
    }
}
impl Eq for Primitive {}

// NaN equals NaN so that rewriting it is not a change
fn float_eq(f1: f64, f2: f64) -> bool {
    f1 == f2 || (f1.is_nan() && f2.is_nan())
}

fn float_is_int(f: f64, i: i128) -> bool {
    f.fract() == 0.0 && f as i128 == i
}

impl PartialEq<str> for Primitive {
    fn eq(&self, other: &str) -> bool {
        matches!(self, Self::String(s) if s == other)
    }
}
impl PartialEq<&str> for Primitive {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, Self::String(s) if s == other)
    }
}
impl PartialEq<bool> for Primitive {
    fn eq(&self, other: &bool) -> bool {
        matches!(self, Self::Bool(b) if b == other)
    }
}
impl PartialEq<f64> for Primitive {
    fn eq(&self, other: &f64) -> bool {
        matches!(self, Self::Double(f) if f == other)
    }
}
impl PartialEq<i64> for Primitive {
    fn eq(&self, other: &i64) -> bool {
        match self {
            Self::U64(u) => i64::try_from(*u).is_ok_and(|i| &i == other),
            Self::I64(i) => i == other,
            _ => false,
        }
    }
}
// i32 because it's the "default" inference integer type
impl PartialEq<i32> for Primitive {
    fn eq(&self, other: &i32) -> bool {
        *self == i64::from(*other)
    }
}

#[cfg(any(test, feature = "arbitrary"))]
impl quickcheck::Arbitrary for Primitive {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let mut choices = vec!["bytes", "string", "double", "u64", "i64", "bool"];
        if cfg!(feature = "ulid") {
            choices.push("ulid");
        }
        match *g.choose(&choices).unwrap() {
            "bytes" => Self::Bytes(<_>::arbitrary(g)),
            "string" => Self::String(<_>::arbitrary(g)),
            "double" => Self::Double(<_>::arbitrary(g)),
            "u64" => Self::U64(<_>::arbitrary(g)),
            "i64" => Self::I64(<_>::arbitrary(g)),
            "bool" => Self::Bool(<_>::arbitrary(g)),
            #[cfg(feature = "ulid")]
            "ulid" => Self::Ulid(ulid::Ulid(<_>::arbitrary(g))),
            _ => unreachable!(),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            Self::Bytes(v) => Box::new(v.shrink().map(Self::Bytes)),
            Self::String(v) => Box::new(v.shrink().map(Self::String)),
            Self::Double(v) => Box::new(v.shrink().map(Self::Double)),
            Self::U64(v) => Box::new(v.shrink().map(Self::U64)),
            Self::I64(v) => Box::new(v.shrink().map(Self::I64)),
            Self::Bool(v) => Box::new(v.shrink().map(Self::Bool)),
            _ => quickcheck::empty_shrinker(),
        }
    }
}
