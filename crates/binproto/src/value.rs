//! Dynamic value model shared by every codec

use core::fmt;
use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;

use crate::{
    errors::{Error, Result},
    protocol::BinaryProtocol,
    shape::Structure,
};

/// A value that can be encoded or produced by a codec
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value, written as a `-1` length by nullable codecs
    Null,
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Raw byte string
    Bytes(Bytes),
    /// Ordered sequence
    Array(Vec<Value>),
    /// Associative array keyed by a field of each element
    Map(IndexMap<MapKey, Value>),
    /// Instance of a host shape
    Struct(Box<dyn Structure>),
    /// Value computed right before it is written or sized
    Deferred(Deferred),
}

impl Value {
    /// Short name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
            Value::Deferred(_) => "deferred",
        }
    }

    /// Wrap a host structure
    pub fn structure<T: Structure>(value: T) -> Self {
        Value::Struct(Box::new(value))
    }

    /// Wrap a computation resolved at write or size time
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn(&BinaryProtocol, &str) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Deferred(Deferred::new(f))
    }

    /// Whether this is [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer as `i64`, if it fits
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Integer as `u64`, if it fits
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int(v) => u64::try_from(v).ok(),
            Value::UInt(v) => Some(v),
            _ => None,
        }
    }

    /// Integer widened to `i128`
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::Int(v) => Some(v as i128),
            Value::UInt(v) => Some(v as i128),
            _ => None,
        }
    }

    /// Byte string contents
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Byte string as UTF-8 text
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| core::str::from_utf8(b).ok())
    }

    /// Sequence elements
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Associative array entries
    pub fn as_map(&self) -> Option<&IndexMap<MapKey, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Host structure
    pub fn as_struct(&self) -> Option<&dyn Structure> {
        match self {
            Value::Struct(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Borrow the host structure as a concrete type
    pub fn downcast_ref<T: Structure>(&self) -> Option<&T> {
        self.as_struct()
            .and_then(|s| s.as_any().downcast_ref::<T>())
    }
}

macro_rules! impl_from_int {
    ($variant:ident: $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_int!(Int: i8, i16, i32, i64);
impl_from_int!(UInt: u8, u16, u32, u64);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Bytes(Bytes::from(value))
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(value))
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<IndexMap<MapKey, Value>> for Value {
    fn from(value: IndexMap<MapKey, Value>) -> Self {
        Value::Map(value)
    }
}

impl From<MapKey> for Value {
    fn from(key: MapKey) -> Self {
        match key {
            MapKey::Int(v) => Value::Int(v),
            MapKey::UInt(v) => Value::UInt(v),
            MapKey::Bytes(b) => Value::Bytes(b),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Key of an associative array
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    /// Signed integer key
    Int(i64),
    /// Unsigned integer key
    UInt(u64),
    /// Byte string key
    Bytes(Bytes),
}

impl TryFrom<&Value> for MapKey {
    /// Kind of the rejected value
    type Error = &'static str;

    fn try_from(value: &Value) -> core::result::Result<Self, Self::Error> {
        match value {
            Value::Int(v) => Ok(MapKey::Int(*v)),
            Value::UInt(v) => Ok(MapKey::UInt(*v)),
            Value::Bytes(b) => Ok(MapKey::Bytes(b.clone())),
            other => Err(other.kind()),
        }
    }
}

impl From<&str> for MapKey {
    fn from(value: &str) -> Self {
        MapKey::Bytes(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<i64> for MapKey {
    fn from(value: i64) -> Self {
        MapKey::Int(value)
    }
}

impl From<u64> for MapKey {
    fn from(value: u64) -> Self {
        MapKey::UInt(value)
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Int(v) => write!(f, "{v}"),
            MapKey::UInt(v) => write!(f, "{v}"),
            MapKey::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

type DeferredFn = dyn Fn(&BinaryProtocol, &str) -> Result<Value> + Send + Sync;

/// Lazily computed value
///
/// Receives the protocol and the current path. Equality is pointer identity.
#[derive(Clone)]
pub struct Deferred(Arc<DeferredFn>);

impl Deferred {
    /// Wrap a computation
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&BinaryProtocol, &str) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the computation
    pub fn resolve(&self, protocol: &BinaryProtocol, path: &str) -> Result<Value> {
        (self.0)(protocol, path)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Conversion between a typed host field and a [`Value`]
pub trait FieldValue: Sized {
    /// Convert the field into a value for encoding
    fn to_value(&self) -> Value;

    /// Convert a decoded value into the field type
    fn from_value(value: Value) -> Result<Self>;
}

fn field_type<T>(expected: &'static str, value: &Value) -> Result<T> {
    Err(Error::FieldType {
        expected,
        actual: value.kind(),
    })
}

macro_rules! impl_field_int {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn to_value(&self) -> Value {
                    Value::from(*self)
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value.as_i128().and_then(|v| <$ty>::try_from(v).ok()) {
                        Some(v) => Ok(v),
                        None => field_type(stringify!($ty), &value),
                    }
                }
            }
        )*
    };
}

impl_field_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FieldValue for Bytes {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => field_type("Bytes", &other),
        }
    }
}

impl FieldValue for String {
    fn to_value(&self) -> Value {
        Value::from(self.as_str())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(String::from_utf8(b.to_vec())?),
            other => field_type("String", &other),
        }
    }
}

impl FieldValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => field_type("Vec", &other),
        }
    }
}

impl<T: FieldValue> FieldValue for IndexMap<MapKey, T> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| -> Result<(MapKey, T)> { Ok((k, T::from_value(v)?)) })
                .collect(),
            other => field_type("IndexMap", &other),
        }
    }
}
