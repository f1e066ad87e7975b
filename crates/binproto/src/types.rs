//! Declarative type definitions
//!
//! A [`TypeDef`] selects a codec kind and carries its configuration. It is
//! also the cache key under which [`BinaryProtocol`] keeps built codecs.

use core::fmt;

use crate::{
    errors::{Error, Result},
    primitives::FixedInt,
    protocol::BinaryProtocol,
    shape::{SchemeDefinition, Shape},
    stream::Stream,
    value::Value,
};

/// Codec selector together with its options
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDef {
    /// Fixed-width integer
    Int(FixedInt),
    /// Base-128 integer over the 32-bit domain
    VarInt,
    /// Base-128 integer over the 64-bit domain
    VarLong,
    /// Zig-zag mapped [`TypeDef::VarInt`]
    VarIntZigZag,
    /// Zig-zag mapped [`TypeDef::VarLong`], limited to 63-bit signed values
    VarLongZigZag,
    /// Length-prefixed byte string
    BinaryString(StringOptions),
    /// Length-prefixed byte string that is always nullable
    NullableString(StringOptions),
    /// Length-prefixed homogeneous sequence
    ArrayOf(ArrayOptions),
    /// Host shape with ordered, typed fields
    Structure(StructureOptions),
    /// Reference to a shape registered under this name
    Named(String),
}

impl TypeDef {
    /// `Int8`
    pub const INT8: TypeDef = TypeDef::Int(FixedInt::Int8);
    /// `UInt8`
    pub const UINT8: TypeDef = TypeDef::Int(FixedInt::UInt8);
    /// `Int16BE`
    pub const INT16BE: TypeDef = TypeDef::Int(FixedInt::Int16BE);
    /// `Int32BE`
    pub const INT32BE: TypeDef = TypeDef::Int(FixedInt::Int32BE);
    /// `Int64BE`
    pub const INT64BE: TypeDef = TypeDef::Int(FixedInt::Int64BE);

    /// `BinaryString` with default options
    pub fn string() -> Self {
        TypeDef::BinaryString(StringOptions::default())
    }

    /// `NullableString` with default options
    pub fn nullable_string() -> Self {
        TypeDef::NullableString(StringOptions::default())
    }

    /// `ArrayOf` the given item with default options
    pub fn array(item: impl Into<TypeDef>) -> Self {
        TypeDef::ArrayOf(ArrayOptions::new(item))
    }

    /// `Structure` of a host type
    pub fn structure<T: SchemeDefinition>() -> Self {
        TypeDef::Structure(StructureOptions::new(Shape::of::<T>()))
    }

    /// `Structure` of a shape descriptor
    pub fn shape(shape: Shape) -> Self {
        TypeDef::Structure(StructureOptions::new(shape))
    }

    /// Shorthand reference to a registered shape
    pub fn named(name: impl Into<String>) -> Self {
        TypeDef::Named(name.into())
    }

    /// Resolve an option-less codec kind by its selector name
    pub fn from_selector(name: &str) -> Option<Self> {
        match name {
            "VarInt" => Some(TypeDef::VarInt),
            "VarLong" => Some(TypeDef::VarLong),
            "VarIntZigZag" => Some(TypeDef::VarIntZigZag),
            "VarLongZigZag" => Some(TypeDef::VarLongZigZag),
            "BinaryString" => Some(TypeDef::string()),
            "NullableString" => Some(TypeDef::nullable_string()),
            other => FixedInt::from_name(other).map(TypeDef::Int),
        }
    }

    /// Selector name
    pub fn selector(&self) -> &str {
        match self {
            TypeDef::Int(kind) => kind.name(),
            TypeDef::VarInt => "VarInt",
            TypeDef::VarLong => "VarLong",
            TypeDef::VarIntZigZag => "VarIntZigZag",
            TypeDef::VarLongZigZag => "VarLongZigZag",
            TypeDef::BinaryString(_) => "BinaryString",
            TypeDef::NullableString(_) => "NullableString",
            TypeDef::ArrayOf(_) => "ArrayOf",
            TypeDef::Structure(_) => "Structure",
            TypeDef::Named(name) => name,
        }
    }
}

impl From<FixedInt> for TypeDef {
    fn from(kind: FixedInt) -> Self {
        TypeDef::Int(kind)
    }
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDef::Structure(options) => write!(f, "Structure({})", options.shape.name()),
            other => f.write_str(other.selector()),
        }
    }
}

/// Length or count of a composite value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Size {
    /// Literal length, no prefix is written
    Fixed(usize),
    /// Length encoded in front of the payload, `-1` for null
    Prefix(Box<TypeDef>),
}

impl Size {
    /// Obtain the length, decoding the prefix if there is one
    pub(crate) fn read_length(
        &self,
        protocol: &BinaryProtocol,
        stream: &mut dyn Stream,
        path: &str,
    ) -> Result<i64> {
        match self {
            Size::Fixed(n) => Ok(*n as i64),
            Size::Prefix(def) => {
                let size_path = format!("{path}[size]");
                let value = protocol.read(def, stream, &size_path)?;
                value.as_i64().ok_or(Error::UnexpectedValue {
                    codec: "size",
                    expected: "integer",
                    actual: value.kind(),
                    path: size_path,
                })
            }
        }
    }

    fn prefix(length: Option<usize>) -> Value {
        length.map_or(Value::Int(-1), |l| Value::Int(l as i64))
    }

    fn check_fixed(expected: usize, length: Option<usize>, path: &str) -> Result<()> {
        if length == Some(expected) {
            return Ok(());
        }
        Err(Error::SizeMismatch {
            expected,
            actual: length.map_or(-1, |l| l as i64),
            path: path.to_string(),
        })
    }

    /// Check a literal length or encode the prefix; `None` stands for null
    pub(crate) fn write_length(
        &self,
        protocol: &BinaryProtocol,
        length: Option<usize>,
        stream: &mut dyn Stream,
        path: &str,
    ) -> Result<()> {
        match self {
            Size::Fixed(n) => Self::check_fixed(*n, length, path),
            Size::Prefix(def) => {
                protocol.write(&Self::prefix(length), def, stream, &format!("{path}[size]"))
            }
        }
    }

    /// Bytes taken by the prefix, 0 for a literal length
    pub(crate) fn length_size(
        &self,
        protocol: &BinaryProtocol,
        length: Option<usize>,
        path: &str,
    ) -> Result<usize> {
        match self {
            Size::Fixed(n) => Self::check_fixed(*n, length, path).map(|_| 0),
            Size::Prefix(def) => {
                protocol.size_of(&Self::prefix(length), def, &format!("{path}[size]"))
            }
        }
    }
}

impl From<usize> for Size {
    fn from(n: usize) -> Self {
        Size::Fixed(n)
    }
}

impl From<TypeDef> for Size {
    fn from(def: TypeDef) -> Self {
        Size::Prefix(Box::new(def))
    }
}

impl From<FixedInt> for Size {
    fn from(kind: FixedInt) -> Self {
        Size::Prefix(Box::new(TypeDef::Int(kind)))
    }
}

/// Options of `BinaryString` and `NullableString`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringOptions {
    /// Length prefix or literal length, `Int16BE` prefix by default
    pub size: Size,
    /// Whether a `-1` length stands for null
    pub nullable: bool,
    /// Type whose encoding forms the payload
    pub envelope: Option<Box<TypeDef>>,
}

impl Default for StringOptions {
    fn default() -> Self {
        Self {
            size: Size::from(FixedInt::Int16BE),
            nullable: false,
            envelope: None,
        }
    }
}

impl StringOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the length prefix or literal length
    pub fn size(mut self, size: impl Into<Size>) -> Self {
        self.size = size.into();
        self
    }

    /// Set nullability
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the envelope type
    pub fn envelope(mut self, envelope: impl Into<TypeDef>) -> Self {
        self.envelope = Some(Box::new(envelope.into()));
        self
    }
}

impl From<StringOptions> for TypeDef {
    fn from(options: StringOptions) -> Self {
        TypeDef::BinaryString(options)
    }
}

/// Options of `ArrayOf`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayOptions {
    /// Element type
    pub item: Box<TypeDef>,
    /// Count prefix or literal count, `Int32BE` prefix by default
    pub size: Size,
    /// Field of each element that keys the decoded associative array
    pub key: Option<String>,
    /// Whether a `-1` count stands for null
    pub nullable: bool,
}

impl ArrayOptions {
    /// Options for the given element type
    pub fn new(item: impl Into<TypeDef>) -> Self {
        Self {
            item: Box::new(item.into()),
            size: Size::from(FixedInt::Int32BE),
            key: None,
            nullable: false,
        }
    }

    /// Set the count prefix or literal count
    pub fn size(mut self, size: impl Into<Size>) -> Self {
        self.size = size.into();
        self
    }

    /// Key decoded elements by this field
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set nullability
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

impl From<ArrayOptions> for TypeDef {
    fn from(options: ArrayOptions) -> Self {
        TypeDef::ArrayOf(options)
    }
}

/// Options of `Structure`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructureOptions {
    /// Host shape
    pub shape: Shape,
}

impl StructureOptions {
    /// Options for the given shape
    pub fn new(shape: Shape) -> Self {
        Self { shape }
    }
}
