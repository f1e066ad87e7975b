//! Abstract Syntax Tree for the BinProto schema language

use std::fmt;

/// A complete schema file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// Declared structures in source order
    pub structs: Vec<StructDef>,
}

/// A structure declaration
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    /// Structure name
    pub name: String,
    /// Fields in wire order
    pub fields: Vec<Field>,
}

/// A field in a structure, in wire order
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Declared type
    pub type_expr: TypeExpr,
}

/// A codec selector with its options, e.g. `ArrayOf(item = Int8, size = 3)`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    /// Codec kind or structure name
    pub selector: String,
    /// Options in source order
    pub options: Vec<TypeOption>,
}

/// A `name = value` option
#[derive(Debug, Clone, PartialEq)]
pub struct TypeOption {
    /// Option name
    pub name: String,
    /// Option value
    pub value: OptionValue,
}

/// Value of an option
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// A nested type expression
    Type(TypeExpr),
    /// An integer literal
    Integer(i64),
    /// `true` or `false`
    Bool(bool),
    /// A quoted string
    String(String),
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a structure to the schema
    pub fn add_struct(&mut self, item: StructDef) {
        self.structs.push(item);
    }

    /// Find a structure by name
    pub fn find_struct(&self, name: &str) -> Option<&StructDef> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Names of all declared structures
    pub fn struct_names(&self) -> impl Iterator<Item = &str> {
        self.structs.iter().map(|s| s.name.as_str())
    }
}

impl TypeExpr {
    /// A selector without options
    pub fn bare(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            options: Vec::new(),
        }
    }

    /// Find an option by name
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .map(|o| &o.value)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector)?;
        if self.options.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, option) in self.options.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} = {}", option.name, option.value)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Type(expr) => write!(f, "{expr}"),
            OptionValue::Integer(v) => write!(f, "{v}"),
            OptionValue::Bool(v) => write!(f, "{v}"),
            OptionValue::String(v) => write!(f, "{v:?}"),
        }
    }
}
