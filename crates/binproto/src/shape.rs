//! Host shapes: the accessor contract between the structure codec and host values

use core::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::{errors::Result, types::TypeDef, value::Value};

/// A host value whose fields can be read and assigned by name
///
/// Usually implemented with `#[derive(Structure)]`.
pub trait Structure: Any + fmt::Debug + Send + Sync {
    /// Name of the shape this value belongs to
    fn shape_name(&self) -> &str;

    /// Current value of a field, `None` when the shape has no such field
    fn field(&self, name: &str) -> Option<Value>;

    /// Assign a decoded value to a field
    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    /// Borrow as [`Any`] for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Convert into [`Any`] for downcasting by value
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Clone behind a box
    fn clone_structure(&self) -> Box<dyn Structure>;

    /// Compare with another structure of any shape
    fn eq_structure(&self, other: &dyn Structure) -> bool;
}

impl Clone for Box<dyn Structure> {
    fn clone(&self) -> Self {
        self.clone_structure()
    }
}

impl PartialEq for Box<dyn Structure> {
    fn eq(&self, other: &Self) -> bool {
        self.eq_structure(other.as_ref())
    }
}

/// Static description of a host type
pub trait HostShape {
    /// Shape name
    const NAME: &'static str;
    /// Field names in declaration order
    const FIELDS: &'static [&'static str];
}

/// A host type that declares its own wire layout
///
/// ```rust,ignore
/// impl SchemeDefinition for Message {
///     fn definition() -> StructureDefinition {
///         StructureDefinition::new()
///             .field("key", TypeDef::string())
///             .field("value", TypeDef::nullable_string())
///     }
/// }
/// ```
pub trait SchemeDefinition: HostShape + Structure + Default {
    /// Field name to type mapping, in wire order
    fn definition() -> StructureDefinition;
}

/// Ordered field name to [`TypeDef`] mapping
///
/// The order of fields is the wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StructureDefinition {
    fields: Vec<(String, TypeDef)>,
}

impl StructureDefinition {
    /// Create an empty definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field
    pub fn field(mut self, name: impl Into<String>, def: impl Into<TypeDef>) -> Self {
        self.fields.push((name.into(), def.into()));
        self
    }

    /// Fields in wire order
    pub fn fields(&self) -> &[(String, TypeDef)] {
        &self.fields
    }

    /// Iterate over field names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are declared
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

type DefinitionFn = dyn Fn() -> StructureDefinition + Send + Sync;
type BlankFn = dyn Fn() -> Box<dyn Structure> + Send + Sync;

/// What makes two shapes the same shape
#[derive(PartialEq, Eq, Hash)]
enum Identity {
    /// A host type
    Host(TypeId),
    /// A record shape with this exact layout
    Record(StructureDefinition),
    /// Only this descriptor and its clones
    Instance,
}

struct ShapeInner {
    name: String,
    identity: Identity,
    fields: Vec<String>,
    definition: Box<DefinitionFn>,
    blank: Box<BlankFn>,
}

/// Runtime descriptor of a host shape
///
/// The definition is produced lazily so a shape may refer to itself.
///
/// Shapes of host types are equal when they describe the same Rust type,
/// record shapes when their names and definitions match. A descriptor built
/// with [`Shape::new`] is only equal to its own clones.
#[derive(Clone)]
pub struct Shape {
    inner: Arc<ShapeInner>,
}

impl Shape {
    /// Create a descriptor from its parts
    pub fn new<D, B>(name: impl Into<String>, fields: Vec<String>, definition: D, blank: B) -> Self
    where
        D: Fn() -> StructureDefinition + Send + Sync + 'static,
        B: Fn() -> Box<dyn Structure> + Send + Sync + 'static,
    {
        Self::with_identity(name.into(), Identity::Instance, fields, definition, blank)
    }

    fn with_identity<D, B>(
        name: String,
        identity: Identity,
        fields: Vec<String>,
        definition: D,
        blank: B,
    ) -> Self
    where
        D: Fn() -> StructureDefinition + Send + Sync + 'static,
        B: Fn() -> Box<dyn Structure> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ShapeInner {
                name,
                identity,
                fields,
                definition: Box::new(definition),
                blank: Box::new(blank),
            }),
        }
    }

    /// Descriptor of a host type
    pub fn of<T: SchemeDefinition>() -> Self {
        Self::with_identity(
            T::NAME.to_string(),
            Identity::Host(TypeId::of::<T>()),
            T::FIELDS.iter().map(|f| f.to_string()).collect(),
            T::definition,
            || Box::new(T::default()) as Box<dyn Structure>,
        )
    }

    /// Descriptor backed by [`Record`] values
    pub fn record(name: impl Into<String>, definition: StructureDefinition) -> Self {
        let name = name.into();
        let fields = definition.names().map(str::to_string).collect();
        let blank_name = name.clone();
        let layout = definition.clone();
        Self::with_identity(
            name,
            Identity::Record(layout),
            fields,
            move || definition.clone(),
            move || Box::new(Record::new(blank_name.clone())) as Box<dyn Structure>,
        )
    }

    /// Shape name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Field names the host value exposes
    pub fn fields(&self) -> &[String] {
        &self.inner.fields
    }

    /// Whether the host value exposes `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.inner.fields.iter().any(|f| f == field)
    }

    /// Produce the structure definition
    pub fn definition(&self) -> StructureDefinition {
        (self.inner.definition)()
    }

    /// Create an instance with no fields assigned
    pub fn blank(&self) -> Box<dyn Structure> {
        (self.inner.blank)()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("name", &self.inner.name)
            .field("fields", &self.inner.fields)
            .finish()
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        match (&self.inner.identity, &other.inner.identity) {
            (Identity::Instance, _) | (_, Identity::Instance) => false,
            (a, b) => self.inner.name == other.inner.name && a == b,
        }
    }
}

impl Eq for Shape {}

impl Hash for Shape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.name.hash(state);
        match &self.inner.identity {
            Identity::Instance => Arc::as_ptr(&self.inner).hash(state),
            identity => identity.hash(state),
        }
    }
}

/// Dynamic host value: an ordered field name to value map
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    shape: String,
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Create an empty record of the given shape
    pub fn new(shape: impl Into<String>) -> Self {
        Self {
            shape: shape.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field assignment
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Assign a field
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Borrow a field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Iterate over assigned fields in assignment order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Structure for Record {
    fn shape_name(&self) -> &str {
        &self.shape
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.fields.insert(name.to_string(), value);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_structure(&self) -> Box<dyn Structure> {
        Box::new(self.clone())
    }

    fn eq_structure(&self, other: &dyn Structure) -> bool {
        other.as_any().downcast_ref::<Record>() == Some(self)
    }
}
