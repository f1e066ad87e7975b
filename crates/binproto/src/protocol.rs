//! Type registry and dispatcher

use core::fmt;
use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
    sync::Arc,
};

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::{
    array::ArrayOfCodec,
    errors::{Error, Result},
    primitives::FixedIntCodec,
    shape::{SchemeDefinition, Shape},
    stream::{BufferStream, Stream},
    string::BinaryStringCodec,
    structure::StructureCodec,
    types::{Size, TypeDef},
    value::{Deferred, Value},
    varint::{VarIntCodec, VarKind},
    Codec,
};

/// Resolves type definitions to codecs and dispatches `read`, `write` and `size_of`
///
/// Built codecs are cached per instance, keyed by the structural value of
/// their [`TypeDef`], and never evicted. Shapes registered by name back
/// [`TypeDef::Named`] references.
pub struct BinaryProtocol {
    codecs: RwLock<HashMap<TypeDef, Arc<dyn Codec>>>,
    shapes: RwLock<HashMap<String, Shape>>,
}

impl BinaryProtocol {
    /// Create a protocol with an empty cache and no registered shapes
    pub fn new() -> Self {
        Self {
            codecs: RwLock::new(HashMap::new()),
            shapes: RwLock::new(HashMap::new()),
        }
    }

    /// Register a shape under its name
    ///
    /// Returns `false` and keeps the existing shape if the name is taken.
    pub fn register_shape(&self, shape: Shape) -> bool {
        let mut shapes = self.shapes.write();
        if shapes.contains_key(shape.name()) {
            return false;
        }
        debug!(shape = shape.name(), "registered shape");
        shapes.insert(shape.name().to_string(), shape);
        true
    }

    /// Register a host type under its shape name
    pub fn register<T: SchemeDefinition>(&self) -> bool {
        self.register_shape(Shape::of::<T>())
    }

    /// Look up a registered shape
    pub fn shape(&self, name: &str) -> Option<Shape> {
        self.shapes.read().get(name).cloned()
    }

    /// Number of cached codecs
    pub fn cached_codecs(&self) -> usize {
        self.codecs.read().len()
    }

    /// Decode a value of type `def` from the stream
    pub fn read(&self, def: &TypeDef, stream: &mut dyn Stream, path: &str) -> Result<Value> {
        self.codec(def, path)?.read(self, stream, path)
    }

    /// Encode `value` as type `def` into the stream
    pub fn write(&self, value: &Value, def: &TypeDef, stream: &mut dyn Stream, path: &str) -> Result<()> {
        match value {
            Value::Deferred(deferred) => {
                let value = self.resolve(deferred, path)?;
                self.codec(def, path)?.write(self, &value, stream, path)
            }
            value => self.codec(def, path)?.write(self, value, stream, path),
        }
    }

    /// Exact number of bytes [`BinaryProtocol::write`] emits for `value`
    pub fn size_of(&self, value: &Value, def: &TypeDef, path: &str) -> Result<usize> {
        match value {
            Value::Deferred(deferred) => {
                let value = self.resolve(deferred, path)?;
                self.codec(def, path)?.size_of(self, &value, path)
            }
            value => self.codec(def, path)?.size_of(self, value, path),
        }
    }

    /// Encode into a buffer allocated with the exact encoded size
    pub fn encode(&self, value: &Value, def: &TypeDef) -> Result<Bytes> {
        let size = self.size_of(value, def, "")?;
        let mut stream = BufferStream::with_capacity(size);
        self.write(value, def, &mut stream, "")?;
        debug_assert_eq!(stream.remaining(), size);
        Ok(stream.into_bytes())
    }

    /// Decode a value from a byte buffer
    pub fn decode(&self, def: &TypeDef, bytes: impl Into<Bytes>) -> Result<Value> {
        let mut stream = BufferStream::from(bytes.into());
        self.read(def, &mut stream, "")
    }

    /// Resolve a definition to its cached codec, building it on first use
    pub fn codec(&self, def: &TypeDef, path: &str) -> Result<Arc<dyn Codec>> {
        let def = self.normalize(def, path)?;
        if let Some(codec) = self.codecs.read().get(&*def) {
            return Ok(Arc::clone(codec));
        }

        // built outside the lock; the first insert wins a race
        let codec = self.build(&def, path)?;
        let mut codecs = self.codecs.write();
        let codec = codecs.entry(def.into_owned()).or_insert(codec);
        Ok(Arc::clone(codec))
    }

    fn resolve(&self, deferred: &Deferred, path: &str) -> Result<Value> {
        trace!(path, "resolving deferred value");
        deferred.resolve(self, path)
    }

    fn normalize<'a>(&self, def: &'a TypeDef, path: &str) -> Result<Cow<'a, TypeDef>> {
        match def {
            TypeDef::Named(name) => self
                .shape(name)
                .map(|shape| Cow::Owned(TypeDef::shape(shape)))
                .ok_or_else(|| unknown_selector(name, path)),
            def => Ok(Cow::Borrowed(def)),
        }
    }

    fn build(&self, def: &TypeDef, path: &str) -> Result<Arc<dyn Codec>> {
        self.check_references(def, path, &mut HashSet::new())?;
        let codec: Arc<dyn Codec> = match def {
            TypeDef::Int(kind) => Arc::new(FixedIntCodec::new(*kind)),
            TypeDef::VarInt => Arc::new(VarIntCodec::new(VarKind::VarInt)),
            TypeDef::VarLong => Arc::new(VarIntCodec::new(VarKind::VarLong)),
            TypeDef::VarIntZigZag => Arc::new(VarIntCodec::new(VarKind::VarIntZigZag)),
            TypeDef::VarLongZigZag => Arc::new(VarIntCodec::new(VarKind::VarLongZigZag)),
            TypeDef::BinaryString(options) => Arc::new(BinaryStringCodec::new(options.clone())),
            TypeDef::NullableString(options) => {
                Arc::new(BinaryStringCodec::nullable(options.clone()))
            }
            TypeDef::ArrayOf(options) => Arc::new(ArrayOfCodec::new(options.clone())),
            TypeDef::Structure(options) => Arc::new(StructureCodec::new(options.shape.clone())?),
            TypeDef::Named(name) => return Err(unknown_selector(name, path)),
        };
        debug!(selector = %def, path, "constructed codec");
        Ok(codec)
    }

    /// Fail fast on references to unregistered shapes anywhere below `def`
    fn check_references(
        &self,
        def: &TypeDef,
        path: &str,
        visited: &mut HashSet<Shape>,
    ) -> Result<()> {
        let check_size = |size: &Size, visited: &mut HashSet<Shape>| match size {
            Size::Prefix(def) => self.check_references(def, &format!("{path}[size]"), visited),
            Size::Fixed(_) => Ok(()),
        };
        match def {
            TypeDef::BinaryString(options) | TypeDef::NullableString(options) => {
                check_size(&options.size, visited)?;
                if let Some(envelope) = &options.envelope {
                    self.check_references(envelope, &format!("{path}[envelope]"), visited)?;
                }
                Ok(())
            }
            TypeDef::ArrayOf(options) => {
                check_size(&options.size, visited)?;
                self.check_references(&options.item, &format!("{path}[item]"), visited)
            }
            TypeDef::Structure(options) => self.check_shape(&options.shape, path, visited),
            TypeDef::Named(name) => {
                let shape = self.shape(name).ok_or_else(|| unknown_selector(name, path))?;
                self.check_shape(&shape, path, visited)
            }
            _ => Ok(()),
        }
    }

    fn check_shape(&self, shape: &Shape, path: &str, visited: &mut HashSet<Shape>) -> Result<()> {
        if !visited.insert(shape.clone()) {
            return Ok(());
        }
        for (name, def) in shape.definition().fields() {
            self.check_references(def, &format!("{path}:{}->{name}", shape.name()), visited)?;
        }
        Ok(())
    }
}

fn unknown_selector(name: &str, path: &str) -> Error {
    Error::UnknownSelector {
        selector: name.to_string(),
        path: path.to_string(),
    }
}

impl Default for BinaryProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BinaryProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryProtocol")
            .field("codecs", &self.codecs.read().len())
            .field("shapes", &self.shapes.read().keys().collect::<Vec<_>>())
            .finish()
    }
}
