//! Declaration of the context and event types one application may log
//!
//! A [`Specification`] is a dispatch table built at configuration time: each
//! admissible type contributes a [`TypeDescriptor`] holding its `TypeId`, its
//! wire key and the function that rebuilds a [`Value`] from payload bytes.
//!
//! # Wire keys
//!
//! The default key is [`std::any::type_name`], which the standard library
//! documents as neither unique nor stable across compiler versions. It is
//! fine when one build both writes and reads a stream. When writers and
//! readers are built separately, or streams are kept across toolchain
//! upgrades, declare types with [`TypeDescriptor::with_key`] so the key is
//! part of the application's own contract:
//!
//! ```
//! use rust_typed_logger::{Namespace, Specification, TypeDescriptor};
//! # use serde::{Deserialize, Serialize};
//! # #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! # struct Foo { two: i64 }
//!
//! let spec = Specification::new()
//!     .with_descriptor(Namespace::Event, TypeDescriptor::with_key::<Foo>("app.Foo"));
//! assert_eq!(spec.event_types()[0].key(), "app.Foo");
//! ```
//!
//! ```
//! use rust_typed_logger::Specification;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct RequestId(String);
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Foo {
//!     one: String,
//!     two: i64,
//! }
//!
//! let spec = Specification::new().context::<RequestId>().event::<Foo>();
//! assert_eq!(spec.context_types().len(), 1);
//! ```

use super::error::{LoggerError, Result};
use super::payload::{Payload, Value};
use super::registry::Namespace;
use serde::de::DeserializeOwned;
use std::any::TypeId;

/// Rebuilds a value of one concrete type from its inner encoding
pub type DecodeFn = fn(&[u8]) -> serde_json::Result<Value>;

fn decode_as<T: Payload + DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<Value> {
    serde_json::from_slice::<T>(bytes).map(Value::new)
}

/// One registered type: its identity, wire key and decoder
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    key: &'static str,
    decode: DecodeFn,
}

impl TypeDescriptor {
    /// Descriptor keyed by the type's module path and name
    ///
    /// The key comes from `std::any::type_name`, so it may change between
    /// compiler versions; see [`with_key`](Self::with_key).
    pub fn of<T: Payload + DeserializeOwned>() -> Self {
        let type_name = std::any::type_name::<T>();
        Self {
            type_id: TypeId::of::<T>(),
            type_name,
            key: type_name,
            decode: decode_as::<T>,
        }
    }

    /// Descriptor with an explicit wire key, stable across module moves
    pub fn with_key<T: Payload + DeserializeOwned>(key: &'static str) -> Self {
        Self {
            key,
            ..Self::of::<T>()
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Allocate a fresh value of the described type from payload bytes
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let value = (self.decode)(bytes).map_err(|e| {
            LoggerError::envelope(format!("cannot decode {} payload: {}", self.key, e))
        })?;
        Ok(value)
    }
}

/// Admissible context and event types for one application domain
#[derive(Debug, Clone, Default)]
pub struct Specification {
    context_types: Vec<TypeDescriptor>,
    event_types: Vec<TypeDescriptor>,
}

impl Specification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a context type
    #[must_use]
    pub fn context<T: Payload + DeserializeOwned>(self) -> Self {
        self.with_descriptor(Namespace::Context, TypeDescriptor::of::<T>())
    }

    /// Declare an event type
    #[must_use]
    pub fn event<T: Payload + DeserializeOwned>(self) -> Self {
        self.with_descriptor(Namespace::Event, TypeDescriptor::of::<T>())
    }

    /// Declare a type with a prepared descriptor
    ///
    /// A type already present in the namespace keeps its first declaration.
    #[must_use]
    pub fn with_descriptor(mut self, namespace: Namespace, descriptor: TypeDescriptor) -> Self {
        self.push(namespace, descriptor);
        self
    }

    fn push(&mut self, namespace: Namespace, descriptor: TypeDescriptor) {
        let types = match namespace {
            Namespace::Context => &mut self.context_types,
            Namespace::Event => &mut self.event_types,
        };
        if !types.iter().any(|d| d.type_id == descriptor.type_id) {
            types.push(descriptor);
        }
    }

    /// Union of several specifications by runtime type
    ///
    /// Declaration order is preserved and the first declaration of a type
    /// wins, so the result does not depend on anything but argument order.
    pub fn merge<'a, I>(specifications: I) -> Self
    where
        I: IntoIterator<Item = &'a Specification>,
    {
        let mut merged = Specification::new();
        for spec in specifications {
            for descriptor in &spec.context_types {
                merged.push(Namespace::Context, descriptor.clone());
            }
            for descriptor in &spec.event_types {
                merged.push(Namespace::Event, descriptor.clone());
            }
        }
        merged
    }

    pub fn context_types(&self) -> &[TypeDescriptor] {
        &self.context_types
    }

    pub fn event_types(&self) -> &[TypeDescriptor] {
        &self.event_types
    }

    pub fn types(&self, namespace: Namespace) -> &[TypeDescriptor] {
        match namespace {
            Namespace::Context => &self.context_types,
            Namespace::Event => &self.event_types,
        }
    }
}
