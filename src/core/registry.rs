//! Bidirectional type/key lookup derived from a [`Specification`]
//!
//! The registry is immutable once built and shared by reference count, so
//! every logger branched with `with_context` and every stream decoder built
//! from the same configuration sees the same tables.

use super::error::{LoggerError, Result};
use super::events::{ErrorEvent, UnstructuredEvent};
use super::payload::Value;
use super::specification::{Specification, TypeDescriptor};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The two independent key spaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Context,
    Event,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Context => f.write_str("context"),
            Namespace::Event => f.write_str("event"),
        }
    }
}

/// Event types every registry accepts without being declared
pub fn default_event_types() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::of::<UnstructuredEvent>(),
        TypeDescriptor::of::<ErrorEvent>(),
    ]
}

#[derive(Debug, Default)]
struct Table {
    by_key: HashMap<&'static str, TypeDescriptor>,
    by_type: HashMap<TypeId, &'static str>,
}

impl Table {
    fn insert(&mut self, namespace: Namespace, descriptor: &TypeDescriptor) -> Result<()> {
        if self.by_type.contains_key(&descriptor.type_id()) {
            return Ok(());
        }
        if self.by_key.contains_key(descriptor.key()) {
            return Err(LoggerError::KeyCollision {
                namespace,
                key: descriptor.key().to_string(),
            });
        }
        self.by_type.insert(descriptor.type_id(), descriptor.key());
        self.by_key.insert(descriptor.key(), descriptor.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Tables {
    contexts: Table,
    events: Table,
}

/// Read-only type registry shared by loggers and decoders
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    tables: Arc<Tables>,
}

impl TypeRegistry {
    /// Build the registry, merging in the default event types
    ///
    /// Fails if two distinct types in one namespace map to the same key.
    pub fn new(specification: &Specification) -> Result<Self> {
        let mut tables = Tables::default();
        for descriptor in specification.context_types() {
            tables.contexts.insert(Namespace::Context, descriptor)?;
        }
        for descriptor in specification
            .event_types()
            .iter()
            .cloned()
            .chain(default_event_types())
        {
            tables.events.insert(Namespace::Event, &descriptor)?;
        }
        Ok(Self {
            tables: Arc::new(tables),
        })
    }

    fn table(&self, namespace: Namespace) -> &Table {
        match namespace {
            Namespace::Context => &self.tables.contexts,
            Namespace::Event => &self.tables.events,
        }
    }

    /// Wire key for a value's runtime type
    ///
    /// Registered types use their declared key; anything else falls back to
    /// the type's own name so marshalling never needs membership.
    pub fn key_of(&self, namespace: Namespace, value: &Value) -> &'static str {
        self.table(namespace)
            .by_type
            .get(&value.payload_type_id())
            .copied()
            .unwrap_or_else(|| value.type_key())
    }

    /// Look up the descriptor for a wire key
    pub fn resolve(&self, namespace: Namespace, key: &str) -> Result<&TypeDescriptor> {
        self.table(namespace)
            .by_key
            .get(key)
            .ok_or_else(|| LoggerError::UnknownType {
                namespace,
                key: key.to_string(),
            })
    }

    /// Check that a value's runtime type was declared in the namespace
    pub fn validate(&self, namespace: Namespace, value: &Value) -> Result<()> {
        if self.contains_type_id(namespace, value.payload_type_id()) {
            Ok(())
        } else {
            Err(LoggerError::invalid_type(namespace, value.type_key()))
        }
    }

    pub fn contains<T: 'static>(&self, namespace: Namespace) -> bool {
        self.contains_type_id(namespace, TypeId::of::<T>())
    }

    fn contains_type_id(&self, namespace: Namespace, type_id: TypeId) -> bool {
        self.table(namespace).by_type.contains_key(&type_id)
    }

    /// Registered keys in sorted order
    pub fn keys(&self, namespace: Namespace) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.table(namespace).by_key.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}
