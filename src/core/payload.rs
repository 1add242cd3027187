//! Open polymorphic payloads carried as contexts and events
//!
//! Any type that can round-trip through serde and compare for equality is a
//! [`Payload`]. A [`Value`] is a shared, type-erased handle to one payload;
//! it remembers the concrete runtime type so that equality, downcasting and
//! wire keys all follow that type.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Object-safe view of a context or event value
///
/// Implemented for every `Serialize + DeserializeOwned + PartialEq + Debug`
/// type; there is nothing to implement by hand.
pub trait Payload: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// Equality that also requires both sides to share a concrete type
    fn dyn_eq(&self, other: &dyn Payload) -> bool;

    /// Textual key for the concrete type: module path plus local name
    ///
    /// Derived from `std::any::type_name`, which is not guaranteed unique or
    /// stable across compiler versions. Registries prefer a descriptor's
    /// explicit key when one was declared.
    fn type_key(&self) -> &'static str;

    /// Inner encoding of this value
    fn encode_payload(&self) -> serde_json::Result<Vec<u8>>;

    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T> Payload for T
where
    T: Serialize + DeserializeOwned + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Payload) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn type_key(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn encode_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Shared handle to a context or event value
#[derive(Clone)]
pub struct Value(Arc<dyn Payload>);

/// A context attached to a logger and inherited by its entries
pub type Context = Value;

/// The payload describing what happened in one entry
pub type Event = Value;

impl Value {
    pub fn new<T: Payload>(value: T) -> Self {
        Value(Arc::new(value))
    }

    pub fn type_key(&self) -> &'static str {
        self.0.type_key()
    }

    /// `TypeId` of the concrete value, not of the handle
    pub fn payload_type_id(&self) -> TypeId {
        self.0.as_any().type_id()
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.payload_type_id() == TypeId::of::<T>()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn as_payload(&self) -> &dyn Payload {
        self.0.as_ref()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(other.0.as_ref())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}
