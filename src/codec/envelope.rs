//! Self-describing entry envelope
//!
//! [`EntryCodec`] turns an [`Entry`] into bytes that carry every context and
//! the event next to the wire key of its concrete type, and rebuilds the
//! entry from those bytes with nothing but a [`TypeRegistry`].
//!
//! Layout: a compact JSON document
//!
//! ```text
//! {"id":..,"time_unix_nanos":..,"level":0-5,
//!  "contexts":[{"type":key,"payload":b64},..],
//!  "event":{"type":key,"payload":b64},
//!  "writer_output":b64|null}
//! ```
//!
//! armoured as standard padded base64. The armour guarantees the output
//! never contains the frame separator, and [`EntryCodec::marshal`] checks it.

use crate::core::entry::Entry;
use crate::core::error::{LoggerError, Result};
use crate::core::level::Level;
use crate::core::payload::Value;
use crate::core::registry::{Namespace, TypeRegistry};
use crate::core::specification::Specification;
use crate::codec::frame::FRAME_SEPARATOR;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Turns entries into bytes for a sink
pub trait Marshaller: Send + Sync {
    fn marshal(&self, entry: &Entry) -> Result<Vec<u8>>;
}

/// Rebuilds entries from marshalled bytes
pub trait Unmarshaller: Send + Sync {
    fn unmarshal(&self, bytes: &[u8]) -> Result<Entry>;
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePayload {
    #[serde(rename = "type")]
    type_key: String,
    payload: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEntry {
    id: String,
    time_unix_nanos: i64,
    level: u8,
    contexts: Vec<WirePayload>,
    event: WirePayload,
    writer_output: Option<String>,
}

/// The only marshaller whose output can be read back
#[derive(Debug, Clone)]
pub struct EntryCodec {
    registry: TypeRegistry,
}

impl EntryCodec {
    pub fn new(registry: TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn from_specification(specification: &Specification) -> Result<Self> {
        Ok(Self::new(TypeRegistry::new(specification)?))
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn encode_value(&self, namespace: Namespace, value: &Value) -> Result<WirePayload> {
        let type_key = self.registry.key_of(namespace, value);
        let bytes = value.as_payload().encode_payload().map_err(|e| {
            LoggerError::envelope(format!("cannot encode {} payload: {}", type_key, e))
        })?;
        Ok(WirePayload {
            type_key: type_key.to_string(),
            payload: STANDARD.encode(bytes),
        })
    }

    fn decode_value(&self, namespace: Namespace, wire: &WirePayload) -> Result<Value> {
        let descriptor = self.registry.resolve(namespace, &wire.type_key)?;
        let bytes = STANDARD.decode(&wire.payload)?;
        descriptor.decode(&bytes)
    }
}

impl Marshaller for EntryCodec {
    fn marshal(&self, entry: &Entry) -> Result<Vec<u8>> {
        let time_unix_nanos = entry.time.timestamp_nanos_opt().ok_or_else(|| {
            LoggerError::envelope(format!("time {} is outside the nanosecond range", entry.time))
        })?;
        let contexts = entry
            .contexts
            .iter()
            .map(|context| self.encode_value(Namespace::Context, context))
            .collect::<Result<Vec<_>>>()?;
        let wire = WireEntry {
            id: entry.id.clone(),
            time_unix_nanos,
            level: entry.level.as_u8(),
            contexts,
            event: self.encode_value(Namespace::Event, &entry.event)?,
            writer_output: entry.writer_output.as_ref().map(|out| STANDARD.encode(out)),
        };

        let armoured = STANDARD.encode(serde_json::to_vec(&wire)?).into_bytes();
        ensure_separator_free(&armoured)?;
        Ok(armoured)
    }
}

impl Unmarshaller for EntryCodec {
    fn unmarshal(&self, bytes: &[u8]) -> Result<Entry> {
        let json = STANDARD.decode(bytes)?;
        let wire: WireEntry = serde_json::from_slice(&json)
            .map_err(|e| LoggerError::envelope(e.to_string()))?;

        let contexts = wire
            .contexts
            .iter()
            .map(|context| self.decode_value(Namespace::Context, context))
            .collect::<Result<Vec<_>>>()?;
        let writer_output = wire
            .writer_output
            .as_deref()
            .map(|out| STANDARD.decode(out))
            .transpose()?;

        Ok(Entry {
            id: wire.id,
            time: Utc.timestamp_nanos(wire.time_unix_nanos),
            level: Level::try_from(wire.level)?,
            contexts,
            event: self.decode_value(Namespace::Event, &wire.event)?,
            writer_output,
        })
    }
}

/// Marshalled entries must never contain the frame separator
pub fn ensure_separator_free(bytes: &[u8]) -> Result<()> {
    match bytes.iter().position(|&b| b == FRAME_SEPARATOR) {
        Some(offset) => Err(LoggerError::envelope(format!(
            "marshalled entry contains the frame separator at offset {}",
            offset
        ))),
        None => Ok(()),
    }
}
