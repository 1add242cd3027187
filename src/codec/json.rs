//! JSON marshaller for human and log-aggregator consumption
//!
//! Writes each entry as a single-line JSON object, compatible with tools
//! like ELK or Loki. The output cannot be read back by a stream decoder:
//! type keys are shortened and payload bytes are inlined as JSON.

use super::envelope::Marshaller;
use crate::core::entry::Entry;
use crate::core::error::{LoggerError, Result};
use crate::core::payload::Value;
use chrono::SecondsFormat;
use serde_json::{Map, Value as JsonValue};

/// Marshals entries to compact (or pretty) JSON objects
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarshaller {
    pretty: bool,
}

impl JsonMarshaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Multi-line output; pair with a framing encoder, not the line path
    pub fn new_pretty() -> Self {
        Self { pretty: true }
    }

    fn to_object(&self, entry: &Entry) -> Result<Map<String, JsonValue>> {
        let mut object = Map::new();
        object.insert("id".into(), entry.id.clone().into());
        object.insert(
            "time".into(),
            entry.time.to_rfc3339_opts(SecondsFormat::Nanos, true).into(),
        );
        object.insert("level".into(), entry.level.to_str().to_lowercase().into());
        object.insert(
            "event_type".into(),
            short_type_name(entry.event.type_key()).into(),
        );

        for context in &entry.contexts {
            insert_value(&mut object, context)?;
        }
        insert_value(&mut object, &entry.event)?;

        if let Some(output) = &entry.writer_output {
            object.insert(
                "writer_output".into(),
                String::from_utf8_lossy(output).into_owned().into(),
            );
        }
        Ok(object)
    }
}

fn insert_value(object: &mut Map<String, JsonValue>, value: &Value) -> Result<()> {
    let json = value.as_payload().to_json()?;
    object.insert(short_type_name(value.type_key()), json);
    Ok(())
}

impl Marshaller for JsonMarshaller {
    fn marshal(&self, entry: &Entry) -> Result<Vec<u8>> {
        let object = JsonValue::Object(self.to_object(entry)?);
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&object)
        } else {
            serde_json::to_vec(&object)
        };
        bytes.map_err(LoggerError::from)
    }
}

/// Strip module paths, keeping generic arguments: `a::Foo<b::Bar>` -> `Foo<Bar>`
pub fn short_type_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut segment = String::new();
    for c in key.chars() {
        match c {
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' => {
                out.push_str(last_path_segment(&segment));
                segment.clear();
                out.push(c);
            }
            _ => segment.push(c),
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
