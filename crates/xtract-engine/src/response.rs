//! Aggregated response for one request

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::field::FieldResult;
use crate::templates::RESERVED_FIELD;

/// Resolved text for every template field, tagged with the request identifier.
///
/// Serializes as a flat object: one key per field in template order, then
/// `request_id`. The run id stays out of the body; callers report it alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResponse {
    run_id: Uuid,
    request_id: Value,
    fields: Vec<FieldResult>,
}

impl ExtractionResponse {
    pub fn new(run_id: Uuid, request_id: Value, fields: Vec<FieldResult>) -> Self {
        Self {
            run_id,
            request_id,
            fields,
        }
    }

    /// Run that produced this response; matches `parent_run_id` in invocation logs
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub fn request_id(&self) -> &Value {
        &self.request_id
    }

    /// Resolved text for `field`
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|result| result.field == field)
            .map(|result| result.resolved.as_str())
    }

    /// Number of fields that needed the resolution model
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.fields.iter().filter(|f| f.was_resolved()).count()
    }

    /// Flat JSON object form
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::with_capacity(self.fields.len() + 1);
        for result in &self.fields {
            map.insert(result.field.clone(), Value::String(result.resolved.clone()));
        }
        map.insert(RESERVED_FIELD.to_string(), self.request_id.clone());
        Value::Object(map)
    }
}

impl Serialize for ExtractionResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for result in &self.fields {
            map.serialize_entry(&result.field, &result.resolved)?;
        }
        map.serialize_entry(RESERVED_FIELD, &self.request_id)?;
        map.end()
    }
}
