//! A single station record as returned by the provider, before normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Untyped JSON object from the Open Data Hub `flat` API.
///
/// Kept untyped so that one record with a missing or mistyped field can be skipped
/// without failing the deserialization of the whole page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Value);

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Looks up a nested field, e.g. `&["smetadata", "capacity"]`.
    ///
    /// JSON `null` is treated the same as an absent field.
    pub fn field(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.0, |value, key| value.get(key))
            .filter(|value| !value.is_null())
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
