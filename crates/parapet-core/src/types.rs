use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A JSON document flowing through the engine.
///
/// Wraps a `serde_json::Value` with the accessors the step interpreters
/// need, most notably dotted-path reads and writes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Payload {
    /// The inner JSON value
    pub value: serde_json::Value,
}

impl Payload {
    /// Create a new payload from a JSON value
    #[inline]
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Create a null payload
    #[inline]
    pub fn null() -> Self {
        Self {
            value: serde_json::Value::Null,
        }
    }

    /// Get the inner JSON value
    #[inline]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.value
    }

    /// Take ownership of the inner JSON value
    #[inline]
    pub fn into_value(self) -> serde_json::Value {
        self.value
    }

    /// Check if the payload is null
    #[inline]
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Try to view the payload as an object
    #[inline]
    pub fn as_object(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.value.as_object()
    }

    /// Try to convert the payload to a specific type
    pub fn to<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(self.value.clone())
    }

    /// Create a payload from a serializable value
    pub fn from<T>(value: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize,
    {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Read a value at a dotted path, e.g. `"finding.severity"`.
    ///
    /// Returns `None` if any segment is missing or a non-object is
    /// traversed.
    pub fn get_path(&self, path: &str) -> Option<&serde_json::Value> {
        let mut current = &self.value;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Write a value at a dotted path, creating intermediate objects.
    ///
    /// Fails if an existing intermediate segment is not an object.
    pub fn set_path(&mut self, path: &str, value: serde_json::Value) -> Result<(), String> {
        if !self.value.is_object() {
            if self.value.is_null() {
                self.value = serde_json::Value::Object(serde_json::Map::new());
            } else {
                return Err("payload root is not an object".to_string());
            }
        }

        let mut current = &mut self.value;
        let segments: Vec<&str> = path.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            let map = current
                .as_object_mut()
                .ok_or_else(|| format!("path segment '{}' is not an object", segments[..i].join(".")))?;

            if i == segments.len() - 1 {
                map.insert(segment.to_string(), value);
                return Ok(());
            }

            current = map
                .entry(segment.to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        }

        Ok(())
    }

    /// Shallow-merge the keys of `other` into the payload root.
    ///
    /// Fails if either side is not an object.
    pub fn merge_object(&mut self, other: &serde_json::Value) -> Result<(), String> {
        let incoming = other
            .as_object()
            .ok_or_else(|| "merge source is not an object".to_string())?;

        if self.value.is_null() {
            self.value = serde_json::Value::Object(serde_json::Map::new());
        }
        let map = self
            .value
            .as_object_mut()
            .ok_or_else(|| "payload root is not an object".to_string())?;

        for (key, value) in incoming {
            map.insert(key.clone(), value.clone());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_creation() {
        let payload = Payload::new(json!({"name": "test"}));
        assert_eq!(payload.as_value()["name"], "test");
    }

    #[test]
    fn test_payload_null() {
        let payload = Payload::null();
        assert!(payload.is_null());
    }

    #[test]
    fn test_get_path_nested() {
        let payload = Payload::new(json!({
            "finding": {"severity": "high", "resource": {"region": "eu-west-1"}}
        }));

        assert_eq!(payload.get_path("finding.severity"), Some(&json!("high")));
        assert_eq!(
            payload.get_path("finding.resource.region"),
            Some(&json!("eu-west-1"))
        );
        assert_eq!(payload.get_path("finding.missing"), None);
        assert_eq!(payload.get_path("finding.severity.deeper"), None);
    }

    #[test]
    fn test_set_path_creates_intermediates() {
        let mut payload = Payload::new(json!({}));
        payload.set_path("a.b.c", json!(42)).unwrap();
        assert_eq!(payload.get_path("a.b.c"), Some(&json!(42)));
    }

    #[test]
    fn test_set_path_rejects_non_object_segment() {
        let mut payload = Payload::new(json!({"a": "scalar"}));
        let result = payload.set_path("a.b", json!(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_set_path_on_null_root() {
        let mut payload = Payload::null();
        payload.set_path("created", json!(true)).unwrap();
        assert_eq!(payload.get_path("created"), Some(&json!(true)));
    }

    #[test]
    fn test_merge_object() {
        let mut payload = Payload::new(json!({"kept": 1, "replaced": "old"}));
        payload
            .merge_object(&json!({"replaced": "new", "added": true}))
            .unwrap();

        assert_eq!(payload.get_path("kept"), Some(&json!(1)));
        assert_eq!(payload.get_path("replaced"), Some(&json!("new")));
        assert_eq!(payload.get_path("added"), Some(&json!(true)));
    }

    #[test]
    fn test_merge_object_rejects_non_object_source() {
        let mut payload = Payload::new(json!({}));
        assert!(payload.merge_object(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_payload_serialization_round_trip() {
        let original = Payload::new(json!({"complex": {"nested": ["array", 123]}}));
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: Payload = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_payload_to_typed() {
        #[derive(Deserialize)]
        struct Finding {
            severity: String,
        }

        let payload = Payload::new(json!({"severity": "low"}));
        let finding: Finding = payload.to().unwrap();
        assert_eq!(finding.severity, "low");
    }
}
