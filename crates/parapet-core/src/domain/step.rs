//! Step definitions and the transform/condition interpreters.
//!
//! A flow's stored config is a raw JSON array; it is parsed into tagged
//! step definitions at execution time so that a bad definition fails the
//! run that hits it with a precise error instead of silently passing data
//! through.

use crate::{domain::integration::IntegrationId, EngineError, Payload};
use serde_json::Value;

/// A parsed step in a flow's ordered step list
#[derive(Debug, Clone, PartialEq)]
pub enum StepDefinition {
    /// Invoke an external integration and merge a provenance marker
    Integration {
        /// Integration to invoke
        integration_id: IntegrationId,
    },
    /// Reshape the payload
    Transform(TransformExpr),
    /// Gate the remaining steps on a predicate over the payload
    Condition(ConditionExpr),
}

impl StepDefinition {
    /// The step kind as it appears in stored config
    pub fn kind(&self) -> &'static str {
        match self {
            StepDefinition::Integration { .. } => "integration",
            StepDefinition::Transform(_) => "transform",
            StepDefinition::Condition(_) => "condition",
        }
    }
}

/// Parse a flow's stored step config.
///
/// `null` or an empty array is the identity flow. An unknown step kind is
/// rejected naming the kind.
pub fn parse_steps(config: &Value) -> Result<Vec<StepDefinition>, EngineError> {
    let entries = match config {
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        other => {
            return Err(EngineError::Validation(format!(
                "Step config must be an array, got {}",
                json_type_name(other)
            )))
        }
    };

    let mut steps = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let object = entry.as_object().ok_or_else(|| {
            EngineError::Validation(format!("Step {} is not an object", index))
        })?;

        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::Validation(format!("Step {} has no type", index)))?;

        let step = match kind {
            "integration" => {
                let integration_id = object
                    .get("integrationId")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        EngineError::Validation(format!(
                            "Integration step {} has no integrationId",
                            index
                        ))
                    })?;
                StepDefinition::Integration {
                    integration_id: IntegrationId(integration_id.to_string()),
                }
            }
            "transform" => {
                let spec = object.get("transform").ok_or_else(|| {
                    EngineError::Validation(format!("Transform step {} has no transform", index))
                })?;
                StepDefinition::Transform(TransformExpr::parse(spec)?)
            }
            "condition" => {
                let spec = object.get("condition").ok_or_else(|| {
                    EngineError::Validation(format!("Condition step {} has no condition", index))
                })?;
                StepDefinition::Condition(ConditionExpr::parse(spec)?)
            }
            other => return Err(EngineError::UnknownStepKind(other.to_string())),
        };

        steps.push(step);
    }

    Ok(steps)
}

/// A payload reshaping operation
#[derive(Debug, Clone, PartialEq)]
pub enum TransformExpr {
    /// Write a literal value at a dotted path
    Set {
        /// Destination path
        path: String,
        /// Literal to write
        value: Value,
    },
    /// Shallow-merge a literal object into the payload root
    Merge {
        /// Object to merge
        value: Value,
    },
    /// Keep only the named top-level fields
    Pick {
        /// Fields to keep
        fields: Vec<String>,
    },
    /// Move a top-level field to a new name
    Rename {
        /// Existing field
        from: String,
        /// New field name
        to: String,
    },
}

impl TransformExpr {
    /// Parse a transform spec of the form `{"op": "...", ...}`
    pub fn parse(spec: &Value) -> Result<Self, EngineError> {
        let object = spec
            .as_object()
            .ok_or_else(|| EngineError::Validation("Transform spec is not an object".to_string()))?;

        let op = object
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::Validation("Transform spec has no op".to_string()))?;

        match op {
            "set" => {
                let path = required_str(object, "path", "set transform")?;
                let value = object.get("value").cloned().unwrap_or(Value::Null);
                Ok(TransformExpr::Set { path, value })
            }
            "merge" => {
                let value = object.get("value").cloned().ok_or_else(|| {
                    EngineError::Validation("merge transform has no value".to_string())
                })?;
                if !value.is_object() {
                    return Err(EngineError::Validation(
                        "merge transform value must be an object".to_string(),
                    ));
                }
                Ok(TransformExpr::Merge { value })
            }
            "pick" => {
                let fields = object
                    .get("fields")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        EngineError::Validation("pick transform has no fields array".to_string())
                    })?
                    .iter()
                    .map(|f| {
                        f.as_str().map(str::to_string).ok_or_else(|| {
                            EngineError::Validation(
                                "pick transform fields must be strings".to_string(),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TransformExpr::Pick { fields })
            }
            "rename" => {
                let from = required_str(object, "from", "rename transform")?;
                let to = required_str(object, "to", "rename transform")?;
                Ok(TransformExpr::Rename { from, to })
            }
            other => Err(EngineError::Validation(format!(
                "Unknown transform op: {}",
                other
            ))),
        }
    }

    /// Apply the transform to a payload, producing the next payload
    pub fn apply(&self, payload: &Payload) -> Result<Payload, String> {
        let mut next = payload.clone();
        match self {
            TransformExpr::Set { path, value } => {
                next.set_path(path, value.clone())?;
            }
            TransformExpr::Merge { value } => {
                next.merge_object(value)?;
            }
            TransformExpr::Pick { fields } => {
                let source = payload
                    .as_object()
                    .ok_or_else(|| "pick requires an object payload".to_string())?;
                let mut kept = serde_json::Map::new();
                for field in fields {
                    if let Some(value) = source.get(field) {
                        kept.insert(field.clone(), value.clone());
                    }
                }
                next = Payload::new(Value::Object(kept));
            }
            TransformExpr::Rename { from, to } => {
                let map = next
                    .value
                    .as_object_mut()
                    .ok_or_else(|| "rename requires an object payload".to_string())?;
                if let Some(value) = map.remove(from) {
                    map.insert(to.clone(), value);
                }
            }
        }
        Ok(next)
    }
}

/// Comparison operator for condition steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Value at path equals the operand
    Eq,
    /// Value at path differs from the operand
    Ne,
    /// Path is present
    Exists,
    /// Numeric greater-than
    Gt,
    /// Numeric less-than
    Lt,
    /// String or array containment
    Contains,
}

/// A predicate over a payload path.
///
/// A false condition short-circuits the remaining steps of the flow; the
/// payload at that point becomes the run's output.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionExpr {
    /// Dotted path into the payload
    pub path: String,
    /// Comparison operator
    pub op: CompareOp,
    /// Right-hand operand, unused for `exists`
    pub value: Value,
}

impl ConditionExpr {
    /// Parse a condition spec of the form `{"path": ..., "op": ..., "value": ...}`
    pub fn parse(spec: &Value) -> Result<Self, EngineError> {
        let object = spec
            .as_object()
            .ok_or_else(|| EngineError::Validation("Condition spec is not an object".to_string()))?;

        let path = required_str(object, "path", "condition")?;
        let op = match required_str(object, "op", "condition")?.as_str() {
            "eq" => CompareOp::Eq,
            "ne" => CompareOp::Ne,
            "exists" => CompareOp::Exists,
            "gt" => CompareOp::Gt,
            "lt" => CompareOp::Lt,
            "contains" => CompareOp::Contains,
            other => {
                return Err(EngineError::Validation(format!(
                    "Unknown condition op: {}",
                    other
                )))
            }
        };
        let value = object.get("value").cloned().unwrap_or(Value::Null);

        Ok(Self { path, op, value })
    }

    /// Evaluate the predicate against a payload
    pub fn evaluate(&self, payload: &Payload) -> Result<bool, String> {
        let target = payload.get_path(&self.path);

        match self.op {
            CompareOp::Exists => Ok(target.is_some()),
            CompareOp::Eq => Ok(target.unwrap_or(&Value::Null) == &self.value),
            CompareOp::Ne => Ok(target.unwrap_or(&Value::Null) != &self.value),
            CompareOp::Gt | CompareOp::Lt => {
                let left = target
                    .and_then(Value::as_f64)
                    .ok_or_else(|| format!("path '{}' is not numeric", self.path))?;
                let right = self
                    .value
                    .as_f64()
                    .ok_or_else(|| "condition operand is not numeric".to_string())?;
                Ok(if self.op == CompareOp::Gt {
                    left > right
                } else {
                    left < right
                })
            }
            CompareOp::Contains => match target {
                None => Ok(false),
                Some(Value::String(haystack)) => {
                    let needle = self
                        .value
                        .as_str()
                        .ok_or_else(|| "contains operand must be a string".to_string())?;
                    Ok(haystack.contains(needle))
                }
                Some(Value::Array(items)) => Ok(items.contains(&self.value)),
                Some(other) => Err(format!(
                    "path '{}' is not a string or array ({})",
                    self.path,
                    json_type_name(other)
                )),
            },
        }
    }
}

fn required_str(
    object: &serde_json::Map<String, Value>,
    key: &str,
    context: &str,
) -> Result<String, EngineError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| EngineError::Validation(format!("{} has no {}", context, key)))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_steps_null_is_identity() {
        assert!(parse_steps(&Value::Null).unwrap().is_empty());
        assert!(parse_steps(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_parse_steps_mixed() {
        let config = json!([
            {"type": "integration", "integrationId": "aws-scanner"},
            {"type": "transform", "transform": {"op": "set", "path": "reviewed", "value": true}},
            {"type": "condition", "condition": {"path": "severity", "op": "eq", "value": "high"}}
        ]);

        let steps = parse_steps(&config).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].kind(), "integration");
        assert_eq!(steps[1].kind(), "transform");
        assert_eq!(steps[2].kind(), "condition");
    }

    #[test]
    fn test_parse_steps_unknown_kind() {
        let config = json!([{"type": "teleport"}]);
        let result = parse_steps(&config);

        match result {
            Err(EngineError::UnknownStepKind(kind)) => assert_eq!(kind, "teleport"),
            other => panic!("Expected UnknownStepKind, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_steps_rejects_non_array() {
        assert!(matches!(
            parse_steps(&json!({"type": "transform"})),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            parse_steps(&json!([42])),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_transform_set() {
        let expr = TransformExpr::parse(&json!({"op": "set", "path": "meta.tag", "value": "seen"}))
            .unwrap();
        let out = expr.apply(&Payload::new(json!({"id": 1}))).unwrap();

        assert_eq!(out.get_path("meta.tag"), Some(&json!("seen")));
        assert_eq!(out.get_path("id"), Some(&json!(1)));
    }

    #[test]
    fn test_transform_merge() {
        let expr =
            TransformExpr::parse(&json!({"op": "merge", "value": {"source": "scanner"}})).unwrap();
        let out = expr.apply(&Payload::new(json!({"id": 1}))).unwrap();

        assert_eq!(out.get_path("source"), Some(&json!("scanner")));
    }

    #[test]
    fn test_transform_merge_rejects_scalar_value() {
        assert!(matches!(
            TransformExpr::parse(&json!({"op": "merge", "value": 7})),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn test_transform_pick() {
        let expr = TransformExpr::parse(&json!({"op": "pick", "fields": ["id", "severity"]}))
            .unwrap();
        let out = expr
            .apply(&Payload::new(json!({"id": 1, "severity": "low", "noise": true})))
            .unwrap();

        assert_eq!(out.as_value(), &json!({"id": 1, "severity": "low"}));
    }

    #[test]
    fn test_transform_rename() {
        let expr = TransformExpr::parse(&json!({"op": "rename", "from": "sev", "to": "severity"}))
            .unwrap();
        let out = expr.apply(&Payload::new(json!({"sev": "high"}))).unwrap();

        assert_eq!(out.as_value(), &json!({"severity": "high"}));
    }

    #[test]
    fn test_transform_unknown_op_is_rejected() {
        let result = TransformExpr::parse(&json!({"op": "jq", "expr": ".foo"}));
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_condition_eq_and_ne() {
        let payload = Payload::new(json!({"severity": "high"}));

        let eq = ConditionExpr::parse(&json!({"path": "severity", "op": "eq", "value": "high"}))
            .unwrap();
        assert!(eq.evaluate(&payload).unwrap());

        let ne = ConditionExpr::parse(&json!({"path": "severity", "op": "ne", "value": "low"}))
            .unwrap();
        assert!(ne.evaluate(&payload).unwrap());
    }

    #[test]
    fn test_condition_missing_path_compares_as_null() {
        let payload = Payload::new(json!({}));

        let eq = ConditionExpr::parse(&json!({"path": "absent", "op": "eq", "value": null}))
            .unwrap();
        assert!(eq.evaluate(&payload).unwrap());

        let exists =
            ConditionExpr::parse(&json!({"path": "absent", "op": "exists"})).unwrap();
        assert!(!exists.evaluate(&payload).unwrap());
    }

    #[test]
    fn test_condition_numeric_comparisons() {
        let payload = Payload::new(json!({"score": 7.5}));

        let gt = ConditionExpr::parse(&json!({"path": "score", "op": "gt", "value": 5})).unwrap();
        assert!(gt.evaluate(&payload).unwrap());

        let lt = ConditionExpr::parse(&json!({"path": "score", "op": "lt", "value": 5})).unwrap();
        assert!(!lt.evaluate(&payload).unwrap());

        let bad = ConditionExpr::parse(&json!({"path": "missing", "op": "gt", "value": 5}))
            .unwrap();
        assert!(bad.evaluate(&payload).is_err());
    }

    #[test]
    fn test_condition_contains() {
        let payload = Payload::new(json!({
            "message": "public bucket detected",
            "tags": ["s3", "public"]
        }));

        let in_string = ConditionExpr::parse(
            &json!({"path": "message", "op": "contains", "value": "bucket"}),
        )
        .unwrap();
        assert!(in_string.evaluate(&payload).unwrap());

        let in_array =
            ConditionExpr::parse(&json!({"path": "tags", "op": "contains", "value": "public"}))
                .unwrap();
        assert!(in_array.evaluate(&payload).unwrap());

        let missing =
            ConditionExpr::parse(&json!({"path": "nope", "op": "contains", "value": "x"}))
                .unwrap();
        assert!(!missing.evaluate(&payload).unwrap());
    }

    #[test]
    fn test_condition_unknown_op_is_rejected() {
        let result = ConditionExpr::parse(&json!({"path": "x", "op": "matches", "value": ".*"}));
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }
}
