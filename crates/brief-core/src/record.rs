//! The `BriefRecord` value: one flat snapshot of the form.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::field::{Cardinality, Field};
use crate::RecordError;

/// A field value, shaped by the field's declared cardinality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn empty(cardinality: Cardinality) -> Self {
        match cardinality {
            Cardinality::Scalar => FieldValue::Scalar(String::new()),
            Cardinality::Multi => FieldValue::List(Vec::new()),
        }
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Scalar(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    /// Flatten to text, joining list items with `sep`.
    pub fn join(&self, sep: &str) -> String {
        match self {
            FieldValue::Scalar(s) => s.clone(),
            FieldValue::List(items) => items.join(sep),
        }
    }

    /// Reshape to `cardinality`: a scalar becomes a singleton list (or the
    /// empty list when blank), a list becomes its items joined with `", "`.
    fn coerce(self, cardinality: Cardinality) -> Self {
        match (self, cardinality) {
            (FieldValue::Scalar(s), Cardinality::Multi) if s.is_empty() => FieldValue::List(Vec::new()),
            (FieldValue::Scalar(s), Cardinality::Multi) => FieldValue::List(vec![s]),
            (FieldValue::List(items), Cardinality::Scalar) => FieldValue::Scalar(items.join(", ")),
            (value, _) => value,
        }
    }

    fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) => FieldValue::List(items.into_iter().map(scalar_text).collect()),
            other => FieldValue::Scalar(scalar_text(other)),
        }
    }
}

fn scalar_text(value: Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Bool(true) => "true".to_string(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Scalar(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Scalar(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        FieldValue::list(items)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Scalar(s) => serializer.serialize_str(s),
            FieldValue::List(items) => items.serialize(serializer),
        }
    }
}

/// One brief: every registry field, always present, never nested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BriefRecord {
    values: Vec<FieldValue>,
}

impl Default for BriefRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl BriefRecord {
    /// A blank record: empty strings and empty lists.
    pub fn new() -> Self {
        Self {
            values: Field::ALL.iter().map(|f| FieldValue::empty(f.cardinality())).collect(),
        }
    }

    pub fn get(&self, field: Field) -> &FieldValue {
        &self.values[field.index()]
    }

    /// Scalar text of `field`; empty for multi-value fields.
    pub fn text(&self, field: Field) -> &str {
        match self.get(field) {
            FieldValue::Scalar(s) => s,
            FieldValue::List(_) => "",
        }
    }

    /// Items of a multi-value field; empty for scalars.
    pub fn items(&self, field: Field) -> &[String] {
        match self.get(field) {
            FieldValue::List(items) => items,
            FieldValue::Scalar(_) => &[],
        }
    }

    /// Set a value, reshaped to the field's cardinality.
    pub fn set(&mut self, field: Field, value: impl Into<FieldValue>) {
        self.values[field.index()] = value.into().coerce(field.cardinality());
    }

    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Fields paired with their values, in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        Field::ALL.iter().copied().zip(self.values.iter())
    }

    /// Whether a flag-like field is set (`true`, `on`, `yes`, `si`, `1`).
    pub fn is_truthy(&self, field: Field) -> bool {
        matches!(
            self.text(field).trim().to_ascii_lowercase().as_str(),
            "true" | "on" | "yes" | "si" | "sí" | "1"
        )
    }

    /// Build from parsed JSON. Unknown keys are dropped and missing keys backfilled.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut record = Self::new();
        for (key, value) in map {
            match Field::from_name(&key) {
                Some(field) => record.set(field, FieldValue::from_json(value)),
                None => debug!(key = %key, "ignoring unknown brief field"),
            }
        }
        record
    }

    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            Value::Array(_) => Err(RecordError::NotAnObject("array")),
            Value::String(_) => Err(RecordError::NotAnObject("string")),
            Value::Number(_) => Err(RecordError::NotAnObject("number")),
            Value::Bool(_) => Err(RecordError::NotAnObject("boolean")),
            Value::Null => Err(RecordError::NotAnObject("null")),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, RecordError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn to_value(&self) -> Value {
        let map = self
            .iter()
            .map(|(field, value)| {
                let json = match value {
                    FieldValue::Scalar(s) => Value::String(s.clone()),
                    FieldValue::List(items) => {
                        Value::Array(items.iter().cloned().map(Value::String).collect())
                    }
                };
                (field.name().to_string(), json)
            })
            .collect();
        Value::Object(map)
    }
}

impl Serialize for BriefRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.name(), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BriefRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_map(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_record_has_every_field() {
        let record = BriefRecord::new();
        let value = record.to_value();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), Field::ALL.len());
        assert_eq!(obj["objetivos"], json!([]));
        assert_eq!(obj["clienteNombre"], json!(""));
    }

    #[test]
    fn json_keeps_registry_order() {
        let text = serde_json::to_string(&BriefRecord::new()).unwrap();
        let first = text.find("clienteNombre").unwrap();
        let last = text.find("emailCopia").unwrap();
        assert!(first < last);
    }

    #[test]
    fn missing_and_unknown_keys() {
        let record = BriefRecord::from_json(r#"{"clienteNombre":"Acme","extra":"x"}"#).unwrap();
        assert_eq!(record.text(Field::ClienteNombre), "Acme");
        assert_eq!(record.text(Field::Audiencia), "");
        assert!(record.items(Field::Funciones).is_empty());
        assert!(!record.to_value().as_object().unwrap().contains_key("extra"));
    }

    #[test]
    fn lenient_shapes() {
        let record = BriefRecord::from_value(json!({
            "objetivos": "Leads",
            "estilo": "",
            "idiomas": ["es", "en"],
            "consentCorreo": true,
            "presupuesto": 1500,
            "comentarios": null,
        }))
        .unwrap();
        assert_eq!(record.items(Field::Objetivos), ["Leads"]);
        assert!(record.items(Field::Estilo).is_empty());
        assert_eq!(record.text(Field::Idiomas), "es, en");
        assert_eq!(record.text(Field::ConsentCorreo), "true");
        assert!(record.is_truthy(Field::ConsentCorreo));
        assert_eq!(record.text(Field::Presupuesto), "1500");
        assert_eq!(record.text(Field::Comentarios), "");
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(
            BriefRecord::from_json("[1,2]"),
            Err(RecordError::NotAnObject("array"))
        ));
        assert!(matches!(BriefRecord::from_json("{oops"), Err(RecordError::Json(_))));
    }

    #[test]
    fn set_coerces_to_cardinality() {
        let record = BriefRecord::new()
            .with(Field::Funciones, "Blog")
            .with(Field::Kpi, vec!["a", "b"]);
        assert_eq!(record.items(Field::Funciones), ["Blog"]);
        assert_eq!(record.text(Field::Kpi), "a, b");
    }
}
