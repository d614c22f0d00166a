use crate::context::{Context, Kind};
pub use serde_json::Value as JsonValue;


impl Context for JsonValue {
    fn child(&self, name: &str) -> Option<&dyn Context> {
        self.as_object()?
            .get(name)
            .map(|value| value as &dyn Context)
    }

    fn children(&self) -> Option<Vec<&dyn Context>> {
        match self {
            JsonValue::Array(seq) =>
                Some(
                    seq.iter()
                        .map(|value| value as &dyn Context)
                        .collect::<_>()
                ),
            _ => None
        }
    }

    fn kind(&self) -> Kind {
        match self {
            JsonValue::Null => Kind::Null,
            JsonValue::Bool(b) => Kind::Bool(*b),
            JsonValue::Number(_) => Kind::Number,
            JsonValue::String(_) => Kind::String,
            JsonValue::Array(_) => Kind::Sequence,
            JsonValue::Object(_) => Kind::Mapping,
        }
    }

    fn value(&self) -> String {
        match self {
            JsonValue::String(s) => s.clone(),
            JsonValue::Number(n) => n.to_string(),
            JsonValue::Bool(b) => b.to_string(),
            JsonValue::Array(seq) => seq.iter().map(Context::value).collect(),
            JsonValue::Null | JsonValue::Object(_) => String::new(),
        }
    }

    fn to_json(&self) -> Result<JsonValue, String> {
        Ok(self.clone())
    }
}
