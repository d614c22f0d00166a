use crate::context::{Context, Kind};
use crate::json::JsonValue;
use serde_json::Number as JsonNumber;
use serde_yaml::Number as YamlNumber;
pub use serde_yaml::Value as YamlValue;


impl Context for YamlValue {
    fn child(&self, name: &str) -> Option<&dyn Context> {
        match self {
            YamlValue::Mapping(_) => self.get(name).map(
                |value| value as &dyn Context
            ),
            YamlValue::Tagged(tagged) => tagged.value.child(name),
            _ => None
        }
    }

    fn children(&self) -> Option<Vec<&dyn Context>> {
        match self {
            YamlValue::Sequence(seq) =>
                Some(
                    seq.iter()
                        .map(|value| value as &dyn Context)
                        .collect::<_>()
                ),
            YamlValue::Tagged(tagged) => tagged.value.children(),
            _ => None
        }
    }

    fn kind(&self) -> Kind {
        match self {
            YamlValue::Null => Kind::Null,
            YamlValue::Bool(b) => Kind::Bool(*b),
            YamlValue::Number(_) => Kind::Number,
            YamlValue::String(_) => Kind::String,
            YamlValue::Sequence(_) => Kind::Sequence,
            YamlValue::Mapping(_) => Kind::Mapping,
            YamlValue::Tagged(tagged) => tagged.value.kind(),
        }
    }

    fn value(&self) -> String {
        match self {
            YamlValue::String(s) => s.clone(),
            YamlValue::Number(n) => n.to_string(),
            YamlValue::Bool(b) => b.to_string(),
            YamlValue::Sequence(seq) => seq.iter().map(Context::value).collect(),
            YamlValue::Tagged(tagged) => tagged.value.value(),
            YamlValue::Null | YamlValue::Mapping(_) => String::new(),
        }
    }

    fn to_json(&self) -> Result<JsonValue, String> {
        Ok(match self {
            YamlValue::Null => JsonValue::Null,
            YamlValue::Bool(b) => JsonValue::Bool(*b),
            YamlValue::Number(n) => number_to_json(n)?,
            YamlValue::String(s) => JsonValue::String(s.clone()),
            YamlValue::Sequence(seq) => JsonValue::Array(
                seq.iter().map(Context::to_json).collect::<Result<_, _>>()?
            ),
            YamlValue::Mapping(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| -> Result<_, String> { Ok((key_to_string(k)?, v.to_json()?)) })
                    .collect::<Result<_, String>>()?
            ),
            YamlValue::Tagged(tagged) => tagged.value.to_json()?,
        })
    }
}

fn number_to_json(n: &YamlNumber) -> Result<JsonValue, String> {
    if let Some(i) = n.as_i64() {
        Ok(JsonValue::from(i))
    } else if let Some(u) = n.as_u64() {
        Ok(JsonValue::from(u))
    } else {
        n.as_f64()
            .and_then(JsonNumber::from_f64)
            .map(JsonValue::Number)
            .ok_or_else(|| format!("number `{}` has no JSON counterpart", n))
    }
}

// scalar keys are stringified the way variable tags render them
fn key_to_string(key: &YamlValue) -> Result<String, String> {
    match key {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Bool(_) | YamlValue::Number(_) => Ok(key.value()),
        YamlValue::Tagged(tagged) => key_to_string(&tagged.value),
        YamlValue::Null | YamlValue::Sequence(_) | YamlValue::Mapping(_) => Err(format!(
            "mapping key `{}` has no JSON counterpart",
            serde_yaml::to_string(key).unwrap_or_default().trim_end()
        )),
    }
}
