use std::collections::{BTreeMap, HashMap};
use crate::context::{Context, Kind};
use crate::json::JsonValue;


// Context for plain Rust data: maps keyed by strings, lists, scalars and
// options. Mixed data can be built with `Box<dyn Context>` values.


impl<V: Context> Context for HashMap<String, V> {
    fn child(&self, name: &str) -> Option<&dyn Context> {
        self.get(name).map(|it| it as &dyn Context)
    }

    fn children(&self) -> Option<Vec<&dyn Context>> {
        None
    }

    fn kind(&self) -> Kind {
        Kind::Mapping
    }

    fn value(&self) -> String {
        String::new()
    }

    fn to_json(&self) -> Result<JsonValue, String> {
        self.iter()
            .map(|(k, v)| -> Result<_, String> { Ok((k.clone(), v.to_json()?)) })
            .collect::<Result<_, String>>()
            .map(JsonValue::Object)
    }
}

impl<V: Context> Context for BTreeMap<String, V> {
    fn child(&self, name: &str) -> Option<&dyn Context> {
        self.get(name).map(|it| it as &dyn Context)
    }

    fn children(&self) -> Option<Vec<&dyn Context>> {
        None
    }

    fn kind(&self) -> Kind {
        Kind::Mapping
    }

    fn value(&self) -> String {
        String::new()
    }

    fn to_json(&self) -> Result<JsonValue, String> {
        self.iter()
            .map(|(k, v)| -> Result<_, String> { Ok((k.clone(), v.to_json()?)) })
            .collect::<Result<_, String>>()
            .map(JsonValue::Object)
    }
}

impl<V: Context> Context for Vec<V> {
    fn child(&self, _name: &str) -> Option<&dyn Context> {
        None
    }

    fn children(&self) -> Option<Vec<&dyn Context>> {
        Some(self.iter().map(|it| it as &dyn Context).collect())
    }

    fn kind(&self) -> Kind {
        Kind::Sequence
    }

    fn value(&self) -> String {
        self.iter().map(Context::value).collect()
    }

    fn to_json(&self) -> Result<JsonValue, String> {
        self.iter()
            .map(Context::to_json)
            .collect::<Result<_, _>>()
            .map(JsonValue::Array)
    }
}

impl<V: Context> Context for Option<V> {
    fn child(&self, name: &str) -> Option<&dyn Context> {
        self.as_ref()?.child(name)
    }

    fn children(&self) -> Option<Vec<&dyn Context>> {
        self.as_ref()?.children()
    }

    fn kind(&self) -> Kind {
        self.as_ref().map_or(Kind::Null, Context::kind)
    }

    fn value(&self) -> String {
        self.as_ref().map(Context::value).unwrap_or_default()
    }

    fn to_json(&self) -> Result<JsonValue, String> {
        self.as_ref().map_or(Ok(JsonValue::Null), Context::to_json)
    }
}

impl<T: Context + ?Sized> Context for Box<T> {
    fn child(&self, name: &str) -> Option<&dyn Context> {
        (**self).child(name)
    }

    fn children(&self) -> Option<Vec<&dyn Context>> {
        (**self).children()
    }

    fn kind(&self) -> Kind {
        (**self).kind()
    }

    fn value(&self) -> String {
        (**self).value()
    }

    fn to_json(&self) -> Result<JsonValue, String> {
        (**self).to_json()
    }
}

impl Context for str {
    fn child(&self, _name: &str) -> Option<&dyn Context> {
        None
    }

    fn children(&self) -> Option<Vec<&dyn Context>> {
        None
    }

    fn kind(&self) -> Kind {
        Kind::String
    }

    fn value(&self) -> String {
        self.to_owned()
    }

    fn to_json(&self) -> Result<JsonValue, String> {
        Ok(JsonValue::String(self.to_owned()))
    }
}

impl Context for String {
    fn child(&self, _name: &str) -> Option<&dyn Context> {
        None
    }

    fn children(&self) -> Option<Vec<&dyn Context>> {
        None
    }

    fn kind(&self) -> Kind {
        Kind::String
    }

    fn value(&self) -> String {
        self.clone()
    }

    fn to_json(&self) -> Result<JsonValue, String> {
        Ok(JsonValue::String(self.clone()))
    }
}

impl Context for bool {
    fn child(&self, _name: &str) -> Option<&dyn Context> {
        None
    }

    fn children(&self) -> Option<Vec<&dyn Context>> {
        None
    }

    fn kind(&self) -> Kind {
        Kind::Bool(*self)
    }

    fn value(&self) -> String {
        self.to_string()
    }

    fn to_json(&self) -> Result<JsonValue, String> {
        Ok(JsonValue::Bool(*self))
    }
}

macro_rules! number_context {
    ($($ty:ty),*) => {
        $(
            impl Context for $ty {
                fn child(&self, _name: &str) -> Option<&dyn Context> {
                    None
                }

                fn children(&self) -> Option<Vec<&dyn Context>> {
                    None
                }

                fn kind(&self) -> Kind {
                    Kind::Number
                }

                fn value(&self) -> String {
                    self.to_string()
                }

                fn to_json(&self) -> Result<JsonValue, String> {
                    Ok(JsonValue::from(*self))
                }
            }
        )*
    };
}

number_context!(i32, i64, u32, u64, usize, f64);
