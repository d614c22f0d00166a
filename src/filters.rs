use std::collections::HashMap;
use std::fmt;
use crate::json::JsonValue;


/// A named value transformation applied with `{{ value | name: args }}`.
///
/// The first parameter is the piped value (`null` when the expression is
/// undefined), followed by the tag's arguments. Returning `Err` aborts the
/// render with [`RenderError::Filter`](crate::RenderError::Filter).
///
/// Closures with the matching signature are filters:
///
/// ```
/// use stache::{FilterRegistry, JsonValue};
///
/// let mut filters = FilterRegistry::new();
/// filters.add("len", |value: &JsonValue, _args: &[JsonValue]| {
///     match value {
///         JsonValue::Array(items) => Ok(JsonValue::from(items.len())),
///         JsonValue::String(s) => Ok(JsonValue::from(s.chars().count())),
///         _ => Err("expected a list or a string".to_owned()),
///     }
/// });
/// assert!(filters.get("len").is_some());
/// ```
pub trait Filter: Send + Sync {
    fn apply(&self, value: &JsonValue, args: &[JsonValue]) -> Result<JsonValue, String>;
}

impl<F> Filter for F
where
    F: Fn(&JsonValue, &[JsonValue]) -> Result<JsonValue, String> + Send + Sync,
{
    fn apply(&self, value: &JsonValue, args: &[JsonValue]) -> Result<JsonValue, String> {
        self(value, args)
    }
}


/// Filters available to templates, by name.
#[derive(Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Box<dyn Filter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        FilterRegistry { filters: HashMap::new() }
    }

    /// Registers a filter, replacing any previous one with the same name.
    pub fn add<F: Filter + 'static>(&mut self, name: &str, filter: F) -> &mut Self {
        self.filters.insert(name.to_owned(), Box::new(filter));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Filter> {
        self.filters.get(name).map(|it| it.as_ref())
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.filters.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("FilterRegistry").field("filters", &names).finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn closures_are_filters() {
        let mut filters = FilterRegistry::new();
        filters.add("first", |value: &JsonValue, _: &[JsonValue]| -> Result<JsonValue, String> {
            Ok(value.get(0).cloned().unwrap_or(JsonValue::Null))
        });
        let first = filters.get("first").unwrap();
        assert_eq!(first.apply(&json!([3, 4]), &[]), Ok(json!(3)));
        assert!(filters.get("last").is_none());
    }

    #[test]
    fn registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FilterRegistry>();
    }
}
