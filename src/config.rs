use serde::Deserialize;


/// The kind of text a template produces. It selects how escaped variable
/// tags are escaped, and is fixed when the template is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Escaped variables are HTML-escaped.
    #[default]
    Html,
    /// Escaped and unescaped variables render identically.
    Text,
}


/// An open/close tag delimiter pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "(String, String)")]
pub struct Delimiters {
    open: String,
    close: String,
}

impl Delimiters {
    /// Both delimiters must be non-empty and must not contain whitespace
    /// or `=`.
    pub fn new(open: &str, close: &str) -> Option<Self> {
        if is_delimiter(open) && is_delimiter(close) {
            Some(Delimiters {
                open: open.to_owned(),
                close: close.to_owned(),
            })
        } else {
            None
        }
    }

    pub fn open(&self) -> &str {
        &self.open
    }

    pub fn close(&self) -> &str {
        &self.close
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Delimiters {
            open: "{{".to_owned(),
            close: "}}".to_owned(),
        }
    }
}

impl TryFrom<(String, String)> for Delimiters {
    type Error = String;

    fn try_from((open, close): (String, String)) -> Result<Self, Self::Error> {
        Delimiters::new(&open, &close)
            .ok_or_else(|| format!("invalid delimiters `{}` `{}`", open, close))
    }
}

pub(crate) fn is_delimiter(text: &str) -> bool {
    !text.is_empty() && !text.contains(|c: char| c.is_whitespace() || c == '=')
}


/// Compilation settings.
///
/// ```
/// use stache::{Configuration, ContentType};
///
/// let config: Configuration = serde_json::from_str(
///     r#"{ "content_type": "text", "delimiters": ["<%", "%>"] }"#
/// ).unwrap();
/// assert_eq!(config.content_type, ContentType::Text);
/// assert_eq!(config.delimiters.open(), "<%");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub content_type: ContentType,
    pub delimiters: Delimiters,
}

impl Configuration {
    pub fn text() -> Self {
        Configuration {
            content_type: ContentType::Text,
            ..Default::default()
        }
    }
}
