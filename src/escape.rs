use crate::config::ContentType;


/// Escapes the text of escaped variable tags.
///
/// The renderer passes the content type of the template that owns the
/// tag, so a text partial included from an HTML template is not escaped.
pub trait Escaper {
    fn escape(&self, value: &str, content_type: ContentType) -> String;
}

/// HTML-escapes `& < > " '` in HTML templates, leaves text templates alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEscaper;

impl Escaper for HtmlEscaper {
    fn escape(&self, value: &str, content_type: ContentType) -> String {
        match content_type {
            ContentType::Html => html_escape(value),
            ContentType::Text => value.to_owned(),
        }
    }
}

impl<F> Escaper for F
where
    F: Fn(&str, ContentType) -> String,
{
    fn escape(&self, value: &str, content_type: ContentType) -> String {
        self(value, content_type)
    }
}

pub fn html_escape(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}
