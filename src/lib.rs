//! A logic-less Mustache template engine.
//!
//! A [Template] compiled from source is rendered by navigating in a
//! [Context], getting partials from a [TemplateStore], filters from a
//! [FilterRegistry] and escaping through an [Escaper].
//!
//! Compilation checks the whole template up front and reports a
//! [SyntaxError] with its position. Rendering is deterministic and either
//! returns the whole output or a [RenderError].
//!
//! Besides the core tags (variables, sections, inverted sections,
//! partials, comments and delimiter changes) templates support filters
//! (`{{ name | upper }}`), the `{{% CONTENT_TYPE:TEXT }}` pragma, and
//! template inheritance with `{{< parent }}` and `{{$ block }}`.
//!
//!
//! # Samples
//!
//! ## Hello world
//!
//! ```
//! use stache::{Template, JsonValue};
//!
//! let text = "hello, {{you}}!";
//! let data = r#"{
//!     "you": "world"
//! }"#;
//!
//! let template = Template::from(text).unwrap();
//! let context = serde_json::from_str::<JsonValue>(data).unwrap();
//!
//! let result = template.render(&context).unwrap();
//!
//! assert_eq!(result, "hello, world!")
//! ```
//!
//! ## Hello team
//!
//! ```
//! use stache::{Template, YamlValue};
//! let text = r#"
//!   {{#team}}
//!   hello, {{address}} {{name}}!
//!   {{/team}}
//! "#;
//! let data = r#"
//!   team:
//!     - name: john
//!       address: little
//!     - name: 42
//!       address: citizen
//! "#;
//!
//! let template = Template::from(text).unwrap();
//! let context = serde_yaml::from_str::<YamlValue>(data).unwrap();
//!
//! let result = template.render(&context).unwrap();
//! assert_eq!(result, r#"
//!   hello, little john!
//!   hello, citizen 42!
//! "#);
//! ```
//!
//! ## Text templates and custom delimiters
//!
//! ```
//! use stache::{compile, ContentType, Delimiters, JsonValue};
//!
//! let delimiters = Delimiters::new("<%", "%>").unwrap();
//! let template = compile("echo <% cmd %>", &delimiters, ContentType::Text).unwrap();
//! let context = serde_json::json!({ "cmd": "a > b" });
//!
//! assert_eq!(template.render(&context).unwrap(), "echo a > b");
//! ```
mod config;
mod context;
mod error;
mod escape;
mod expression;
mod filters;
mod json;
mod maps_and_lists;
mod reader;
mod render;
mod template;
mod yaml;

pub use self::config::{Configuration, ContentType, Delimiters};
pub use self::context::{Context, ContextRef, Kind};
pub use self::error::{Error, ExpressionError, Position, RenderError, Result, SyntaxError, SyntaxErrorKind};
pub use self::escape::{html_escape, Escaper, HtmlEscaper};
pub use self::expression::{Argument, Component, Expression, FilterCall};
pub use self::filters::{Filter, FilterRegistry};
pub use self::json::JsonValue;
pub use self::render::{render, Collaborators, MAX_PARTIAL_DEPTH};
pub use self::template::{compile, Node, Template, TemplateMap, TemplateStore, MAX_NESTING_DEPTH};
pub use self::yaml::YamlValue;
