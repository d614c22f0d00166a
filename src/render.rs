use std::collections::HashMap;
use crate::config::ContentType;
use crate::context::{Context, Data, Kind, Stack};
use crate::error::{Position, RenderError};
use crate::escape::{Escaper, HtmlEscaper};
use crate::expression::{Argument, Expression};
use crate::filters::FilterRegistry;
use crate::json::JsonValue;
use crate::template::{Node, Template, TemplateStore, MAX_NESTING_DEPTH};


/// How deep partials and parents may nest before rendering gives up.
/// Cyclic inclusions hit this limit instead of exhausting the stack.
pub const MAX_PARTIAL_DEPTH: usize = 64;


/// What the renderer calls out to: partial lookup, filters and escaping.
///
/// ```
/// use stache::{Collaborators, FilterRegistry, JsonValue, Template, TemplateMap};
/// use serde_json::json;
///
/// let mut partials = TemplateMap::new();
/// partials.load("user", "<b>{{name | shout}}</b>").unwrap();
/// let mut filters = FilterRegistry::new();
/// filters.add("shout", |value: &JsonValue, _: &[JsonValue]| -> Result<JsonValue, String> {
///     Ok(JsonValue::from(value.as_str().unwrap_or_default().to_uppercase()))
/// });
///
/// let collaborators = Collaborators::default()
///     .with_partials(&partials)
///     .with_filters(&filters);
/// let template = Template::from("{{#users}}{{> user}}{{/users}}").unwrap();
/// let data = json!({ "users": [{ "name": "ann" }, { "name": "bob" }] });
/// let result = template.render_with(&data, &collaborators).unwrap();
/// assert_eq!(result, "<b>ANN</b><b>BOB</b>");
/// ```
#[derive(Clone, Copy)]
pub struct Collaborators<'c> {
    partials: Option<&'c dyn TemplateStore>,
    filters: Option<&'c FilterRegistry>,
    escaper: &'c dyn Escaper,
}

impl<'c> Collaborators<'c> {
    pub fn with_partials(mut self, partials: &'c dyn TemplateStore) -> Self {
        self.partials = Some(partials);
        self
    }

    pub fn with_filters(mut self, filters: &'c FilterRegistry) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_escaper(mut self, escaper: &'c dyn Escaper) -> Self {
        self.escaper = escaper;
        self
    }
}

impl Default for Collaborators<'_> {
    fn default() -> Self {
        Collaborators {
            partials: None,
            filters: None,
            escaper: &HtmlEscaper,
        }
    }
}


/// Renders `template` against `context`.
///
/// The output is only returned when the whole template rendered.
pub fn render<'r>(
    template: &'r Template,
    context: &'r dyn Context,
    collaborators: &'r Collaborators<'r>,
) -> Result<String, RenderError> {
    log::debug!("rendering {:?} template", template.content_type());
    let renderer = Renderer { collaborators };
    let stack = Stack::new(Data::Borrowed(context));
    let frame = Frame {
        content_type: template.content_type(),
        depth: 0,
        nesting: 0,
        blocks: &HashMap::new(),
    };
    let mut out = Output::new();
    renderer.render_nodes(template.nodes(), frame, &stack, &mut out)?;
    Ok(out.buffer)
}


/// Block overrides in effect, with the content type of the template that
/// defined each of them.
type Blocks<'r> = HashMap<&'r str, (&'r [Node], ContentType)>;

/// `depth` counts partials and parents, `nesting` counts every level the
/// renderer descends into, partials and parents included.
#[derive(Clone, Copy)]
struct Frame<'r, 'b> {
    content_type: ContentType,
    depth: usize,
    nesting: usize,
    blocks: &'b Blocks<'r>,
}

impl<'r, 'b> Frame<'r, 'b> {
    fn nested(self, position: Position) -> Result<Self, RenderError> {
        if self.nesting >= MAX_NESTING_DEPTH {
            return Err(RenderError::NestingLimitExceeded {
                depth: self.nesting,
                position,
            });
        }
        Ok(Frame { nesting: self.nesting + 1, ..self })
    }
}

struct Renderer<'r> {
    collaborators: &'r Collaborators<'r>,
}

impl<'r> Renderer<'r> {
    fn render_nodes(
        &self, nodes: &'r [Node], frame: Frame<'r, '_>, stack: &Stack<'_, 'r>, out: &mut Output
    ) -> Result<(), RenderError> {
        for node in nodes {
            self.render_node(node, frame, stack, out)?;
        }
        Ok(())
    }

    fn render_node(
        &self, node: &'r Node, frame: Frame<'r, '_>, stack: &Stack<'_, 'r>, out: &mut Output
    ) -> Result<(), RenderError> {
        match node {
            Node::Text(text) => out.write_text(text),
            Node::Variable { expression, escaped, position } => {
                let text = self
                    .evaluate(expression, stack, *position)?
                    .map(|value| value.get().value())
                    .unwrap_or_default();
                if *escaped {
                    out.write_value(&self.collaborators.escaper.escape(&text, frame.content_type));
                } else {
                    out.write_value(&text);
                }
            }
            Node::Section { expression, inverted, nodes, position } => {
                let value = self.evaluate(expression, stack, *position)?;
                let frame = frame.nested(*position)?;
                match (Truth::of(value), *inverted) {
                    (Truth::Falsy, true) | (Truth::True, false) => {
                        self.render_nodes(nodes, frame, stack, out)?
                    }
                    (Truth::Sequence(items), true) if items.is_empty() => {
                        self.render_nodes(nodes, frame, stack, out)?
                    }
                    (Truth::Sequence(items), false) => {
                        for item in items {
                            let stack = stack.push(item);
                            self.render_nodes(nodes, frame, &stack, out)?;
                        }
                    }
                    (Truth::Other(value), false) => {
                        let stack = stack.push(value);
                        self.render_nodes(nodes, frame, &stack, out)?;
                    }
                    _ => {}
                }
            }
            Node::Partial { name, indent, position } => {
                let template = self.lookup(name, frame.depth, *position)?;
                let frame = frame.nested(*position)?;
                let frame = Frame {
                    content_type: template.content_type(),
                    depth: frame.depth + 1,
                    ..frame
                };
                out.indented(indent, |out| self.render_nodes(template.nodes(), frame, stack, out))?;
            }
            Node::Block { name, nodes, position } => {
                let frame = frame.nested(*position)?;
                match frame.blocks.get(name.as_str()) {
                    Some(&(overriding, content_type)) => {
                        let frame = Frame { content_type, ..frame };
                        self.render_nodes(overriding, frame, stack, out)?;
                    }
                    None => self.render_nodes(nodes, frame, stack, out)?,
                }
            }
            Node::Parent { name, indent, overrides, position } => {
                let template = self.lookup(name, frame.depth, *position)?;
                let mut blocks = Blocks::new();
                for node in overrides {
                    if let Node::Block { name, nodes, .. } = node {
                        blocks.insert(name.as_str(), (nodes.as_slice(), frame.content_type));
                    }
                }
                // overrides from enclosing parents win
                blocks.extend(frame.blocks.iter().map(|(name, block)| (*name, *block)));
                let frame = frame.nested(*position)?;
                let frame = Frame {
                    content_type: template.content_type(),
                    depth: frame.depth + 1,
                    nesting: frame.nesting,
                    blocks: &blocks,
                };
                out.indented(indent, |out| self.render_nodes(template.nodes(), frame, stack, out))?;
            }
        }
        Ok(())
    }

    fn lookup(&self, name: &str, depth: usize, position: Position) -> Result<&'r Template, RenderError> {
        if depth >= MAX_PARTIAL_DEPTH {
            return Err(RenderError::RecursionLimitExceeded {
                name: name.to_owned(),
                depth,
                position,
            });
        }
        log::trace!("looking up partial `{}`", name);
        self.collaborators
            .partials
            .and_then(|store| store.get(name))
            .ok_or_else(|| RenderError::PartialNotFound {
                name: name.to_owned(),
                position,
            })
    }

    fn evaluate(
        &self, expression: &Expression, stack: &Stack<'_, 'r>, position: Position
    ) -> Result<Option<Data<'r>>, RenderError> {
        let mut value = stack.resolve(&expression.path);
        for call in &expression.filters {
            let filter = self
                .collaborators
                .filters
                .and_then(|filters| filters.get(&call.name))
                .ok_or_else(|| RenderError::UnknownFilter {
                    name: call.name.clone(),
                    position,
                })?;
            let failed = |message: String| RenderError::Filter {
                name: call.name.clone(),
                message,
                position,
            };
            let args = call.args
                .iter()
                .map(|arg| match arg {
                    Argument::Literal(literal) => Ok(literal.clone()),
                    Argument::Path(path) => to_json(stack.resolve(path)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(&failed)?;
            let input = to_json(value).map_err(&failed)?;
            let result = filter.apply(&input, &args).map_err(&failed)?;
            value = Some(Data::owned(result));
        }
        Ok(value)
    }
}

// undefined values reach filters as `null`
fn to_json(value: Option<Data<'_>>) -> Result<JsonValue, String> {
    value.map_or(Ok(JsonValue::Null), |it| it.get().to_json())
}


/// How a section value drives its body.
enum Truth<'r> {
    Falsy,
    True,
    Sequence(Vec<Data<'r>>),
    Other(Data<'r>),
}

impl<'r> Truth<'r> {
    fn of(value: Option<Data<'r>>) -> Self {
        let value = match value {
            Some(value) => value,
            None => return Truth::Falsy,
        };
        match value.get().kind() {
            Kind::Null | Kind::Bool(false) => Truth::Falsy,
            Kind::Bool(true) => Truth::True,
            Kind::Sequence => Truth::Sequence(value.children().unwrap_or_default()),
            Kind::Number | Kind::String | Kind::Mapping => Truth::Other(value),
        }
    }
}


/// The rendered text, and the indentation of the partials being rendered.
///
/// Indentation goes in front of every line of partial template text.
/// Values are written as-is: a newline inside a value is not indented.
struct Output {
    buffer: String,
    indent: String,
    at_line_start: bool,
}

impl Output {
    fn new() -> Self {
        Output {
            buffer: String::new(),
            indent: String::new(),
            at_line_start: true,
        }
    }

    fn write_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.indent.is_empty() {
            self.buffer.push_str(text);
        } else {
            for line in text.split_inclusive('\n') {
                if self.at_line_start {
                    self.buffer.push_str(&self.indent);
                }
                self.buffer.push_str(line);
                self.at_line_start = line.ends_with('\n');
            }
        }
        self.at_line_start = text.ends_with('\n');
    }

    fn write_value(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        if self.at_line_start {
            self.buffer.push_str(&self.indent);
        }
        self.buffer.push_str(value);
        self.at_line_start = false;
    }

    fn indented<T>(&mut self, indent: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        let len = self.indent.len();
        self.indent.push_str(indent);
        if !indent.is_empty() {
            // a standalone tag starts on a fresh line
            self.at_line_start = true;
        }
        let result = f(self);
        self.indent.truncate(len);
        result
    }
}
