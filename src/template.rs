use std::collections::HashMap;
use serde::Serialize;
use crate::config::{Configuration, ContentType, Delimiters};
use crate::context::Context;
use crate::error::{Error, Position, RenderError, SyntaxError, SyntaxErrorKind};
use crate::expression::Expression;
use crate::reader::{Reader, Tag, TagKind, Token};
use crate::render::{self, Collaborators};


/// How deep sections, blocks, parents and partials may nest. A single
/// template is checked when compiled; nesting accumulated through partials
/// is checked while rendering.
pub const MAX_NESTING_DEPTH: usize = 128;


/// A compiled template. Immutable, cheap to share between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
    content_type: ContentType,
}

/// A node of the compiled template.
///
/// Comments, delimiter changes and pragmas are handled by the compiler and
/// have no node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Variable {
        expression: Expression,
        escaped: bool,
        position: Position,
    },
    Section {
        expression: Expression,
        inverted: bool,
        nodes: Vec<Node>,
        position: Position,
    },
    /// `indent` is the whitespace before a standalone partial tag, empty
    /// for a partial tag sharing its line with other content.
    Partial {
        name: String,
        indent: String,
        position: Position,
    },
    /// A block that a parent's override may replace; `nodes` is the default.
    Block {
        name: String,
        nodes: Vec<Node>,
        position: Position,
    },
    /// Renders the `name` template with the enclosed blocks as overrides.
    /// `overrides` only holds `Node::Block`.
    Parent {
        name: String,
        indent: String,
        overrides: Vec<Node>,
        position: Position,
    },
}

impl Template {
    /// Compiles an HTML template with the default `{{ }}` delimiters.
    pub fn from(input: &str) -> Result<Self, SyntaxError> {
        Template::compile_with(input, &Configuration::default())
    }

    pub fn compile_with(input: &str, config: &Configuration) -> Result<Self, SyntaxError> {
        let reader = Reader::new(input, &config.delimiters);
        let (nodes, content_type) = parse(reader, config.content_type)?;
        log::debug!(
            "compiled {:?} template with {} top-level nodes",
            content_type,
            nodes.len()
        );
        Ok(Template { nodes, content_type })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Renders without partials or filters, HTML-escaping per content type.
    pub fn render(&self, context: &dyn Context) -> Result<String, RenderError> {
        render::render(self, context, &Collaborators::default())
    }

    pub fn render_with_partials(
        &self, context: &dyn Context, partials: &dyn TemplateStore
    ) -> Result<String, RenderError> {
        let collaborators = Collaborators::default().with_partials(partials);
        render::render(self, context, &collaborators)
    }

    pub fn render_with(
        &self, context: &dyn Context, collaborators: &Collaborators
    ) -> Result<String, RenderError> {
        render::render(self, context, collaborators)
    }

    /// Renders any serializable value, going through [`JsonValue`].
    pub fn render_data<S: Serialize + ?Sized>(
        &self, data: &S, collaborators: &Collaborators
    ) -> Result<String, Error> {
        let context = serde_json::to_value(data)?;
        Ok(render::render(self, &context, collaborators)?)
    }
}


/// A section, block or parent waiting for its closing tag.
struct Open {
    kind: OpenKind,
    position: Position,
    nodes: Vec<Node>,
}

enum OpenKind {
    Section { expression: Expression, inverted: bool },
    Block { name: String },
    Parent { name: String, indent: String },
}

impl Open {
    fn name(&self) -> String {
        match &self.kind {
            OpenKind::Section { expression, .. } => expression.to_string(),
            OpenKind::Block { name } | OpenKind::Parent { name, .. } => name.clone(),
        }
    }

    fn is_closed_by(&self, content: &str) -> bool {
        match &self.kind {
            OpenKind::Section { expression, .. } => {
                Expression::parse(content).map_or(false, |closing| &closing == expression)
            }
            OpenKind::Block { name } | OpenKind::Parent { name, .. } => name == content,
        }
    }

    fn into_node(self) -> Node {
        let Open { kind, position, nodes } = self;
        match kind {
            OpenKind::Section { expression, inverted } => Node::Section { expression, inverted, nodes, position },
            OpenKind::Block { name } => Node::Block { name, nodes, position },
            OpenKind::Parent { name, indent } => Node::Parent { name, indent, overrides: nodes, position },
        }
    }
}


fn parse(
    reader: Reader<'_>, mut content_type: ContentType
) -> Result<(Vec<Node>, ContentType), SyntaxError> {
    let mut root = Vec::new();
    let mut stack: Vec<Open> = Vec::new();
    for token in reader {
        let token = token?;
        if let Token::Tag(tag) = &token {
            if tag.kind.opens_scope() && stack.len() >= MAX_NESTING_DEPTH {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::NestingTooDeep(MAX_NESTING_DEPTH),
                    tag.position,
                ));
            }
        }
        let node = match token {
            Token::Text(text) => Node::Text(text.to_owned()),
            Token::Tag(tag) => match tag.kind {
                TagKind::Escaped | TagKind::Unescaped => Node::Variable {
                    expression: expression(&tag)?,
                    escaped: tag.kind == TagKind::Escaped,
                    position: tag.position,
                },
                TagKind::Section | TagKind::InvertedSection => {
                    stack.push(Open {
                        kind: OpenKind::Section {
                            expression: expression(&tag)?,
                            inverted: tag.kind == TagKind::InvertedSection,
                        },
                        position: tag.position,
                        nodes: Vec::new(),
                    });
                    continue;
                }
                TagKind::Block => {
                    stack.push(Open {
                        kind: OpenKind::Block { name: name(&tag)? },
                        position: tag.position,
                        nodes: Vec::new(),
                    });
                    continue;
                }
                TagKind::Parent => {
                    stack.push(Open {
                        kind: OpenKind::Parent {
                            name: name(&tag)?,
                            indent: tag.indent.to_owned(),
                        },
                        position: tag.position,
                        nodes: Vec::new(),
                    });
                    continue;
                }
                TagKind::EndSection => {
                    let open = match stack.pop() {
                        Some(open) if open.is_closed_by(tag.content) => open,
                        open => return Err(SyntaxError::new(
                            SyntaxErrorKind::UnexpectedClosingTag {
                                found: tag.content.to_owned(),
                                expected: open.map(|it| it.name()),
                            },
                            tag.position,
                        )),
                    };
                    open.into_node()
                }
                TagKind::Partial => Node::Partial {
                    name: name(&tag)?,
                    indent: tag.indent.to_owned(),
                    position: tag.position,
                },
                TagKind::Pragma => {
                    if let Some(pragma) = pragma_content_type(tag.content) {
                        content_type = pragma;
                    }
                    continue;
                }
                TagKind::Comment | TagKind::Delimiters => continue,
            },
        };
        match stack.last_mut() {
            // a parent only keeps its blocks
            Some(Open { kind: OpenKind::Parent { .. }, nodes, .. }) => {
                if let Node::Block { .. } = node {
                    nodes.push(node);
                }
            }
            Some(open) => open.nodes.push(node),
            None => root.push(node),
        }
    }
    if let Some(open) = stack.pop() {
        return Err(SyntaxError::new(
            SyntaxErrorKind::UnclosedSection(open.name()),
            open.position,
        ));
    }
    Ok((root, content_type))
}

fn expression(tag: &Tag<'_>) -> Result<Expression, SyntaxError> {
    Expression::parse(tag.content)
        .map_err(|err| SyntaxError::new(err.into(), tag.position))
}

fn name(tag: &Tag<'_>) -> Result<String, SyntaxError> {
    if tag.content.contains(char::is_whitespace) {
        Err(SyntaxError::new(
            SyntaxErrorKind::InvalidName(tag.content.to_owned()),
            tag.position,
        ))
    } else {
        Ok(tag.content.to_owned())
    }
}

// `CONTENT_TYPE:TEXT` and `CONTENT_TYPE:HTML`; other pragmas are ignored
fn pragma_content_type(content: &str) -> Option<ContentType> {
    let (key, value) = content.split_once(':')?;
    if key.trim() != "CONTENT_TYPE" {
        log::trace!("ignoring pragma `{}`", content);
        return None;
    }
    match value.trim() {
        "TEXT" => Some(ContentType::Text),
        "HTML" => Some(ContentType::Html),
        other => {
            log::trace!("ignoring content type `{}`", other);
            None
        }
    }
}


/// Resolves partial and parent names to templates.
pub trait TemplateStore {
    fn get(&self, name: &str) -> Option<&Template>;
}

impl TemplateStore for HashMap<String, Template> {
    fn get(&self, name: &str) -> Option<&Template> {
        HashMap::get(self, name)
    }
}


/// An in-memory [`TemplateStore`].
#[derive(Debug, Clone, Default)]
pub struct TemplateMap {
    config: Configuration,
    templates: HashMap<String, Template>,
}

impl TemplateMap {
    pub fn new() -> Self {
        TemplateMap::default()
    }

    /// Templates loaded afterwards are compiled with `config`.
    pub fn with_configuration(config: Configuration) -> Self {
        TemplateMap { config, templates: HashMap::new() }
    }

    pub fn load(&mut self, name: &str, input: &str) -> Result<&mut Self, SyntaxError> {
        let template = Template::compile_with(input, &self.config)?;
        self.templates.insert(name.to_owned(), template);
        Ok(self)
    }

    pub fn insert(&mut self, name: &str, template: Template) -> &mut Self {
        self.templates.insert(name.to_owned(), template);
        self
    }
}

impl TemplateStore for TemplateMap {
    fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }
}


/// Compiles `source` with the given initial delimiters and content type.
pub fn compile(
    source: &str, delimiters: &Delimiters, content_type: ContentType
) -> Result<Template, SyntaxError> {
    Template::compile_with(source, &Configuration {
        content_type,
        delimiters: delimiters.clone(),
    })
}
