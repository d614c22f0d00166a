use std::rc::Rc;
use serde_json::Value as JsonValue;
use crate::expression::Component;


/// Data a template is rendered against.
///
/// Implementations are provided for [`serde_json::Value`],
/// [`serde_yaml::Value`] and common std maps, lists and scalars. Any
/// `serde::Serialize` value can also be rendered through
/// [`Template::render_data`](crate::Template::render_data).
pub trait Context {
    /// The member named `name`, when this value is a mapping that has it.
    fn child(&self, name: &str) -> Option<&dyn Context>;

    /// The elements, when this value is a sequence.
    fn children(&self) -> Option<Vec<&dyn Context>>;

    fn kind(&self) -> Kind;

    /// The text a variable tag renders for this value.
    fn value(&self) -> String;

    /// An owned copy handed to filters. Fails for values JSON cannot
    /// represent, such as a mapping with a non-scalar key.
    fn to_json(&self) -> Result<JsonValue, String>;
}

pub type ContextRef<'a> = &'a dyn Context;

/// The shape of a value, as far as sections are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool(bool),
    Number,
    String,
    Sequence,
    Mapping,
}


/// A value held by a scope: borrowed from the caller's data, or produced
/// during rendering by a filter.
#[derive(Clone)]
pub(crate) enum Data<'a> {
    Borrowed(ContextRef<'a>),
    Owned(Rc<JsonValue>),
}

impl<'a> Data<'a> {
    pub(crate) fn owned(value: JsonValue) -> Self {
        Data::Owned(Rc::new(value))
    }

    pub(crate) fn get(&self) -> &dyn Context {
        match self {
            Data::Borrowed(value) => *value,
            Data::Owned(value) => &**value,
        }
    }

    // only the edge value of an owned lookup is cloned
    pub(crate) fn child(&self, name: &str) -> Option<Data<'a>> {
        match self {
            Data::Borrowed(value) => {
                let value: ContextRef<'a> = *value;
                value.child(name).map(Data::Borrowed)
            }
            Data::Owned(value) => value.get(name).map(|child| Data::owned(child.clone())),
        }
    }

    pub(crate) fn children(&self) -> Option<Vec<Data<'a>>> {
        match self {
            Data::Borrowed(value) => {
                let value: ContextRef<'a> = *value;
                value
                    .children()
                    .map(|items| items.into_iter().map(Data::Borrowed).collect())
            }
            Data::Owned(value) => value
                .as_array()
                .map(|items| items.iter().cloned().map(Data::owned).collect()),
        }
    }
}


/// One scope of the context stack, linked to the scopes below it.
///
/// Pushing borrows the current scope as parent, so a pushed scope lives on
/// the renderer's call stack and disappears when the section body is done.
/// Sibling iterations each get their own scope; none is ever modified.
pub(crate) struct Stack<'s, 'a> {
    value: Data<'a>,
    parent: Option<&'s Stack<'s, 'a>>,
}

impl<'s, 'a> Stack<'s, 'a> {
    pub(crate) fn new(root: Data<'a>) -> Self {
        Stack { value: root, parent: None }
    }

    pub(crate) fn push(&'s self, value: Data<'a>) -> Stack<'s, 'a> {
        Stack { value, parent: Some(self) }
    }

    fn scopes(&self) -> impl Iterator<Item = &Stack<'s, 'a>> {
        std::iter::successors(Some(self), |stack| stack.parent)
    }

    /// Resolves a path. `None` stands for an undefined value.
    ///
    /// The first identifier is searched from the innermost scope outwards;
    /// the remaining ones only look into the value found so far.
    pub(crate) fn resolve(&self, path: &[Component]) -> Option<Data<'a>> {
        let (first, rest) = path.split_first()?;
        let mut value = match first {
            Component::This => self.value.clone(),
            Component::Identifier(name) => self
                .scopes()
                .find_map(|scope| scope.value.child(name))?,
        };
        for component in rest {
            value = match component {
                Component::This => value,
                Component::Identifier(name) => value.child(name)?,
            };
        }
        Some(value)
    }
}
