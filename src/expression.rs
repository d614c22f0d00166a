use std::fmt;
use serde_json::Value as JsonValue;
use crate::error::ExpressionError;


/// One step of a variable path.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// The implicit iterator `.`, the value on top of the context stack.
    This,
    Identifier(String),
}

/// A filter argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A string, number or boolean written in the tag.
    Literal(JsonValue),
    /// A variable path resolved against the context stack.
    Path(Vec<Component>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Argument>,
}

/// The content of a variable or section tag.
///
/// ```text
/// expression := path filter*
/// path       := "." | "." ident ("." ident)* | ident ("." ident)*
/// filter     := "|" ident (":" argument ("," argument)*)?
/// argument   := string | number | "true" | "false" | path
/// ```
///
/// Dots always separate identifiers; there is no way to escape them.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub path: Vec<Component>,
    pub filters: Vec<FilterCall>,
}

impl Expression {
    pub fn parse(content: &str) -> Result<Expression, ExpressionError> {
        let mut cursor = Cursor { input: content, pos: 0 };
        cursor.skip_whitespace();
        let path = cursor.path()?;
        let mut filters = Vec::new();
        loop {
            cursor.skip_whitespace();
            match cursor.peek() {
                None => break,
                Some('|') => {
                    cursor.bump();
                    filters.push(cursor.filter()?);
                }
                Some(_) => return Err(ExpressionError::Unexpected(cursor.rest().to_owned())),
            }
        }
        Ok(Expression { path, filters })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_path(f, &self.path)?;
        for filter in &self.filters {
            write!(f, " | {}", filter.name)?;
            for (i, arg) in filter.args.iter().enumerate() {
                f.write_str(if i == 0 { ": " } else { ", " })?;
                match arg {
                    Argument::Literal(value) => write!(f, "{}", value)?,
                    Argument::Path(path) => write_path(f, path)?,
                }
            }
        }
        Ok(())
    }
}

fn write_path(f: &mut fmt::Formatter<'_>, path: &[Component]) -> fmt::Result {
    for (i, component) in path.iter().enumerate() {
        match component {
            Component::This => f.write_str(".")?,
            Component::Identifier(name) => {
                if i > 0 && path[i - 1] != Component::This {
                    f.write_str(".")?;
                }
                f.write_str(name)?;
            }
        }
    }
    Ok(())
}


struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !predicate(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn identifier(&mut self) -> &'a str {
        self.take_while(is_identifier_char)
    }

    fn path(&mut self) -> Result<Vec<Component>, ExpressionError> {
        let mut path = Vec::new();
        if self.peek() == Some('.') {
            self.bump();
            path.push(Component::This);
            match self.peek() {
                Some('.') => return Err(ExpressionError::ConsecutiveSeparators),
                Some(c) if is_identifier_char(c) => {
                    path.push(Component::Identifier(self.identifier().to_owned()))
                }
                _ => return Ok(path),
            }
        } else {
            let name = self.identifier();
            if name.is_empty() {
                return Err(match self.peek() {
                    None => ExpressionError::Empty,
                    Some(_) => ExpressionError::Unexpected(self.rest().to_owned()),
                });
            }
            path.push(Component::Identifier(name.to_owned()));
        }
        while self.peek() == Some('.') {
            self.bump();
            let name = self.identifier();
            if name.is_empty() {
                return Err(match self.peek() {
                    Some('.') => ExpressionError::ConsecutiveSeparators,
                    _ => ExpressionError::TrailingSeparator,
                });
            }
            path.push(Component::Identifier(name.to_owned()));
        }
        Ok(path)
    }

    fn filter(&mut self) -> Result<FilterCall, ExpressionError> {
        self.skip_whitespace();
        let name = self.identifier();
        if name.is_empty() {
            return Err(ExpressionError::MissingFilterName);
        }
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(':') {
            self.bump();
            loop {
                self.skip_whitespace();
                args.push(self.argument()?);
                self.skip_whitespace();
                if self.peek() != Some(',') {
                    break;
                }
                self.bump();
            }
        }
        Ok(FilterCall { name: name.to_owned(), args })
    }

    fn argument(&mut self) -> Result<Argument, ExpressionError> {
        match self.peek() {
            None | Some('|') | Some(',') => Err(ExpressionError::MissingArgument),
            Some('"') => self.string().map(|s| Argument::Literal(JsonValue::String(s))),
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let text = self.take_while(|c| c.is_ascii_alphanumeric() || "+-.".contains(c));
                serde_json::from_str::<serde_json::Number>(text)
                    .map(|n| Argument::Literal(JsonValue::Number(n)))
                    .map_err(|_| ExpressionError::Unexpected(text.to_owned()))
            }
            Some(_) => {
                let path = self.path()?;
                Ok(match &path[..] {
                    [Component::Identifier(name)] if name == "true" => Argument::Literal(JsonValue::Bool(true)),
                    [Component::Identifier(name)] if name == "false" => Argument::Literal(JsonValue::Bool(false)),
                    _ => Argument::Path(path),
                })
            }
        }
    }

    fn string(&mut self) -> Result<String, ExpressionError> {
        self.bump();
        let mut result = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(result);
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => result.push(escaped),
                    None => break,
                },
                _ => result.push(c),
            }
        }
        Err(ExpressionError::UnterminatedString)
    }
}

fn is_identifier_char(c: char) -> bool {
    !c.is_whitespace() && !".|:,\"".contains(c)
}
