use std::fmt;
use thiserror::Error;


/// A convenient type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Location of a tag in the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    /// 0-based byte offset.
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}


/// Any error produced by this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// The data could not be converted into a renderable value.
    #[error("invalid data: {0}")]
    Data(#[from] serde_json::Error),
}


/// A compile-time error. Compilation never recovers from one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {position}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub position: Position,
}

impl SyntaxError {
    pub(crate) fn new(kind: SyntaxErrorKind, position: Position) -> Self {
        SyntaxError { kind, position }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("Unclosed tag")]
    UnclosedTag,

    #[error("Empty tag")]
    EmptyTag,

    #[error("Invalid delimiters tag")]
    InvalidDelimiters,

    #[error("Invalid expression: {0}")]
    InvalidExpression(#[from] ExpressionError),

    #[error("Invalid name `{0}`")]
    InvalidName(String),

    #[error("Unexpected closing tag `{found}`{}", expected_suffix(.expected))]
    UnexpectedClosingTag {
        found: String,
        expected: Option<String>,
    },

    #[error("Unclosed section `{0}`")]
    UnclosedSection(String),

    /// Sections, blocks and parents opened more than this many levels deep.
    #[error("Tags nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

fn expected_suffix(expected: &Option<String>) -> String {
    match expected {
        Some(name) => format!(", expected `{}`", name),
        None => String::new(),
    }
}


/// Why a tag's content is not a valid expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("empty expression")]
    Empty,

    #[error("consecutive separators")]
    ConsecutiveSeparators,

    #[error("trailing separator")]
    TrailingSeparator,

    #[error("unterminated string")]
    UnterminatedString,

    #[error("missing filter name")]
    MissingFilterName,

    #[error("missing filter argument")]
    MissingArgument,

    #[error("unexpected `{0}`")]
    Unexpected(String),
}


/// A render-time error. The render call that hit it produces no output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Unknown filter `{name}` at {position}")]
    UnknownFilter { name: String, position: Position },

    #[error("Filter `{name}` failed at {position}: {message}")]
    Filter {
        name: String,
        message: String,
        position: Position,
    },

    #[error("Partial `{name}` not found at {position}")]
    PartialNotFound { name: String, position: Position },

    #[error("Partial recursion limit exceeded including `{name}` at {position} (depth {depth})")]
    RecursionLimitExceeded {
        name: String,
        depth: usize,
        position: Position,
    },

    #[error("Nesting limit exceeded at {position} (depth {depth})")]
    NestingLimitExceeded { depth: usize, position: Position },
}
