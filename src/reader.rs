use crate::config::{is_delimiter, Delimiters};
use crate::error::{Position, SyntaxError, SyntaxErrorKind};


/// Splits template source into text runs and tags.
///
/// The reader owns the active delimiter pair: a delimiters tag changes it
/// as soon as the tag is read, so everything after it is scanned with the
/// new pair. Cloning a reader, or creating a new one over the same input,
/// restarts the sequence.
#[derive(Clone)]
pub(crate) struct Reader<'a> {
    input: &'a str,
    open_delimiter: String,
    close_delimiter: String,
    pos: usize,
    pending: Option<Tag<'a>>,
    // line bookkeeping, advanced monotonically by `position_at`
    scanned: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(input: &'a str, delimiters: &Delimiters) -> Self {
        Reader {
            input,
            open_delimiter: delimiters.open().to_owned(),
            close_delimiter: delimiters.close().to_owned(),
            pos: 0,
            pending: None,
            scanned: 0,
            line: 1,
            line_start: 0,
        }
    }

    pub(crate) fn pop_front(&mut self) -> Option<Result<Token<'a>, SyntaxError>> {
        if let Some(tag) = self.pending.take() {
            return Some(Ok(Token::Tag(tag)));
        }
        let input = self.input;
        if self.pos >= input.len() {
            return None;
        }
        let tail = &input[self.pos..];
        let start = match tail.find(self.open_delimiter.as_str()) {
            Some(p) => self.pos + p,
            None => {
                self.pos = self.input.len();
                return Some(Ok(Token::Text(tail)));
            }
        };
        let position = self.position_at(start);
        let (kind, content, after_tag) = match self.span_tag(start) {
            Ok(result) => result,
            Err(kind) => {
                self.pos = self.input.len();
                return Some(Err(SyntaxError::new(kind, position)));
            }
        };
        if kind == TagKind::Delimiters {
            if let Err(kind) = self.set_delimiters(content) {
                self.pos = self.input.len();
                return Some(Err(SyntaxError::new(kind, position)));
            }
        }

        let (end_of_text, next_pos, indent) = match self.standalone_line(kind, start, after_tag) {
            Some((line_start, after_line)) => (line_start, after_line, &input[line_start..start]),
            None => (start, after_tag, ""),
        };
        let text = &input[self.pos..end_of_text];
        self.pos = next_pos;
        let tag = Tag { kind, content, position, indent };
        if text.is_empty() {
            Some(Ok(Token::Tag(tag)))
        } else {
            self.pending = Some(tag);
            Some(Ok(Token::Text(text)))
        }
    }

    // return the kind, the content and the position after the tag starting at `start`
    fn span_tag(&self, start: usize) -> Result<(TagKind, &'a str, usize), SyntaxErrorKind> {
        let input = self.input;
        let inner = start + self.open_delimiter.len();
        let rest = &input[inner..];
        let (close, skip) = match rest.chars().next() {
            Some('{') => (format!("}}{}", self.close_delimiter), 1),
            Some('=') => (format!("={}", self.close_delimiter), 1),
            Some(_) => (self.close_delimiter.clone(), 0),
            None => return Err(SyntaxErrorKind::UnclosedTag),
        };
        let p = rest[skip..]
            .find(close.as_str())
            .ok_or(SyntaxErrorKind::UnclosedTag)?;
        let after_tag = inner + skip + p + close.len();
        let raw = rest[skip..skip + p].trim();
        let (kind, content) = match skip {
            1 if rest.starts_with('{') => (TagKind::Unescaped, raw),
            1 => (TagKind::Delimiters, raw),
            _ => match raw.chars().next() {
                Some('&') => (TagKind::Unescaped, raw.trim_sigil()),
                Some('#') => (TagKind::Section, raw.trim_sigil()),
                Some('^') => (TagKind::InvertedSection, raw.trim_sigil()),
                Some('/') => (TagKind::EndSection, raw.trim_sigil()),
                Some('>') => (TagKind::Partial, raw.trim_sigil()),
                Some('<') => (TagKind::Parent, raw.trim_sigil()),
                Some('$') => (TagKind::Block, raw.trim_sigil()),
                Some('!') => (TagKind::Comment, raw.trim_sigil()),
                Some('%') => (TagKind::Pragma, raw.trim_sigil()),
                _ => (TagKind::Escaped, raw),
            },
        };
        if content.is_empty() && kind.requires_content() {
            return Err(SyntaxErrorKind::EmptyTag);
        }
        Ok((kind, content, after_tag))
    }

    fn set_delimiters(&mut self, content: &str) -> Result<(), SyntaxErrorKind> {
        let words = content.split_whitespace().collect::<Vec<_>>();
        match words[..] {
            [od, cd] if is_delimiter(od) && is_delimiter(cd) => {
                log::trace!("delimiters changed to `{}` `{}`", od, cd);
                self.open_delimiter = od.to_owned();
                self.close_delimiter = cd.to_owned();
                Ok(())
            }
            _ => Err(SyntaxErrorKind::InvalidDelimiters),
        }
    }

    // return the start of the line and the position after the line break
    // when the tag is alone on its line
    fn standalone_line(&self, kind: TagKind, start: usize, after_tag: usize) -> Option<(usize, usize)> {
        if !kind.can_stand_alone() {
            return None;
        }
        let line_start = self.input[..start].rfind('\n').map_or(0, |p| p + 1);
        if line_start < self.pos || !self.input[line_start..start].is_indent() {
            // another tag precedes this one on the same line
            return None;
        }
        let rest = &self.input[after_tag..];
        let (trailing, after_line) = match rest.find('\n') {
            Some(eol) => (&rest[..eol], after_tag + eol + 1),
            None => (rest, self.input.len()),
        };
        let trailing = trailing.strip_suffix('\r').unwrap_or(trailing);
        if trailing.is_indent() {
            Some((line_start, after_line))
        } else {
            None
        }
    }

    fn position_at(&mut self, offset: usize) -> Position {
        for (i, c) in self.input[self.scanned..offset].char_indices() {
            if c == '\n' {
                self.line += 1;
                self.line_start = self.scanned + i + 1;
            }
        }
        self.scanned = offset;
        Position {
            line: self.line,
            column: self.input[self.line_start..offset].chars().count() + 1,
            offset,
        }
    }
}

impl<'a> Iterator for Reader<'a> {
    type Item = Result<Token<'a>, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pop_front()
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagKind {
    Escaped,
    Unescaped,
    Section,
    InvertedSection,
    EndSection,
    Partial,
    Parent,
    Block,
    Comment,
    Delimiters,
    Pragma,
}

impl TagKind {
    fn can_stand_alone(self) -> bool {
        !matches!(self, TagKind::Escaped | TagKind::Unescaped)
    }

    /// Tags closed by a matching `{{/name}}`.
    pub(crate) fn opens_scope(self) -> bool {
        matches!(self, TagKind::Section | TagKind::InvertedSection | TagKind::Parent | TagKind::Block)
    }

    fn requires_content(self) -> bool {
        !matches!(self, TagKind::Comment | TagKind::Delimiters)
    }
}


#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tag<'a> {
    pub(crate) kind: TagKind,
    pub(crate) content: &'a str,
    pub(crate) position: Position,
    /// Whitespace preceding a standalone tag on its line, empty for a tag
    /// sharing its line with other content.
    pub(crate) indent: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<'a> {
    Text(&'a str),
    Tag(Tag<'a>),
}


trait ReaderStringOps {
    fn trim_sigil(&self) -> &str;
    fn is_indent(&self) -> bool;
}

impl ReaderStringOps for str {
    fn trim_sigil(&self) -> &str {
        self[1..].trim_start()
    }

    fn is_indent(&self) -> bool {
        self.chars().all(|c| c == ' ' || c == '\t')
    }
}
