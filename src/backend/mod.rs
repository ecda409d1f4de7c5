//! Pluggable language backends
//!
//! Every embedded language is reached through the [`LanguageEngine`]
//! capability trait. Engines are loaded lazily by the [`Registry`], which
//! also captures the buffer-scoped variables each engine declares.

mod bracket;
mod registry;
mod script;
mod stylesheet;

use std::ops::Range;

use crate::locals::{Bindings, Value};
use crate::syntax::Span;

pub use bracket::BracketEngine;
pub use registry::{builtin_specs, register_backend, Backend, BackendSpec, Registry};
pub use script::{find_definition, javascript_engine, typescript_engine};
pub use stylesheet::{css_engine, cycle_color_format, scss_engine};

/// Index of a backend in its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendId(pub usize);

/// Language tag carried by every buffer position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tag {
    /// Host markup
    #[default]
    Host,
    /// Region handled by an embedded language backend
    Lang(BackendId),
}

impl Tag {
    pub fn backend(self) -> Option<BackendId> {
        match self {
            Tag::Host => None,
            Tag::Lang(id) => Some(id),
        }
    }

    pub fn is_host(self) -> bool {
        self == Tag::Host
    }
}

/// Lexical class applied by a backend's propertize hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
    #[default]
    Code,
    /// String or comment text, opaque to bracket matching
    Literal,
}

/// Key bindings contributed by a language
#[derive(Debug, Clone, Copy)]
pub struct Keymap {
    pub name: &'static str,
    bindings: &'static [(&'static str, &'static str)],
}

impl Keymap {
    pub const fn new(name: &'static str, bindings: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, bindings }
    }

    /// Command bound to a key sequence
    pub fn lookup(&self, key: &str) -> Option<&'static str> {
        self.bindings
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, command)| *command)
    }

    /// Every command name the keymap binds
    pub fn commands(&self) -> impl Iterator<Item = &'static str> {
        let bindings: &'static [(&'static str, &'static str)] = self.bindings;
        bindings.iter().map(|(_, command)| *command)
    }
}

/// Lexical rules a backend exposes for bracket matching and literals
#[derive(Debug, Clone, Copy)]
pub struct SyntaxTable {
    /// Characters that open and close string literals
    pub string_quotes: &'static [char],
    /// Quote characters whose strings may span lines
    pub multiline_quotes: &'static [char],
    pub escape: char,
    pub line_comment: Option<&'static str>,
    pub block_comment: Option<(&'static str, &'static str)>,
    pub open_brackets: &'static str,
    pub close_brackets: &'static str,
}

impl SyntaxTable {
    /// Ranges of string and comment text inside `range`
    ///
    /// Unterminated literals run to the end of `range`.
    pub fn literals(&self, text: &str, range: Range<usize>) -> Vec<Range<usize>> {
        let end = range.end.min(text.len());
        let mut out = Vec::new();
        let mut i = range.start.min(end);

        while i < end {
            let rest = &text[i..end];

            if let Some(marker) = self.line_comment.filter(|m| rest.starts_with(*m)) {
                let stop = rest[marker.len()..]
                    .find('\n')
                    .map_or(end, |n| i + marker.len() + n);
                out.push(i..stop);
                i = stop;
                continue;
            }

            if let Some((open, close)) = self.block_comment.filter(|(o, _)| rest.starts_with(*o)) {
                let stop = rest[open.len()..]
                    .find(close)
                    .map_or(end, |n| i + open.len() + n + close.len());
                out.push(i..stop);
                i = stop;
                continue;
            }

            let Some(c) = rest.chars().next() else {
                break;
            };
            if self.string_quotes.contains(&c) {
                let stop = self.string_end(text, i + c.len_utf8(), end, c);
                out.push(i..stop);
                i = stop;
                continue;
            }
            i += c.len_utf8();
        }

        out
    }

    fn string_end(&self, text: &str, from: usize, end: usize, quote: char) -> usize {
        let multiline = self.multiline_quotes.contains(&quote);
        let mut escaped = false;
        for (offset, c) in text[from..end].char_indices() {
            if escaped {
                escaped = false;
            } else if c == self.escape {
                escaped = true;
            } else if c == quote {
                return from + offset + c.len_utf8();
            } else if c == '\n' && !multiline {
                return from + offset;
            }
        }
        end
    }

    /// Bracket depth at `pos`, ignoring text inside `literals`
    pub fn depth_at(&self, text: &str, pos: usize, literals: &[Range<usize>]) -> usize {
        let mut depth = 0usize;
        let mut literals = literals.iter().peekable();
        for (i, c) in text[..pos.min(text.len())].char_indices() {
            while literals.peek().is_some_and(|r| r.end <= i) {
                literals.next();
            }
            if literals.peek().is_some_and(|r| r.contains(&i)) {
                continue;
            }
            if self.open_brackets.contains(c) {
                depth += 1;
            } else if self.close_brackets.contains(c) {
                depth = depth.saturating_sub(1);
            }
        }
        depth
    }
}

/// Everything a backend needs to indent one line
///
/// Offsets are relative to `text`, which starts at the region start and
/// runs to the end of the buffer.
#[derive(Debug)]
pub struct IndentRequest<'a> {
    pub text: &'a str,
    /// Start of the line being indented
    pub line_start: usize,
    /// Outer indentation context: the column the region body is anchored to
    pub outer: usize,
    /// String and comment ranges before `line_start`, sorted
    pub literals: &'a [Range<usize>],
    /// Buffer-scoped variables with the backend's bindings installed
    pub locals: &'a Bindings,
}

/// Result of fontifying part of a region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fontified {
    pub spans: Vec<Span>,
    /// Range actually fontified, possibly larger than requested
    pub range: Range<usize>,
}

/// Capability interface every embedded language engine implements
pub trait LanguageEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn syntax_table(&self) -> &SyntaxTable;

    /// Lexical attributes for `range`: string and comment ranges
    fn propertize(&self, text: &str, range: Range<usize>) -> Vec<Range<usize>> {
        self.syntax_table().literals(text, range)
    }

    /// Column for the line at `request.line_start`
    fn indent_line(&self, request: &IndentRequest<'_>) -> usize;

    /// Fontify `range`, reading no further than `bounds`
    fn fontify(&self, text: &str, range: Range<usize>, bounds: Range<usize>, locals: &Bindings) -> Fontified;

    fn keymap(&self) -> &Keymap;

    /// Every buffer-scoped variable this engine sets up
    fn locals(&self) -> Vec<(&'static str, Value)>;
}
