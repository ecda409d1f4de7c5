//! Host markup language
//!
//! The host is the Svelte template itself: HTML elements, `{#if}` style
//! template blocks and attribute directives. This module owns the host's
//! variables and keymap, a small incremental markup scanner, host
//! fontification, and the element-aware indentation every embedded region
//! is anchored to.

use std::ops::Range;
use std::sync::Arc;

use regex::Regex;

use crate::backend::{Fontified, Keymap, Tag};
use crate::buffer::{
    column_at, first_nonblank, indentation, line_end, line_start, line_text, previous_nonblank_line,
};
use crate::config::Config;
use crate::error::Result;
use crate::interval::IntervalMap;
use crate::locals::{Bindings, Value};
use crate::syntax::builtin::{alternation, markup_grammar};
use crate::syntax::Grammar;

pub const HOST_NAME: &str = "Svelte";

pub const HOST_KEYMAP: Keymap = Keymap::new(
    "svelte-mode-map",
    &[
        ("C-c C-f", "sgml-skip-tag-forward"),
        ("C-c C-b", "sgml-skip-tag-backward"),
        ("C-c C-e", "sgml-close-tag"),
        ("TAB", "indent-for-tab-command"),
        ("C-j", "newline-and-indent"),
        ("M-;", "comment-line"),
    ],
);

/// Variables the host sets up in every document
pub fn base_locals() -> Bindings {
    [
        ("major-mode", Value::Symbol("svelte-mode")),
        ("comment-start", Value::str("<!-- ")),
        ("comment-end", Value::str(" -->")),
        ("comment-start-skip", Value::str(r"<!--[ \t]*")),
        ("comment-end-skip", Value::str(r"[ \t]*--[ \t\n]*>")),
        ("comment-multi-line", Value::Bool(true)),
        ("electric-indent-chars", Value::str("\n")),
        ("forward-sexp-function", Value::Symbol("sgml-forward-sexp")),
        ("completion-at-point-functions", Value::Symbol("sgml-completion-at-point")),
        ("font-lock-defaults", Value::Symbol("svelte-font-lock-keywords")),
        ("indent-line-function", Value::Symbol("svelte-indent-line")),
        ("indent-offset", Value::Int(2)),
    ]
    .into_iter()
    .collect()
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is not markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Lexical context of a host position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxContext {
    Text,
    Comment,
    /// Inside a start or end tag, between attributes
    Tag,
    /// Inside a quoted attribute value
    String,
    /// Content of an element not handled by any backend
    RawText,
}

impl SyntaxContext {
    /// Whether a region delimiter found here is real
    pub fn accepts_delimiter(self) -> bool {
        matches!(self, SyntaxContext::Text | SyntaxContext::Tag)
    }
}

/// An element or template block still open at the scan position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenElement {
    pub name: String,
    pub column: usize,
    pub block: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Text,
    /// `{...}` expression in text
    Expr { depth: usize },
    Comment,
    Tag { closing: bool },
    TagString { quote: char, closing: bool },
    TagBrace { depth: usize, closing: bool },
    RawText,
}

/// Incremental markup scanner
///
/// Fed host text run by run, it tracks the lexical state and the stack of
/// open elements and template blocks. Text covered by regions is never fed.
#[derive(Debug, Clone)]
pub struct MarkupScanner {
    keywords: Arc<[String]>,
    tab_width: usize,
    state: State,
    stack: Vec<OpenElement>,
    /// Start tag being read
    pending: Option<OpenElement>,
    /// Column of the `<` of the current tag
    tag_column: usize,
}

impl MarkupScanner {
    pub fn new(keywords: Arc<[String]>, tab_width: usize) -> Self {
        Self {
            keywords,
            tab_width,
            state: State::Text,
            stack: Vec::new(),
            pending: None,
            tag_column: 0,
        }
    }

    pub fn context(&self) -> SyntaxContext {
        match self.state {
            State::Text | State::Expr { .. } => SyntaxContext::Text,
            State::Comment => SyntaxContext::Comment,
            State::Tag { .. } | State::TagBrace { .. } => SyntaxContext::Tag,
            State::TagString { .. } => SyntaxContext::String,
            State::RawText => SyntaxContext::RawText,
        }
    }

    /// Elements and blocks open at the scan position, innermost last
    pub fn open_elements(&self) -> &[OpenElement] {
        &self.stack
    }

    /// Scan `range` of `text`
    pub fn feed(&mut self, text: &str, range: Range<usize>) {
        let end = range.end.min(text.len());
        let mut i = range.start.min(end);

        while i < end {
            let rest = &text[i..end];
            let Some(c) = rest.chars().next() else {
                break;
            };
            let mut step = c.len_utf8();

            match self.state {
                State::Text => {
                    if rest.starts_with("<!--") {
                        self.state = State::Comment;
                        step = 4;
                    } else if let Some(after) = rest.strip_prefix("</") {
                        let name = tag_name(after);
                        self.close_element(name);
                        self.start_tag(text, i, true);
                        step = 2 + name.len();
                    } else if rest.starts_with("<!") || rest.starts_with("<?") {
                        self.start_tag(text, i, true);
                        step = 2;
                    } else if c == '<' && rest[1..].starts_with(|ch: char| ch.is_ascii_alphabetic()) {
                        let name = tag_name(&rest[1..]);
                        self.start_tag(text, i, false);
                        self.pending = Some(OpenElement {
                            name: name.to_ascii_lowercase(),
                            column: self.tag_column,
                            block: false,
                        });
                        step = 1 + name.len();
                    } else if let Some(len) = self.block_marker(rest, '#') {
                        self.stack.push(OpenElement {
                            name: rest[2..len].to_string(),
                            column: column_at(text, i, self.tab_width),
                            block: true,
                        });
                        self.state = State::Expr { depth: 1 };
                        step = len;
                    } else if let Some(len) = self.block_marker(rest, '/') {
                        if let Some(idx) = self.stack.iter().rposition(|e| e.block) {
                            self.stack.truncate(idx);
                        }
                        self.state = State::Expr { depth: 1 };
                        step = len;
                    } else if c == '{' {
                        self.state = State::Expr { depth: 1 };
                    }
                }
                State::Expr { depth } => match c {
                    '{' => self.state = State::Expr { depth: depth + 1 },
                    '}' if depth <= 1 => self.state = State::Text,
                    '}' => self.state = State::Expr { depth: depth - 1 },
                    _ => {}
                },
                State::Comment => {
                    if rest.starts_with("-->") {
                        self.state = State::Text;
                        step = 3;
                    }
                }
                State::Tag { closing } => match c {
                    '"' | '\'' => self.state = State::TagString { quote: c, closing },
                    '{' => self.state = State::TagBrace { depth: 1, closing },
                    '>' => {
                        let self_closing = text[..i].ends_with('/');
                        self.finish_tag(closing, self_closing);
                    }
                    _ => {}
                },
                State::TagString { quote, closing } => {
                    if c == quote {
                        self.state = State::Tag { closing };
                    }
                }
                State::TagBrace { depth, closing } => match c {
                    '{' => self.state = State::TagBrace { depth: depth + 1, closing },
                    '}' if depth <= 1 => self.state = State::Tag { closing },
                    '}' => self.state = State::TagBrace { depth: depth - 1, closing },
                    _ => {}
                },
                State::RawText => {
                    if let Some(after) = rest.strip_prefix("</") {
                        let name = tag_name(after);
                        let matches_open = self
                            .stack
                            .last()
                            .is_some_and(|e| !e.block && e.name.eq_ignore_ascii_case(name));
                        if matches_open {
                            self.close_element(name);
                            self.start_tag(text, i, true);
                            step = 2 + name.len();
                        }
                    }
                }
            }

            i += step;
        }
    }

    fn start_tag(&mut self, text: &str, pos: usize, closing: bool) {
        self.tag_column = column_at(text, pos, self.tab_width);
        self.state = State::Tag { closing };
    }

    fn finish_tag(&mut self, closing: bool, self_closing: bool) {
        self.state = State::Text;
        if closing {
            return;
        }
        let Some(element) = self.pending.take() else {
            return;
        };
        if self_closing || VOID_ELEMENTS.contains(&element.name.as_str()) {
            return;
        }
        let raw = RAW_TEXT_ELEMENTS.contains(&element.name.as_str());
        self.stack.push(element);
        if raw {
            self.state = State::RawText;
        }
    }

    /// Pop up to and including the innermost element named `name`
    fn close_element(&mut self, name: &str) {
        if let Some(idx) = self
            .stack
            .iter()
            .rposition(|e| !e.block && e.name.eq_ignore_ascii_case(name))
        {
            self.stack.truncate(idx);
        }
    }

    /// Length of a `{#kw` / `{:kw` / `{/kw` marker at the start of `rest`
    fn block_marker(&self, rest: &str, sigil: char) -> Option<usize> {
        let body = rest.strip_prefix('{')?.strip_prefix(sigil)?;
        self.keywords
            .iter()
            .find(|kw| {
                body.starts_with(kw.as_str())
                    && !body[kw.len()..].starts_with(|c: char| c.is_alphanumeric() || c == '_')
            })
            .map(|kw| 2 + kw.len())
    }
}

/// Element name at the start of `s`
fn tag_name(s: &str) -> &str {
    let end = s
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')))
        .unwrap_or(s.len());
    &s[..end]
}

/// A start or end tag found in host text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementTag {
    pub range: Range<usize>,
    /// Lowercased element name
    pub name: String,
    pub closing: bool,
    /// Self-closing or void, so no end tag matches it
    pub empty: bool,
}

/// Host fontification and indentation
#[derive(Debug)]
pub struct HostEngine {
    grammar: Grammar,
    keywords: Arc<[String]>,
    block_open: Regex,
    block_continue: Regex,
    block_close: Regex,
    element_tag: Regex,
    comment: Regex,
}

impl HostEngine {
    pub fn new(config: &Config) -> Result<Self> {
        let keywords = alternation(&config.block_keywords);
        Ok(Self {
            grammar: markup_grammar(&config.block_keywords, &config.directive_prefixes)?,
            keywords: config.block_keywords.clone().into(),
            block_open: Regex::new(&format!(r"^\s*\{{#(?:{keywords})\b"))?,
            block_continue: Regex::new(&format!(r"^\s*\{{:(?:{keywords})\b"))?,
            block_close: Regex::new(&format!(r"^\s*\{{/(?:{keywords})\b"))?,
            element_tag: Regex::new(
                r#"<(/?)([A-Za-z][\w.:-]*)(?:[^>"'{]|"[^"]*"|'[^']*'|\{[^}]*\})*?(/?)>"#,
            )?,
            comment: Regex::new(r"(?s)<!--.*?-->")?,
        })
    }

    pub fn keymap(&self) -> &Keymap {
        &HOST_KEYMAP
    }

    /// A fresh scanner positioned at the start of the buffer
    pub fn scanner(&self, tab_width: usize) -> MarkupScanner {
        MarkupScanner::new(Arc::clone(&self.keywords), tab_width)
    }

    /// Scanner state after every host run before `pos`
    fn scan_host(&self, text: &str, tags: &IntervalMap<Tag>, pos: usize, tab_width: usize) -> MarkupScanner {
        let mut scanner = self.scanner(tab_width);
        for (run, tag) in tags.iter_range(0..pos) {
            if tag.is_host() {
                scanner.feed(text, run);
            }
        }
        scanner
    }

    /// Every start and end tag outside regions and comments, in order
    pub fn element_tags(&self, text: &str, tags: &IntervalMap<Tag>) -> Vec<ElementTag> {
        // Region text is blanked out byte for byte so offsets still line up
        let mut host = String::with_capacity(text.len());
        for (run, tag) in tags.iter() {
            if tag.is_host() {
                host.push_str(&text[run]);
            } else {
                host.extend(std::iter::repeat(' ').take(run.len()));
            }
        }

        let comments: Vec<Range<usize>> = self.comment.find_iter(&host).map(|m| m.range()).collect();
        self.element_tag
            .captures_iter(&host)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                if comments.iter().any(|c| c.contains(&whole.start())) {
                    return None;
                }
                let name = caps[2].to_ascii_lowercase();
                let closing = !caps[1].is_empty();
                let empty = !closing && (!caps[3].is_empty() || VOID_ELEMENTS.contains(&name.as_str()));
                Some(ElementTag {
                    range: whole.range(),
                    name,
                    closing,
                    empty,
                })
            })
            .collect()
    }

    /// End of the element starting at the first tag at or after `pos`
    ///
    /// An end tag or an empty element is skipped on its own.
    pub fn skip_tag_forward(&self, text: &str, tags: &IntervalMap<Tag>, pos: usize) -> Option<usize> {
        let elements = self.element_tags(text, tags);
        let first = elements.iter().position(|e| e.range.start >= pos)?;
        let open = &elements[first];
        if open.closing || open.empty {
            return Some(open.range.end);
        }

        let mut depth = 0usize;
        for e in elements[first + 1..].iter().filter(|e| e.name == open.name && !e.empty) {
            if !e.closing {
                depth += 1;
            } else if depth == 0 {
                return Some(e.range.end);
            } else {
                depth -= 1;
            }
        }
        None
    }

    /// Start of the element ending at the last tag before `pos`
    pub fn skip_tag_backward(&self, text: &str, tags: &IntervalMap<Tag>, pos: usize) -> Option<usize> {
        let elements = self.element_tags(text, tags);
        let last = elements.iter().rposition(|e| e.range.end <= pos)?;
        let close = &elements[last];
        if !close.closing {
            return Some(close.range.start);
        }

        let mut depth = 0usize;
        for e in elements[..last].iter().rev().filter(|e| e.name == close.name && !e.empty) {
            if e.closing {
                depth += 1;
            } else if depth == 0 {
                return Some(e.range.start);
            } else {
                depth -= 1;
            }
        }
        None
    }

    /// Text closing the innermost element or block open at `pos`
    pub fn close_tag_at(&self, text: &str, tags: &IntervalMap<Tag>, pos: usize, tab_width: usize) -> Option<String> {
        let scanner = self.scan_host(text, tags, pos, tab_width);
        if !matches!(scanner.state, State::Text | State::RawText) {
            return None;
        }
        let open = scanner.stack.last()?;
        Some(if open.block {
            format!("{{/{}}}", open.name)
        } else {
            format!("</{}>", open.name)
        })
    }

    /// Fontify host text in `range`, tracking state from `bounds.start`
    pub fn fontify(&self, text: &str, range: Range<usize>, bounds: Range<usize>) -> Fontified {
        let (spans, covered) = self.grammar.highlight_range(text, bounds.start, range, bounds.end);
        Fontified { spans, range: covered }
    }

    /// Markup indentation for a line whose first non-blank character is at `pos`
    ///
    /// Scans the host text before `pos`, skipping every tagged region, and
    /// indents one step inside the innermost open element or block. Closing
    /// tags and block markers line up with their opener.
    pub fn calculate_indent(
        &self,
        text: &str,
        tags: &IntervalMap<Tag>,
        pos: usize,
        offset: usize,
        tab_width: usize,
    ) -> usize {
        let scanner = self.scan_host(text, tags, pos, tab_width);

        let pos = pos.min(text.len());
        let rest = text[pos..line_end(text, pos)].trim_start_matches([' ', '\t']);

        match scanner.state {
            State::Comment => previous_nonblank_line(text, line_start(text, pos))
                .map_or(0, |prev| indentation(text, prev, tab_width)),
            State::Tag { .. } | State::TagString { .. } | State::TagBrace { .. } => {
                scanner.tag_column + offset
            }
            State::Text | State::Expr { .. } | State::RawText => {
                if let Some(after) = rest.strip_prefix("</") {
                    let name = tag_name(after);
                    if let Some(open) = scanner
                        .stack
                        .iter()
                        .rev()
                        .find(|e| !e.block && e.name.eq_ignore_ascii_case(name))
                    {
                        return open.column;
                    }
                }
                if scanner.block_marker(rest, '/').is_some() || scanner.block_marker(rest, ':').is_some() {
                    if let Some(open) = scanner.stack.iter().rev().find(|e| e.block) {
                        return open.column;
                    }
                }
                scanner.stack.last().map_or(0, |e| e.column + offset)
            }
        }
    }

    /// Column for a host line, aware of template blocks
    ///
    /// A line after a block opener goes one step deeper, continuation and
    /// close markers come back out one step, and a line after a close
    /// marker stays level. Everything else uses [`Self::calculate_indent`].
    pub fn indent_line(
        &self,
        text: &str,
        tags: &IntervalMap<Tag>,
        line: usize,
        offset: usize,
        tab_width: usize,
    ) -> usize {
        let current = line_text(text, line);

        if let Some(prev) = previous_nonblank_line(text, line) {
            let prev_text = line_text(text, prev);
            let prev_indent = indentation(text, prev, tab_width);
            let closes = self.block_continue.is_match(current) || self.block_close.is_match(current);

            if self.block_open.is_match(prev_text) {
                // Takes precedence over the one-step-deeper rule: a closer
                // right after its opener means the block is empty and the
                // closer lines up with the opener
                return if closes { prev_indent } else { prev_indent + offset };
            }

            let prev_closes = self.block_close.is_match(prev_text);
            if closes || (prev_closes && current.trim_start().starts_with("</")) {
                return prev_indent.saturating_sub(offset);
            }
            if prev_closes {
                return prev_indent;
            }
        }

        self.calculate_indent(text, tags, first_nonblank(text, line), offset, tab_width)
    }
}
