//! JavaScript and TypeScript backends

use std::ops::Range;

use regex::Regex;

use crate::error::Result;
use crate::locals::Value;
use crate::syntax::builtin::{javascript_grammar, typescript_grammar};

use super::{BracketEngine, Keymap, LanguageEngine, SyntaxTable};

const SCRIPT_TABLE: SyntaxTable = SyntaxTable {
    string_quotes: &['"', '\'', '`'],
    multiline_quotes: &['`'],
    escape: '\\',
    line_comment: Some("//"),
    block_comment: Some(("/*", "*/")),
    open_brackets: "([{",
    close_brackets: ")]}",
};

const SCRIPT_KEYMAP: Keymap = Keymap::new("js-mode-map", &[("M-.", "js-find-symbol")]);

fn script_locals(major_mode: &'static str) -> Vec<(&'static str, Value)> {
    vec![
        ("major-mode", Value::Symbol(major_mode)),
        ("comment-start", Value::str("// ")),
        ("comment-end", Value::str("")),
        ("comment-start-skip", Value::str(r"(?://+|/\*+)\s*")),
        ("comment-multi-line", Value::Bool(true)),
        ("electric-indent-chars", Value::str("\n{}():;,")),
        ("forward-sexp-function", Value::Symbol("js-forward-sexp")),
        ("completion-at-point-functions", Value::Symbol("js-completion-at-point")),
        ("font-lock-defaults", Value::Symbol("js-font-lock-keywords")),
        ("font-lock-maximum-decoration", Value::Int(3)),
        ("indent-line-function", Value::Symbol("js-indent-line")),
        ("indent-offset", Value::Int(2)),
        // Not captured: neither crucial nor cosmetic
        ("syntax-propertize-function", Value::Symbol("js-syntax-propertize")),
        ("js-indent-level", Value::Int(2)),
    ]
}

/// Load the JavaScript engine
pub fn javascript_engine() -> Result<Box<dyn LanguageEngine>> {
    Ok(Box::new(BracketEngine::new(
        "JavaScript",
        javascript_grammar()?,
        SCRIPT_TABLE,
        SCRIPT_KEYMAP,
        script_locals("js-mode"),
    )))
}

/// Load the TypeScript engine
pub fn typescript_engine() -> Result<Box<dyn LanguageEngine>> {
    let mut locals = script_locals("typescript-mode");
    for (name, value) in &mut locals {
        match *name {
            "font-lock-defaults" => *value = Value::Symbol("typescript-font-lock-keywords"),
            "indent-line-function" => *value = Value::Symbol("typescript-indent-line"),
            _ => {}
        }
    }

    Ok(Box::new(BracketEngine::new(
        "TypeScript",
        typescript_grammar()?,
        SCRIPT_TABLE,
        SCRIPT_KEYMAP,
        locals,
    )))
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// The identifier touching `pos`
fn identifier_at(text: &str, pos: usize) -> Option<&str> {
    let start = text[..pos]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_identifier_char(*c))
        .last()
        .map_or(pos, |(i, _)| i);
    let end = text[pos..]
        .find(|c: char| !is_identifier_char(c))
        .map_or(text.len(), |i| pos + i);
    (start < end).then(|| &text[start..end])
}

/// Where the identifier at `pos` is declared, searching `scopes` in order
pub fn find_definition(text: &str, scopes: &[Range<usize>], pos: usize) -> Result<Option<usize>> {
    let Some(name) = identifier_at(text, pos) else {
        return Ok(None);
    };
    let declaration = Regex::new(&format!(
        r"(?:^|[^\w$])(?:function\*?|class|let|const|var)\s+({})(?:[^\w$]|$)",
        regex::escape(name)
    ))?;

    Ok(scopes.iter().find_map(|scope| {
        declaration
            .captures(&text[scope.clone()])
            .and_then(|caps| caps.get(1))
            .map(|m| scope.start + m.start())
    }))
}
