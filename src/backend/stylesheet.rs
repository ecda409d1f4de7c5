//! CSS and SCSS backends

use std::ops::Range;

use regex::Regex;

use crate::buffer::{line_end, line_start};
use crate::error::Result;
use crate::locals::Value;
use crate::syntax::builtin::{css_grammar, scss_grammar};

use super::{BracketEngine, Keymap, LanguageEngine, SyntaxTable};

const CSS_TABLE: SyntaxTable = SyntaxTable {
    string_quotes: &['"', '\''],
    multiline_quotes: &[],
    escape: '\\',
    line_comment: None,
    block_comment: Some(("/*", "*/")),
    open_brackets: "({[",
    close_brackets: ")}]",
};

const SCSS_TABLE: SyntaxTable = SyntaxTable {
    line_comment: Some("//"),
    ..CSS_TABLE
};

const STYLE_KEYMAP: Keymap = Keymap::new("css-mode-map", &[("C-c C-f", "css-cycle-color-format")]);

fn css_locals() -> Vec<(&'static str, Value)> {
    vec![
        ("major-mode", Value::Symbol("css-mode")),
        ("comment-start", Value::str("/* ")),
        ("comment-end", Value::str(" */")),
        ("comment-start-skip", Value::str(r"/\*+[ \t]*")),
        ("comment-end-skip", Value::str(r"[ \t]*\*+/")),
        ("electric-indent-chars", Value::str("\n{};")),
        ("completion-at-point-functions", Value::Symbol("css-completion-at-point")),
        ("font-lock-defaults", Value::Symbol("css-font-lock-keywords")),
        ("indent-line-function", Value::Symbol("css-indent-line")),
        ("indent-offset", Value::Int(2)),
        ("css-indent-offset", Value::Int(2)),
    ]
}

/// Load the CSS engine
pub fn css_engine() -> Result<Box<dyn LanguageEngine>> {
    Ok(Box::new(BracketEngine::new(
        "CSS",
        css_grammar()?,
        CSS_TABLE,
        STYLE_KEYMAP,
        css_locals(),
    )))
}

/// Load the SCSS engine
pub fn scss_engine() -> Result<Box<dyn LanguageEngine>> {
    let mut locals = css_locals();
    for (name, value) in &mut locals {
        match *name {
            "major-mode" => *value = Value::Symbol("scss-mode"),
            "comment-start" => *value = Value::str("// "),
            "comment-end" => *value = Value::str(""),
            "comment-start-skip" => *value = Value::str(r"(?://+|/\*+)\s*"),
            "font-lock-defaults" => *value = Value::Symbol("scss-font-lock-keywords"),
            _ => {}
        }
    }

    Ok(Box::new(BracketEngine::new(
        "SCSS",
        scss_grammar()?,
        SCSS_TABLE,
        STYLE_KEYMAP,
        locals,
    )))
}

/// The color touching `pos` and its other notation
///
/// Hex colors become `rgb()` and `rgb()` colors become six-digit hex.
pub fn cycle_color_format(text: &str, pos: usize) -> Result<Option<(Range<usize>, String)>> {
    let color = Regex::new(
        r"#([0-9a-fA-F]{6}|[0-9a-fA-F]{3})\b|rgb\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)",
    )?;
    let line = line_start(text, pos)..line_end(text, pos);

    for caps in color.captures_iter(&text[line.clone()]) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let range = line.start + whole.start()..line.start + whole.end();
        if !(range.start..=range.end).contains(&pos) {
            continue;
        }

        let replacement = match caps.get(1) {
            Some(hex) => {
                let digits: String = if hex.len() == 3 {
                    hex.as_str().chars().flat_map(|c| [c, c]).collect()
                } else {
                    hex.as_str().to_string()
                };
                let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0);
                format!("rgb({}, {}, {})", channel(0), channel(2), channel(4))
            }
            None => {
                let channel = |i: usize| caps[i].parse::<u16>().map_or(0, |v| v.min(255));
                format!("#{:02x}{:02x}{:02x}", channel(2), channel(3), channel(4))
            }
        };
        return Ok(Some((range, replacement)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_comment_syntax() {
        let css = css_engine().unwrap();
        let locals = css.locals();
        let get = |key: &str| locals.iter().find(|(n, _)| *n == key).map(|(_, v)| v.clone());
        assert_eq!(get("comment-start"), Some(Value::str("/* ")));
        assert_eq!(get("comment-end"), Some(Value::str(" */")));
    }

    #[test]
    fn test_cycle_color_format() {
        let text = "a { color: #f80; }\nb { color: rgb(255, 136, 300); }";
        let (range, rgb) = cycle_color_format(text, 12).unwrap().unwrap();
        assert_eq!(&text[range], "#f80");
        assert_eq!(rgb, "rgb(255, 136, 0)");

        let at = text.find("rgb").unwrap();
        let (_, hex) = cycle_color_format(text, at).unwrap().unwrap();
        assert_eq!(hex, "#ff88ff");
        assert_eq!(cycle_color_format(text, 2).unwrap(), None);
    }

    #[test]
    fn test_scss_line_comments_are_literal() {
        let scss = scss_engine().unwrap();
        let text = "// {\na { }";
        assert_eq!(scss.propertize(text, 0..text.len()), vec![0..4]);

        let css = css_engine().unwrap();
        assert!(css.propertize(text, 0..text.len()).is_empty());
    }
}
