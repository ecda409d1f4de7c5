//! Faces for fontification
//!
//! This module defines the semantic faces the grammars assign to
//! text and their default visual styles.

use super::style::{Color, Style};

/// Semantic faces for fontification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Face {
    /// Comments in any language
    Comment,
    /// String literals and attribute values
    String,
    /// Numeric literals, hex colors, dimensions
    Number,
    /// Language keywords and template block keywords
    Keyword,
    /// Type names
    Type,
    /// Function names and CSS functions
    Function,
    /// Operators
    Operator,
    /// Constants, entities and literal names
    Constant,
    /// Variables (`$var` in SCSS)
    Variable,
    /// Plain markup attributes
    Attribute,
    /// Directive attributes (`on:`, `bind:`, ...)
    Directive,
    /// Markup tag names
    TagName,
    /// CSS selectors
    Selector,
    /// CSS property names
    Property,
    /// No special fontification
    #[default]
    Default,
}

impl Face {
    /// Get the default style for this face
    pub fn default_style(&self) -> Style {
        match self {
            Face::Comment => Style::fg(Color::BrightBlack).with_italic(),
            Face::String => Style::fg(Color::Green),
            Face::Number => Style::fg(Color::Cyan),
            Face::Keyword => Style::fg(Color::Magenta).with_bold(),
            Face::Type => Style::fg(Color::Yellow),
            Face::Function => Style::fg(Color::Blue),
            Face::Operator => Style::fg(Color::BrightWhite),
            Face::Constant => Style::fg(Color::BrightRed),
            Face::Variable => Style::fg(Color::BrightYellow),
            Face::Attribute => Style::fg(Color::BrightBlue),
            Face::Directive => Style::fg(Color::BrightMagenta),
            Face::TagName => Style::fg(Color::Blue).with_bold(),
            Face::Selector => Style::fg(Color::BrightCyan),
            Face::Property => Style::fg(Color::Yellow),
            Face::Default => Style::default(),
        }
    }

    /// Get a human-readable name for this face
    pub fn name(&self) -> &'static str {
        match self {
            Face::Comment => "comment",
            Face::String => "string",
            Face::Number => "number",
            Face::Keyword => "keyword",
            Face::Type => "type",
            Face::Function => "function-name",
            Face::Operator => "operator",
            Face::Constant => "constant",
            Face::Variable => "variable-name",
            Face::Attribute => "attribute",
            Face::Directive => "directive",
            Face::TagName => "tag-name",
            Face::Selector => "selector",
            Face::Property => "property",
            Face::Default => "default",
        }
    }
}
