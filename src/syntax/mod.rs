//! Syntax and styling module
//!
//! This module provides the regex-rule highlighting engine shared by the
//! host markup grammar and every embedded language backend:
//! - Faces and their default styles
//! - Single-line pattern rules and multi-line rules
//! - Grammars that highlight lines and whole ranges

mod style;
mod face;
mod rules;
mod language;
pub mod builtin;

pub use style::{Color, Span, Style};
pub use face::Face;
pub use rules::{LineState, MultilineRule, PatternRule};
pub use language::{Grammar, LineHighlight};
