//! Built-in grammars
//!
//! This module provides fontification grammars for the host markup
//! language and the languages embedded in it.

mod javascript;
mod css;
mod markup;

pub use css::{css_grammar, scss_grammar};
pub use javascript::{javascript_grammar, typescript_grammar};
pub use markup::markup_grammar;
pub(crate) use markup::alternation;
