//! svelte-mode - submode region management for Svelte component files
//!
//! A Svelte file is HTML-like markup with embedded script and style
//! regions and script expressions inside attributes. This crate tags every
//! position with the language that owns it, switches buffer-scoped
//! variables as the cursor crosses regions, and routes indentation and
//! fontification to the owning language.

pub mod backend;
pub mod buffer;
pub mod command;
pub mod config;
pub mod document;
pub mod error;
pub mod fontify;
pub mod host;
pub mod indent;
pub mod interval;
pub mod locals;
pub mod render;
pub mod switch;
pub mod syntax;
pub mod tagger;

use std::path::Path;

pub use backend::{BackendId, Registry, Tag};
pub use config::{Config, TagRelativeIndent};
pub use document::Document;
pub use error::{ModeError, Result};

/// File extensions opened in svelte mode
pub const EXTENSIONS: &[&str] = &["svelte"];

/// Whether `path` should be opened in svelte mode
pub fn auto_mode(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
