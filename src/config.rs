//! Configuration file support
//!
//! Loads settings from ~/.svelte-mode.toml (or %USERPROFILE%\.svelte-mode.toml on Windows)
//!
//! Example:
//! ```text
//! # svelte-mode configuration
//! tag-relative-indent = "relative"   # or "non-relative", "flush"
//! indent-offset = 2
//! tab-width = 8
//! inline-style-detection = false
//! block-keywords = ["if", "else", "each", "await", "then", "catch", "as"]
//! directive-prefixes = ["on", "bind", "use", "transition", "in", "out", "animate", "class"]
//! ```
//!
//! `indent-offset` only sets the host markup step. Inside a script or
//! style region each nesting level uses the language's own `indent-offset`.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::Result;

/// How the body of a `<script>`/`<style>` region is indented relative to its tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagRelativeIndent {
    /// Body indents one step deeper than the enclosing tag
    #[default]
    Relative,
    /// Body aligns with the tag's own column
    NonRelative,
    /// Body starts at column 0 regardless of nesting
    Flush,
}

/// Configuration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Indentation policy for embedded regions
    pub tag_relative_indent: TagRelativeIndent,
    /// Host indentation step; region bodies use their language's own step
    pub indent_offset: usize,
    /// Tab width used when measuring existing indentation
    pub tab_width: usize,
    /// Tag `style="..."` attribute values as CSS regions
    pub inline_style_detection: bool,
    /// Keywords recognised after `{#`, `{:` and `{/`
    pub block_keywords: Vec<String>,
    /// Attribute prefixes whose values are script expressions
    pub directive_prefixes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag_relative_indent: TagRelativeIndent::Relative,
            indent_offset: 2,
            tab_width: 8,
            inline_style_detection: false,
            block_keywords: ["if", "else", "each", "await", "then", "catch", "as"]
                .into_iter()
                .map(String::from)
                .collect(),
            directive_prefixes: [
                "on",
                "bind",
                "use",
                "transition",
                "in",
                "out",
                "animate",
                "class",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".svelte-mode.toml"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".svelte-mode.toml"))
        }
    }

    /// Load configuration from file, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Config::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    /// Parse config file contents
    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.sanitize();
        Ok(config)
    }

    /// Clamp out-of-range values
    fn sanitize(&mut self) {
        self.indent_offset = self.indent_offset.clamp(1, 16);
        self.tab_width = self.tab_width.clamp(1, 16);
        self.block_keywords.retain(|k| !k.trim().is_empty());
        self.directive_prefixes.retain(|p| !p.trim().is_empty());
        let defaults = Config::default();
        if self.block_keywords.is_empty() {
            self.block_keywords = defaults.block_keywords;
        }
        if self.directive_prefixes.is_empty() {
            self.directive_prefixes = defaults.directive_prefixes;
        }
    }
}
