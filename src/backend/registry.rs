//! Backend registry
//!
//! Holds the table of known embedded languages. Each backend is loaded the
//! first time a region needs it, its variables are classified once, and
//! the result is shared by every document using the registry.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use tracing::{debug, warn};

use crate::error::{ModeError, Result};
use crate::host;
use crate::locals::{classify, Bindings, Capture};

use super::{
    css_engine, javascript_engine, scss_engine, typescript_engine, BackendId, Keymap, LanguageEngine,
};

/// Static description of an embedded language
#[derive(Clone)]
pub struct BackendSpec {
    /// Display name, also used to look backends up
    pub name: &'static str,
    /// Pattern matching the block element that opens a region
    pub open_pattern: &'static str,
    /// Literal text ending the region
    pub closing_delimiter: &'static str,
    /// Variables never captured from this backend
    pub excluded_locals: &'static [&'static str],
    pub load: fn() -> Result<Box<dyn LanguageEngine>>,
}

impl fmt::Debug for BackendSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSpec")
            .field("name", &self.name)
            .field("closing_delimiter", &self.closing_delimiter)
            .finish()
    }
}

/// Built-in languages, in opener priority order
///
/// TypeScript and SCSS come before the generic `<script>`/`<style>` rules
/// so a `lang` attribute wins when both match at the same place.
pub fn builtin_specs() -> Vec<BackendSpec> {
    vec![
        BackendSpec {
            name: "TypeScript",
            open_pattern: r#"(?i)<script\b[^>]*\blang\s*=\s*["']?(?:ts|typescript)\b[^>]*>"#,
            closing_delimiter: "</script>",
            excluded_locals: &["completion-at-point-functions"],
            load: typescript_engine,
        },
        BackendSpec {
            name: "JavaScript",
            open_pattern: r"(?i)<script\b[^>]*>",
            closing_delimiter: "</script>",
            excluded_locals: &[],
            load: javascript_engine,
        },
        BackendSpec {
            name: "SCSS",
            open_pattern: r#"(?i)<style\b[^>]*\blang\s*=\s*["']?(?:scss|postcss)\b[^>]*>"#,
            closing_delimiter: "</style>",
            excluded_locals: &[],
            load: scss_engine,
        },
        BackendSpec {
            name: "CSS",
            open_pattern: r"(?i)<style\b[^>]*>",
            closing_delimiter: "</style>",
            excluded_locals: &[],
            load: css_engine,
        },
    ]
}

/// A loaded backend with its captured variables
pub struct Backend {
    id: BackendId,
    name: &'static str,
    closing_delimiter: &'static str,
    engine: Box<dyn LanguageEngine>,
    crucial: Bindings,
    cosmetic: Bindings,
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("crucial", &self.crucial.len())
            .field("cosmetic", &self.cosmetic.len())
            .finish()
    }
}

impl Backend {
    pub fn id(&self) -> BackendId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn closing_delimiter(&self) -> &'static str {
        self.closing_delimiter
    }

    pub fn engine(&self) -> &dyn LanguageEngine {
        self.engine.as_ref()
    }

    pub fn keymap(&self) -> &Keymap {
        self.engine.keymap()
    }

    /// Variables swapped in whenever the cursor enters this backend's regions
    pub fn crucial(&self) -> &Bindings {
        &self.crucial
    }

    /// Variables installed only around indentation and fontification
    pub fn cosmetic(&self) -> &Bindings {
        &self.cosmetic
    }

    /// `base` with both captured sets installed on top
    pub fn scoped(&self, base: &Bindings) -> Bindings {
        base.overlaid(&self.crucial).overlaid(&self.cosmetic)
    }
}

/// Load a backend and capture its variables
///
/// Every variable the engine declares is classified by name. Crucial
/// variables the host defines but the engine leaves alone are captured
/// with the host's value, so switching between any two backends touches
/// the same set of names.
pub fn register_backend(id: BackendId, host: &Bindings, spec: &BackendSpec) -> Result<Backend> {
    let engine =
        (spec.load)().map_err(|e| ModeError::BackendUnavailable(format!("{}: {}", spec.name, e)))?;

    let mut crucial = Bindings::new();
    let mut cosmetic = Bindings::new();
    for (name, value) in engine.locals() {
        if spec.excluded_locals.contains(&name) {
            continue;
        }
        match classify(name) {
            Some(Capture::Crucial) => crucial.set(name, value),
            Some(Capture::Cosmetic) => cosmetic.set(name, value),
            None => {}
        }
    }

    for (name, value) in host.iter() {
        if classify(name) == Some(Capture::Crucial)
            && !crucial.contains(name)
            && !spec.excluded_locals.contains(&name)
        {
            crucial.set(name, value.clone());
        }
    }

    debug!(
        backend = spec.name,
        crucial = crucial.len(),
        cosmetic = cosmetic.len(),
        "registered backend"
    );

    Ok(Backend {
        id,
        name: spec.name,
        closing_delimiter: spec.closing_delimiter,
        engine,
        crucial,
        cosmetic,
    })
}

/// Table of embedded languages with lazily loaded backends
pub struct Registry {
    specs: Vec<BackendSpec>,
    host: Bindings,
    slots: Vec<OnceCell<Option<Arc<Backend>>>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.specs.iter().map(|s| s.name)).finish()
    }
}

static SHARED: Lazy<Arc<Registry>> =
    Lazy::new(|| Arc::new(Registry::with_specs(builtin_specs(), host::base_locals())));

impl Registry {
    /// Build a registry from an explicit table
    ///
    /// `host` holds the host variables used to fill in crucial names a
    /// backend does not set itself.
    pub fn with_specs(specs: Vec<BackendSpec>, host: Bindings) -> Self {
        let slots = specs.iter().map(|_| OnceCell::new()).collect();
        Self { specs, host, slots }
    }

    /// The process-wide registry of built-in languages
    pub fn shared() -> Arc<Registry> {
        Arc::clone(&SHARED)
    }

    /// Specs in priority order
    pub fn specs(&self) -> impl Iterator<Item = (BackendId, &BackendSpec)> {
        self.specs.iter().enumerate().map(|(i, spec)| (BackendId(i), spec))
    }

    pub fn spec(&self, id: BackendId) -> Option<&BackendSpec> {
        self.specs.get(id.0)
    }

    /// Find a backend by display name (case-insensitive)
    pub fn id_of(&self, name: &str) -> Option<BackendId> {
        self.specs
            .iter()
            .position(|spec| spec.name.eq_ignore_ascii_case(name))
            .map(BackendId)
    }

    pub fn name(&self, id: BackendId) -> &'static str {
        self.spec(id).map_or("unknown", |spec| spec.name)
    }

    /// The loaded backend for `id`, loading it on first use
    ///
    /// Returns `None` when the backend failed to load; the failure is
    /// logged once and remembered.
    pub fn backend(&self, id: BackendId) -> Option<Arc<Backend>> {
        let spec = self.specs.get(id.0)?;
        let slot = self.slots.get(id.0)?;
        slot.get_or_init(|| match register_backend(id, &self.host, spec) {
            Ok(backend) => Some(Arc::new(backend)),
            Err(e) => {
                warn!(backend = spec.name, error = %e, "backend unavailable, regions stay host text");
                None
            }
        })
        .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locals::Value;

    fn failing() -> Result<Box<dyn LanguageEngine>> {
        Err(ModeError::Message("not installed".into()))
    }

    #[test]
    fn test_builtin_order() {
        let registry = Registry::shared();
        let names: Vec<_> = registry.specs().map(|(_, s)| s.name).collect();
        assert_eq!(names, ["TypeScript", "JavaScript", "SCSS", "CSS"]);
        assert_eq!(registry.id_of("css"), Some(BackendId(3)));
    }

    #[test]
    fn test_capture_classifies_locals() {
        let host = host::base_locals();
        let spec = &builtin_specs()[1];
        let backend = register_backend(BackendId(1), &host, spec).unwrap();

        assert_eq!(backend.crucial().get_str("comment-start"), "// ");
        assert_eq!(backend.crucial().get("major-mode"), Some(&Value::Symbol("js-mode")));
        assert!(backend.cosmetic().contains("font-lock-defaults"));
        assert!(backend.cosmetic().contains("indent-line-function"));
        // Unclassified names are dropped
        assert!(!backend.crucial().contains("syntax-propertize-function"));
        assert!(!backend.cosmetic().contains("js-indent-level"));
    }

    #[test]
    fn test_excluded_locals_are_not_captured() {
        let host = host::base_locals();
        let spec = &builtin_specs()[0];
        let backend = register_backend(BackendId(0), &host, spec).unwrap();
        assert!(!backend.crucial().contains("completion-at-point-functions"));
    }

    #[test]
    fn test_host_fills_missing_crucial_names() {
        let host = host::base_locals();
        let css = register_backend(BackendId(3), &host, &builtin_specs()[3]).unwrap();
        // CSS never sets a sexp function; the host's value is captured instead
        assert_eq!(
            css.crucial().get("forward-sexp-function"),
            host.get("forward-sexp-function")
        );
    }

    #[test]
    fn test_every_backend_captures_the_same_crucial_names() {
        let registry = Registry::shared();
        let mut sets = registry
            .specs()
            .filter_map(|(id, spec)| {
                let backend = registry.backend(id)?;
                let mut names: Vec<String> = backend
                    .crucial()
                    .names()
                    .filter(|n| !spec.excluded_locals.contains(n))
                    .map(String::from)
                    .collect();
                names.retain(|n| registry.specs().all(|(_, s)| !s.excluded_locals.contains(&n.as_str())));
                Some(names)
            })
            .collect::<Vec<_>>();
        let first = sets.pop().unwrap();
        assert!(sets.iter().all(|s| *s == first));
    }

    #[test]
    fn test_failed_load_is_unavailable() {
        let mut specs = builtin_specs();
        specs[1].load = failing;
        let registry = Registry::with_specs(specs, host::base_locals());
        assert!(registry.backend(BackendId(1)).is_none());
        // Remembered, not retried
        assert!(registry.backend(BackendId(1)).is_none());
        assert!(registry.backend(BackendId(3)).is_some());
    }
}
