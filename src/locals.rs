//! Buffer-scoped variables
//!
//! Every document carries a set of named settings (comment syntax,
//! indentation entry points, mode identity, ...) that editing commands read
//! directly. Language backends declare their own values for these, split
//! into a crucial subset that is swapped whenever the cursor changes region
//! and a cosmetic subset only installed around indentation and
//! fontification.

use std::collections::BTreeMap;
use std::fmt;

/// Value of a buffer-scoped variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    /// Name of a function or mode
    Symbol(&'static str),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(s.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Symbol(s) => write!(f, "{s}"),
        }
    }
}

/// Name prefixes of variables that must be active for every command
pub const CRUCIAL_PREFIXES: &[&str] = &[
    "comment-",
    "uncomment-",
    "electric-indent-",
    "smie-",
    "forward-sexp-function",
    "completion-",
    "major-mode",
];

/// Name prefixes of variables only needed while indenting or fontifying
pub const COSMETIC_PREFIXES: &[&str] = &["font-lock-", "indent-"];

/// How a variable is captured from a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Crucial,
    Cosmetic,
}

/// Classify a variable name against the fixed prefix rule-sets
pub fn classify(name: &str) -> Option<Capture> {
    if CRUCIAL_PREFIXES.iter().any(|p| name.starts_with(p)) {
        Some(Capture::Crucial)
    } else if COSMETIC_PREFIXES.iter().any(|p| name.starts_with(p)) {
        Some(Capture::Cosmetic)
    } else {
        None
    }
}

/// A set of variable bindings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    vars: BTreeMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// String value of a variable, empty when unset
    pub fn get_str(&self, name: &str) -> &str {
        self.get(name).and_then(Value::as_str).unwrap_or("")
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Install every binding into `target`
    pub fn apply_to(&self, target: &mut Bindings) {
        for (name, value) in &self.vars {
            target.vars.insert(name.clone(), value.clone());
        }
    }

    /// A copy of `self` with `overlay` installed on top
    pub fn overlaid(&self, overlay: &Bindings) -> Bindings {
        let mut merged = self.clone();
        overlay.apply_to(&mut merged);
        merged
    }
}

impl FromIterator<(&'static str, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (&'static str, Value)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("comment-start"), Some(Capture::Crucial));
        assert_eq!(classify("major-mode"), Some(Capture::Crucial));
        assert_eq!(classify("forward-sexp-function"), Some(Capture::Crucial));
        assert_eq!(classify("font-lock-defaults"), Some(Capture::Cosmetic));
        assert_eq!(classify("indent-line-function"), Some(Capture::Cosmetic));
        assert_eq!(classify("syntax-propertize-function"), None);
    }

    #[test]
    fn test_overlay() {
        let base: Bindings = [("comment-start", Value::str("<!-- ")), ("tab-width", Value::Int(8))]
            .into_iter()
            .collect();
        let overlay: Bindings = [("comment-start", Value::str("// "))].into_iter().collect();
        let merged = base.overlaid(&overlay);
        assert_eq!(merged.get_str("comment-start"), "// ");
        assert_eq!(merged.get_int("tab-width"), Some(8));
        // The base is untouched
        assert_eq!(base.get_str("comment-start"), "<!-- ");
    }

    #[test]
    fn test_missing_string_is_empty() {
        assert_eq!(Bindings::new().get_str("comment-end"), "");
    }
}
