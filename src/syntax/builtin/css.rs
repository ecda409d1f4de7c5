//! CSS and SCSS grammars

use crate::error::Result;
use crate::syntax::language::Grammar;
use crate::syntax::rules::{MultilineRule, PatternRule};
use crate::syntax::Face;

/// Create the CSS grammar
pub fn css_grammar() -> Result<Grammar> {
    let mut grammar = Grammar::new("CSS");
    add_common_rules(&mut grammar)?;
    Ok(grammar)
}

/// Create the SCSS grammar (CSS plus line comments, variables and mixins)
pub fn scss_grammar() -> Result<Grammar> {
    let mut grammar = Grammar::new("SCSS");
    add_common_rules(&mut grammar)?;

    grammar.add_pattern(PatternRule::new("line_comment", r"//.*$", Face::Comment, 100)?);
    grammar.add_pattern(PatternRule::new("variable", r"\$[A-Za-z_][\w-]*", Face::Variable, 88)?);
    grammar.add_pattern(PatternRule::new(
        "control",
        r"@(?:mixin|include|extend|use|forward|if|else|each|for|while|function|return)\b",
        Face::Keyword,
        87,
    )?);

    Ok(grammar)
}

fn add_common_rules(grammar: &mut Grammar) -> Result<()> {
    // Block comments
    grammar.add_multiline(MultilineRule::new("block_comment", r"/\*", r"\*/", Face::Comment, 1)?);

    // Strings
    grammar.add_pattern(PatternRule::new(
        "string",
        r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#,
        Face::String,
        90,
    )?);

    // Hex colors before selectors so `#fff` is not read as an id
    grammar.add_pattern(PatternRule::new("hex_color", r"#[0-9a-fA-F]{3,8}\b", Face::Number, 85)?);

    // At-rules
    grammar.add_pattern(PatternRule::new(
        "at_rule",
        r"@(?:media|import|keyframes|font-face|supports|charset|layer|container)\b",
        Face::Keyword,
        84,
    )?);

    // Property names
    grammar.add_pattern(PatternRule::new("property", r"\b-{0,2}[a-z][a-z0-9-]*\s*:", Face::Property, 80)?);

    // Svelte's :global() escape hatch and other pseudo-classes
    grammar.add_pattern(PatternRule::new("pseudo", r"::?[a-z][a-z-]*", Face::Keyword, 75)?);

    // Class and id selectors
    grammar.add_pattern(PatternRule::new("selector", r"[.#][A-Za-z_-][\w-]*", Face::Selector, 70)?);

    // Element selector lists opening a rule block
    grammar.add_pattern(PatternRule::new(
        "element_selector",
        r"^\s*[a-z][a-z0-9]*(?:\s*,\s*[a-z][a-z0-9]*)*\s*\{",
        Face::Selector,
        69,
    )?);

    // Functions
    grammar.add_pattern(PatternRule::new("function", r"\b[a-z-]+\(", Face::Function, 66)?);

    // Dimensions and numbers
    grammar.add_pattern(PatternRule::new(
        "number",
        r"-?\b\d+(?:\.\d+)?(?:px|em|rem|vh|vw|%|s|ms|deg|fr)?",
        Face::Number,
        65,
    )?);

    // Importance
    grammar.add_pattern(PatternRule::new("important", r"!important\b", Face::Keyword, 60)?);

    Ok(())
}
