//! Host markup grammar (HTML with Svelte template syntax)

use crate::error::Result;
use crate::syntax::language::Grammar;
use crate::syntax::rules::{MultilineRule, PatternRule};
use crate::syntax::Face;

/// Create the host markup grammar
///
/// Template block keywords and directive prefixes come from the document
/// configuration.
pub fn markup_grammar(block_keywords: &[String], directive_prefixes: &[String]) -> Result<Grammar> {
    let mut grammar = Grammar::new("Svelte");

    // Comments
    grammar.add_multiline(MultilineRule::new("comment", r"<!--", r"-->", Face::Comment, 1)?);

    // Template blocks: {#if}, {:else}, {/each}, plus {@html} and friends
    let keywords = alternation(block_keywords);
    grammar.add_pattern(PatternRule::new(
        "block",
        &format!(r"\{{[#:/](?:{keywords})\b"),
        Face::Keyword,
        95,
    )?);
    grammar.add_pattern(PatternRule::new(
        "special_tag",
        r"\{@(?:html|debug|const|render)\b",
        Face::Keyword,
        94,
    )?);

    // Tag names, including <svelte:head> style names
    grammar.add_pattern(PatternRule::new("tag_name", r"</?[A-Za-z][\w.:-]*", Face::TagName, 90)?);

    // Directive attributes
    let prefixes = alternation(directive_prefixes);
    grammar.add_pattern(PatternRule::new(
        "directive",
        &format!(r"\b(?:{prefixes}):[\w.|-]+"),
        Face::Directive,
        85,
    )?);

    // Attribute values
    grammar.add_pattern(PatternRule::new("string", r#""[^"]*""#, Face::String, 80)?);

    // Plain attribute names
    grammar.add_pattern(PatternRule::new("attribute", r"\b[A-Za-z_][\w-]*=", Face::Attribute, 70)?);

    // Character entities
    grammar.add_pattern(PatternRule::new("entity", r"&(?:[A-Za-z]+|#\d+);", Face::Constant, 60)?);

    Ok(grammar)
}

pub(crate) fn alternation(words: &[String]) -> String {
    words
        .iter()
        .map(|w| regex::escape(w.trim()))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::syntax::LineState;

    fn grammar() -> Grammar {
        let config = Config::default();
        markup_grammar(&config.block_keywords, &config.directive_prefixes).unwrap()
    }

    #[test]
    fn test_tag_name() {
        let result = grammar().highlight_line("<style>", LineState::default());
        assert!(result.spans.iter().any(|s| s.start == 0 && s.face == Face::TagName));
    }

    #[test]
    fn test_block_keyword() {
        let result = grammar().highlight_line("{#if x}", LineState::default());
        assert!(result.spans.iter().any(|s| s.start == 0 && s.end == 4 && s.face == Face::Keyword));
    }

    #[test]
    fn test_directive() {
        let result = grammar().highlight_line("<input bind:value={name}>", LineState::default());
        assert!(result.spans.iter().any(|s| s.start == 7 && s.face == Face::Directive));
    }

    #[test]
    fn test_comment_spans_lines() {
        let result = grammar().highlight_line("<!-- <script>", LineState::default());
        assert!(result.end_state.is_open());
    }
}
