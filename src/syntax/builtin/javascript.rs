//! JavaScript and TypeScript grammars

use crate::error::Result;
use crate::syntax::language::Grammar;
use crate::syntax::rules::{MultilineRule, PatternRule};
use crate::syntax::Face;

const KEYWORDS: &str = r"\b(async|await|break|case|catch|class|const|continue|debugger|default|delete|do|else|export|extends|finally|for|from|function|if|import|in|instanceof|let|new|of|return|static|super|switch|this|throw|try|typeof|var|void|while|with|yield)\b";

const TYPESCRIPT_KEYWORDS: &str = r"\b(abstract|as|declare|enum|implements|interface|keyof|namespace|private|protected|public|readonly|satisfies|type)\b";

/// Create the JavaScript grammar
pub fn javascript_grammar() -> Result<Grammar> {
    let mut grammar = Grammar::new("JavaScript");
    add_common_rules(&mut grammar)?;
    Ok(grammar)
}

/// Create the TypeScript grammar (JavaScript plus type-level syntax)
pub fn typescript_grammar() -> Result<Grammar> {
    let mut grammar = Grammar::new("TypeScript");
    add_common_rules(&mut grammar)?;

    grammar.add_pattern(PatternRule::new("ts_keyword", TYPESCRIPT_KEYWORDS, Face::Keyword, 79)?);

    // Type annotations after a colon
    grammar.add_pattern(PatternRule::new(
        "type_annotation",
        r"\b(string|number|boolean|unknown|never|any|object|bigint|symbol)\b",
        Face::Type,
        76,
    )?);

    Ok(grammar)
}

fn add_common_rules(grammar: &mut Grammar) -> Result<()> {
    // Block comments
    grammar.add_multiline(MultilineRule::new("block_comment", r"/\*", r"\*/", Face::Comment, 1)?);

    // Template literals span lines
    grammar.add_multiline(MultilineRule::new("template", r"`", r"`", Face::String, 2)?.escaped_by('\\'));

    // Line comments
    grammar.add_pattern(PatternRule::new("line_comment", r"//.*$", Face::Comment, 100)?);

    // Strings
    grammar.add_pattern(PatternRule::new(
        "string",
        r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#,
        Face::String,
        90,
    )?);

    // Keywords
    grammar.add_pattern(PatternRule::new("keyword", KEYWORDS, Face::Keyword, 80)?);

    // Literal names
    grammar.add_pattern(PatternRule::new(
        "constant",
        r"\b(true|false|null|undefined|NaN|Infinity)\b",
        Face::Constant,
        78,
    )?);

    // Svelte reactive label
    grammar.add_pattern(PatternRule::new("reactive", r"^\s*\$:", Face::Keyword, 77)?);

    // Class-like names
    grammar.add_pattern(PatternRule::new("type", r"\b[A-Z][A-Za-z0-9_]*\b", Face::Type, 70)?);

    // Function calls and declarations
    grammar.add_pattern(PatternRule::new(
        "function",
        r"\b[a-z_$][A-Za-z0-9_$]*\s*\(",
        Face::Function,
        60,
    )?);

    // Numbers
    grammar.add_pattern(PatternRule::new("hex", r"\b0[xX][0-9a-fA-F_]+n?\b", Face::Number, 65)?);
    grammar.add_pattern(PatternRule::new(
        "number",
        r"\b\d[\d_]*(?:\.\d+)?(?:[eE][+-]?\d+)?n?\b",
        Face::Number,
        64,
    )?);

    // Operators
    grammar.add_pattern(PatternRule::new(
        "operator",
        r"=>|[+\-*/%&|^!<>=~?]+",
        Face::Operator,
        40,
    )?);

    Ok(())
}
