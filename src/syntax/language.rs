//! Grammars for fontification
//!
//! A grammar is the pattern and multi-line rules of one language. It
//! highlights a line given the state left by the previous line, and a
//! range of a region by replaying lines from the region start.

use std::ops::Range;

use super::rules::{LineState, MultilineRule, PatternRule};
use super::style::Span;

/// Spans of one line and the state carried into the next
#[derive(Debug)]
pub struct LineHighlight {
    pub spans: Vec<Span>,
    pub end_state: LineState,
}

/// A complete grammar for one language
#[derive(Debug)]
pub struct Grammar {
    /// Language name (e.g., "JavaScript", "CSS")
    pub name: String,
    /// Single-line pattern rules, sorted by priority (highest first)
    pub patterns: Vec<PatternRule>,
    /// Multi-line rules for comments, strings, etc.
    pub multiline_rules: Vec<MultilineRule>,
}

impl Grammar {
    /// Create a new empty grammar
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            patterns: Vec::new(),
            multiline_rules: Vec::new(),
        }
    }

    /// Add a pattern rule
    pub fn add_pattern(&mut self, rule: PatternRule) {
        self.patterns.push(rule);
        // Keep sorted by priority (highest first)
        self.patterns.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Add a multiline rule
    pub fn add_multiline(&mut self, rule: MultilineRule) {
        self.multiline_rules.push(rule);
    }

    fn multiline(&self, id: u8) -> Option<&MultilineRule> {
        self.multiline_rules.iter().find(|r| r.id == id)
    }

    /// Highlight a single line of text
    ///
    /// Takes the line text and the state from the previous line.
    /// Returns spans and the state for the next line.
    pub fn highlight_line(&self, text: &str, prev_state: LineState) -> LineHighlight {
        let mut spans = Vec::new();
        let mut pos = 0;
        let mut current_state = prev_state;

        while pos < text.len() {
            if let LineState::Open(id) = current_state {
                if let Some(rule) = self.multiline(id) {
                    if let Some(end_pos) = rule.find_close(text, pos) {
                        spans.push(Span::new(pos, end_pos, rule.face));
                        pos = end_pos;
                        current_state = LineState::default();
                        continue;
                    }
                    spans.push(Span::new(pos, text.len(), rule.face));
                    return LineHighlight {
                        spans,
                        end_state: current_state,
                    };
                }
                current_state = LineState::default();
            }

            // Multiline rule starting exactly here
            let opening = self
                .multiline_rules
                .iter()
                .find_map(|rule| match rule.find_open(text, pos) {
                    Some((start, end)) if start == pos => Some((end, rule)),
                    _ => None,
                });

            if let Some((end, rule)) = opening {
                if let Some(close_pos) = rule.find_close(text, end) {
                    spans.push(Span::new(pos, close_pos, rule.face));
                    pos = close_pos;
                    continue;
                }
                spans.push(Span::new(pos, text.len(), rule.face));
                return LineHighlight {
                    spans,
                    end_state: LineState::Open(rule.id),
                };
            }

            // Single-line patterns: a match at pos wins, otherwise skip to
            // the earliest match of any rule
            let mut best_match: Option<(usize, usize, &PatternRule)> = None;
            for rule in &self.patterns {
                if let Some((start, end)) = rule.find_at(text, pos) {
                    if start == pos {
                        best_match = Some((start, end, rule));
                        break;
                    }
                    if best_match.map_or(true, |(s, _, _)| start < s) {
                        best_match = Some((start, end, rule));
                    }
                }
            }

            // A multiline opener before the next pattern match must not be skipped
            let next_opener = self
                .multiline_rules
                .iter()
                .filter_map(|rule| rule.find_open(text, pos).map(|(s, _)| s))
                .min();

            match best_match {
                Some((start, end, rule)) if start == pos => {
                    spans.push(Span::new(start, end, rule.face));
                    pos = end;
                }
                Some((start, _, _)) => {
                    pos = next_opener.map_or(start, |o| o.min(start));
                }
                None => match next_opener {
                    Some(o) => pos = o,
                    None => break,
                },
            }
        }

        LineHighlight {
            spans,
            end_state: current_state,
        }
    }

    /// Highlight `range` of `text`
    ///
    /// Lexical state is tracked from `from` (the start of the enclosing
    /// region) and nothing at or past `limit` is read. Returns the spans in
    /// buffer offsets and the range actually covered: the covered range
    /// starts at the first line touching `range`, and grows past
    /// `range.end` while a multi-line construct is still open there.
    pub fn highlight_range(
        &self,
        text: &str,
        from: usize,
        range: Range<usize>,
        limit: usize,
    ) -> (Vec<Span>, Range<usize>) {
        let limit = limit.min(text.len());
        let mut spans = Vec::new();
        let mut covered = range.start..range.end.min(limit);
        let mut state = LineState::default();
        let mut line_start = from;

        while line_start < limit {
            let line_end = text[line_start..limit]
                .find('\n')
                .map_or(limit, |i| line_start + i);

            if line_start >= range.end && !state.is_open() {
                break;
            }

            let result = self.highlight_line(&text[line_start..line_end], state);
            if line_end >= range.start {
                spans.extend(result.spans.into_iter().map(|s| s.shifted(line_start)));
                covered.start = covered.start.min(line_start);
                covered.end = covered.end.max(line_end);
            }

            state = result.end_state;
            line_start = line_end + 1;
        }

        (spans, covered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Face;

    fn create_test_grammar() -> Grammar {
        let mut grammar = Grammar::new("Test");
        grammar.add_pattern(PatternRule::new("line_comment", r"//.*$", Face::Comment, 100).unwrap());
        grammar.add_pattern(PatternRule::new("number", r"\b\d+\b", Face::Number, 50).unwrap());
        grammar.add_multiline(
            MultilineRule::new("block_comment", r"/\*", r"\*/", Face::Comment, 1).unwrap(),
        );
        grammar
    }

    #[test]
    fn test_simple_highlighting() {
        let grammar = create_test_grammar();
        let result = grammar.highlight_line("let x = 42;", LineState::default());

        assert_eq!(result.end_state, LineState::Code);
        assert!(result.spans.iter().any(|s| s.start == 8 && s.end == 10));
    }

    #[test]
    fn test_line_comment() {
        let grammar = create_test_grammar();
        let result = grammar.highlight_line("code // comment", LineState::default());

        assert_eq!(result.end_state, LineState::Code);
        assert!(result.spans.iter().any(|s| s.start == 5 && s.face == Face::Comment));
    }

    #[test]
    fn test_multiline_start_after_text() {
        let grammar = create_test_grammar();
        let result = grammar.highlight_line("code /* comment", LineState::default());

        assert_eq!(result.end_state, LineState::Open(1));
    }

    #[test]
    fn test_multiline_end() {
        let grammar = create_test_grammar();
        let result = grammar.highlight_line("end */ 7", LineState::Open(1));

        assert_eq!(result.end_state, LineState::Code);
        assert!(result.spans.iter().any(|s| s.face == Face::Number));
    }

    #[test]
    fn test_range_uses_state_from_region_start() {
        let grammar = create_test_grammar();
        let text = "/* open\n12\nclose */ 3\n";
        // Line two sits inside the comment opened on line one
        let (spans, covered) = grammar.highlight_range(text, 0, 8..11, text.len());
        assert!(spans.iter().any(|s| s.start == 8 && s.face == Face::Comment));
        assert!(!spans.iter().any(|s| s.start == 8 && s.face == Face::Number));
        // The comment is still open at the end of the request
        assert!(covered.end > 11);
    }

    #[test]
    fn test_range_without_open_construct_is_not_extended() {
        let grammar = create_test_grammar();
        let text = "1\n2\n3\n";
        let (spans, covered) = grammar.highlight_range(text, 0, 2..4, text.len());
        assert_eq!(covered, 2..4);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 2);
    }
}
