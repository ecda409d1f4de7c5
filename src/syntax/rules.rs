//! Regex rules a grammar is built from
//!
//! Pattern rules classify text within one line. Multi-line rules cover
//! constructs such as block comments and template strings whose end may
//! lie on a later line; the line state records which one is still open.

use regex::Regex;

use super::face::Face;
use crate::error::Result;

/// A face assigned to every match of a pattern
#[derive(Debug)]
pub struct PatternRule {
    pub name: String,
    pub pattern: Regex,
    pub face: Face,
    /// Rules with higher priority are tried first
    pub priority: i32,
}

impl PatternRule {
    pub fn new(name: &str, pattern: &str, face: Face, priority: i32) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            pattern: Regex::new(pattern)?,
            face,
            priority,
        })
    }

    /// First non-empty match at or after `start`
    ///
    /// The whole line is the haystack so anchors and word boundaries see
    /// the text before `start`.
    pub fn find_at(&self, text: &str, start: usize) -> Option<(usize, usize)> {
        if start >= text.len() {
            return None;
        }
        self.pattern
            .find_at(text, start)
            .filter(|m| !m.is_empty())
            .map(|m| (m.start(), m.end()))
    }
}

/// A construct delimited by an opening and a closing pattern
#[derive(Debug)]
pub struct MultilineRule {
    pub name: String,
    pub open: Regex,
    pub close: Regex,
    pub face: Face,
    /// Character that makes the following closer literal
    pub escape: Option<char>,
    /// Nonzero identifier carried in [`LineState::Open`]
    pub id: u8,
}

impl MultilineRule {
    pub fn new(name: &str, open: &str, close: &str, face: Face, id: u8) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            open: Regex::new(open)?,
            close: Regex::new(close)?,
            face,
            escape: None,
            id,
        })
    }

    pub fn escaped_by(mut self, escape: char) -> Self {
        self.escape = Some(escape);
        self
    }

    /// Where the construct next opens at or after `start`, as (start, end of opener)
    pub fn find_open(&self, text: &str, start: usize) -> Option<(usize, usize)> {
        if start >= text.len() {
            return None;
        }
        self.open.find_at(text, start).map(|m| (m.start(), m.end()))
    }

    /// End of the closer at or after `start`, skipping escaped closers
    pub fn find_close(&self, text: &str, start: usize) -> Option<usize> {
        if start > text.len() {
            return None;
        }
        let mut pos = start;
        while let Some(m) = self.close.find_at(text, pos) {
            let escaped = self.escape.is_some_and(|escape| {
                let run = text[start..m.start()].chars().rev().take_while(|&c| c == escape).count();
                run % 2 == 1
            });
            if !escaped {
                return Some(m.end());
            }
            pos = m.end();
        }
        None
    }
}

/// Lexical state at a line boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineState {
    #[default]
    Code,
    /// Inside the multi-line rule with this id
    Open(u8),
}

impl LineState {
    pub fn is_open(self) -> bool {
        matches!(self, LineState::Open(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_rule() {
        let rule = PatternRule::new("number", r"\d+", Face::Number, 50).unwrap();
        assert_eq!(rule.find_at("width: 120px", 0), Some((7, 10)));
        assert_eq!(rule.find_at("width: 120px", 8), Some((8, 10)));
        assert_eq!(rule.find_at("auto", 0), None);
    }

    #[test]
    fn test_pattern_rule_sees_context() {
        let rule = PatternRule::new("kw", r"\bif\b", Face::Keyword, 50).unwrap();
        assert_eq!(rule.find_at("{#elif x}", 4), None);
        assert_eq!(rule.find_at("{#if x}", 2), Some((2, 4)));
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        assert!(PatternRule::new("broken", r"(", Face::Keyword, 1).is_err());
    }

    #[test]
    fn test_markup_comment_rule() {
        let rule = MultilineRule::new("comment", r"<!--", r"-->", Face::Comment, 1).unwrap();
        assert_eq!(rule.find_open("<p><!-- x -->", 0), Some((3, 7)));
        assert_eq!(rule.find_close("<p><!-- x -->", 7), Some(13));
        assert_eq!(rule.find_close("<!-- open", 4), None);
    }

    #[test]
    fn test_escaped_closer_is_skipped() {
        let rule = MultilineRule::new("template", r"`", r"`", Face::String, 2)
            .unwrap()
            .escaped_by('\\');
        assert_eq!(rule.find_close(r"a`", 0), Some(2));
        assert_eq!(rule.find_close(r"a\`b`", 0), Some(5));
        assert_eq!(rule.find_close(r"a\\`", 0), Some(4));
    }

    #[test]
    fn test_line_state() {
        assert!(!LineState::default().is_open());
        assert!(LineState::Open(1).is_open());
    }
}
