//! Bracket-driven language engine
//!
//! Curly-brace languages share one engine: a fontification grammar plus a
//! syntax table, indenting each line by its bracket depth inside the
//! region.

use std::ops::Range;

use crate::locals::{Bindings, Value};
use crate::syntax::{Face, Grammar};

use super::{Fontified, IndentRequest, Keymap, LanguageEngine, SyntaxTable};

/// Default step when the buffer does not say otherwise
const DEFAULT_OFFSET: usize = 2;

pub struct BracketEngine {
    name: &'static str,
    grammar: Grammar,
    table: SyntaxTable,
    keymap: Keymap,
    locals: Vec<(&'static str, Value)>,
}

impl BracketEngine {
    pub fn new(
        name: &'static str,
        grammar: Grammar,
        table: SyntaxTable,
        keymap: Keymap,
        locals: Vec<(&'static str, Value)>,
    ) -> Self {
        Self {
            name,
            grammar,
            table,
            keymap,
            locals,
        }
    }
}

impl LanguageEngine for BracketEngine {
    fn name(&self) -> &'static str {
        self.name
    }

    fn syntax_table(&self) -> &SyntaxTable {
        &self.table
    }

    fn indent_line(&self, request: &IndentRequest<'_>) -> usize {
        let offset = request
            .locals
            .get_int("indent-offset")
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(DEFAULT_OFFSET);

        let line_start = request.line_start.min(request.text.len());
        let mut depth = self.table.depth_at(request.text, line_start, request.literals);

        // A line opening with a closer belongs to the outer level
        let first = request.text[line_start..]
            .chars()
            .find(|c| *c != ' ' && *c != '\t');
        if first.is_some_and(|c| self.table.close_brackets.contains(c)) {
            depth = depth.saturating_sub(1);
        }

        request.outer + depth * offset
    }

    fn fontify(&self, text: &str, range: Range<usize>, bounds: Range<usize>, locals: &Bindings) -> Fontified {
        let (mut spans, covered) = self.grammar.highlight_range(text, bounds.start, range, bounds.end);

        // Level 1 decoration: only comments, strings and keywords
        if locals
            .get_int("font-lock-maximum-decoration")
            .is_some_and(|level| level <= 1)
        {
            spans.retain(|s| matches!(s.face, Face::Comment | Face::String | Face::Keyword));
        }

        Fontified { spans, range: covered }
    }

    fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    fn locals(&self) -> Vec<(&'static str, Value)> {
        self.locals.clone()
    }
}
