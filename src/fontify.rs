//! Fontification dispatch
//!
//! A requested range is split at tag boundaries and each piece is
//! fontified by the language owning it, with the backend's variables
//! installed. Backends may fontify more than they were asked to; the union
//! of what they covered is reported back.

use std::ops::Range;

use tracing::info;

use crate::backend::Tag;
use crate::buffer::{line_start, whole_line_end};
use crate::document::Document;

/// Grow `range` to the smaller of its whole lines and its enclosing tag runs
pub fn extend_region(doc: &mut Document, range: Range<usize>) -> Range<usize> {
    let len = doc.len();
    let start = range.start.min(len);
    let end = range.end.min(len).max(start);
    doc.ensure_tagged(whole_line_end(doc.text(), end));

    let text = doc.text();
    let line_begin = line_start(text, start);
    let run_begin = doc.tags.region(start).map_or(start, |(run, _)| run.start);

    let line_finish = whole_line_end(text, end);
    let run_finish = if end > start {
        doc.tags.region(end - 1).map_or(end, |(run, _)| run.end)
    } else {
        end
    };

    line_begin.max(run_begin)..line_finish.min(run_finish).max(end)
}

/// Fontify `range`, returning the covered range when it differs from the request
///
/// The request is first grown by [`extend_region`], so a range starting
/// mid-token is fontified from its line or region start.
pub fn fontify_region(doc: &mut Document, range: Range<usize>, loudly: bool) -> Option<Range<usize>> {
    let len = doc.len();
    let requested = range.start.min(len)..range.end.min(len);
    if requested.is_empty() {
        return None;
    }
    let grown = extend_region(doc, requested.clone());

    let mut covered = grown.clone();
    let mut pos = grown.start;
    while pos < grown.end {
        let Some((run, tag)) = doc.tags.region(pos) else {
            break;
        };
        let piece = pos..run.end.min(grown.end);
        let text = doc.buffer.text();

        let backend = tag.backend().and_then(|id| doc.registry.backend(id));
        let fontified = match &backend {
            Some(backend) => {
                let locals = backend.scoped(&doc.locals);
                backend.engine().fontify(text, piece.clone(), run.clone(), &locals)
            }
            None => doc.host.fontify(text, piece.clone(), run.clone()),
        };

        if loudly {
            info!(
                language = doc.language_name(if backend.is_some() { tag } else { Tag::Host }),
                start = piece.start,
                end = piece.end,
                "fontifying"
            );
        }

        doc.faces.assign(fontified.range.clone(), crate::syntax::Face::Default);
        for span in fontified.spans.iter().filter(|s| !s.is_empty()) {
            doc.faces.assign(span.start..span.end, span.face);
        }
        covered.start = covered.start.min(fontified.range.start);
        covered.end = covered.end.max(fontified.range.end);
        pos = piece.end;
    }

    (covered != requested).then_some(covered)
}
