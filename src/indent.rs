//! Indentation dispatch
//!
//! A line is indented by whichever language owns its first non-blank
//! character. Host lines use the markup rules directly. Lines inside a
//! region are handed to the region's backend with the text narrowed to
//! the region and an outer column taken from the host indentation at the
//! region start, adjusted by the configured tag-relative policy.

use std::ops::Range;

use crate::backend::{IndentRequest, Syntax, Tag};
use crate::buffer::{first_nonblank, is_blank_line, line_start, line_starts};
use crate::config::TagRelativeIndent;
use crate::document::Document;
use crate::error::Result;

/// Column the line starting at `line` should be indented to
pub fn compute_indentation(doc: &mut Document, line: usize) -> usize {
    let first = first_nonblank(doc.text(), line);
    let tag = doc.tag_at(first);
    let offset = doc.config.indent_offset;
    let tab_width = doc.config.tab_width;

    let backend = match tag {
        Tag::Host => None,
        Tag::Lang(id) => doc.registry.backend(id),
    };
    let Some(backend) = backend else {
        return doc.host.indent_line(doc.text(), &doc.tags, line, offset, tab_width);
    };

    let region_start = doc.tags.region(first).map_or(line, |(range, _)| range.start);
    let text = doc.buffer.text();
    let base = doc.host.calculate_indent(text, &doc.tags, region_start, offset, tab_width);
    let outer = match doc.config.tag_relative_indent {
        TagRelativeIndent::Relative => base,
        TagRelativeIndent::NonRelative => base.saturating_sub(offset),
        TagRelativeIndent::Flush => 0,
    };

    let literals: Vec<Range<usize>> = doc
        .props
        .iter_range(region_start..line)
        .filter(|(_, syntax)| *syntax == Syntax::Literal)
        .map(|(range, _)| range.start - region_start..range.end - region_start)
        .collect();
    let locals = backend.scoped(&doc.locals);

    backend.engine().indent_line(&IndentRequest {
        text: &text[region_start..],
        line_start: line.saturating_sub(region_start),
        outer,
        literals: &literals,
        locals: &locals,
    })
}

/// Indent the line starting at `line`, returning its new column
pub fn indent_line_at(doc: &mut Document, line: usize) -> Result<usize> {
    let column = compute_indentation(doc, line);
    doc.indent_line_to(line, column)?;
    Ok(column)
}

/// Reindent every non-blank line intersecting `range`
pub fn indent_region(doc: &mut Document, range: Range<usize>) -> Result<()> {
    let len = doc.len();
    let range = range.start.min(len)..range.end.min(len);
    let mut shift = 0isize;

    for start in line_starts(doc.text(), range) {
        let line = start.saturating_add_signed(shift);
        if is_blank_line(doc.text(), line) {
            continue;
        }
        let before = doc.len();
        indent_line_at(doc, line)?;
        shift += doc.len() as isize - before as isize;
    }
    Ok(())
}

/// Break the line at the cursor and indent the new line
pub fn newline_and_indent(doc: &mut Document) -> Result<usize> {
    let point = doc.point();
    doc.insert(point, "\n")?;
    let line = line_start(doc.text(), doc.point());
    indent_line_at(doc, line)
}
