//! Terminal output for documents
//!
//! Writes fontified text with ANSI styling, or a plain listing of the
//! document's regions.

use std::io::Write;

use crossterm::queue;
use crossterm::style::{Attribute, Color as TermColor, Print, ResetColor, SetAttribute, SetForegroundColor};

use crate::backend::Tag;
use crate::document::Document;
use crate::error::Result;
use crate::syntax::{Color, Style};

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Default => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::White => TermColor::Grey,
        Color::BrightBlack => TermColor::DarkGrey,
        Color::BrightRed => TermColor::Red,
        Color::BrightGreen => TermColor::Green,
        Color::BrightYellow => TermColor::Yellow,
        Color::BrightBlue => TermColor::Blue,
        Color::BrightMagenta => TermColor::Magenta,
        Color::BrightCyan => TermColor::Cyan,
        Color::BrightWhite => TermColor::White,
    }
}

fn apply_style(out: &mut impl Write, style: Style) -> Result<()> {
    queue!(out, SetForegroundColor(term_color(style.fg)))?;
    if style.bold {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.italic {
        queue!(out, SetAttribute(Attribute::Italic))?;
    }
    Ok(())
}

/// Write the document text styled by its faces
pub fn write_highlighted(out: &mut impl Write, doc: &Document) -> Result<()> {
    let text = doc.text();
    for (range, face) in doc.faces() {
        let style = face.default_style();
        if style.is_default() {
            queue!(out, Print(&text[range]))?;
            continue;
        }
        apply_style(out, style)?;
        queue!(out, Print(&text[range]), SetAttribute(Attribute::Reset), ResetColor)?;
    }
    out.flush()?;
    Ok(())
}

/// Write one line per tag run: its range, language and first line of text
pub fn write_regions(out: &mut impl Write, doc: &mut Document) -> Result<()> {
    let len = doc.len();
    doc.retag(0..len);
    let mut pos = 0;
    while pos < len {
        let Some((range, tag)) = doc.region_at(pos) else {
            break;
        };
        if let Tag::Lang(_) = tag {
            let body = &doc.text()[range.clone()];
            let preview = body.trim().lines().next().unwrap_or("");
            writeln!(
                out,
                "{:>6}..{:<6} {:<10} {}",
                range.start,
                range.end,
                doc.language_name(tag),
                preview
            )?;
        }
        pos = range.end;
    }
    out.flush()?;
    Ok(())
}
