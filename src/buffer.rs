//! Buffer representation - the document text with its file metadata
//!
//! Positions are byte offsets into the text and always sit on character
//! boundaries. The free functions below answer line questions about any
//! text slice, so language engines can use them on narrowed text too.

use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use unicode_width::UnicodeWidthChar;

/// A buffer containing text and metadata
#[derive(Debug, Default)]
pub struct Buffer {
    text: String,
    /// Buffer name (e.g., "App.svelte", "*scratch*")
    name: String,
    /// Associated file path (None for unnamed buffers)
    filename: Option<PathBuf>,
    /// Whether buffer has unsaved changes
    modified: bool,
}

impl Buffer {
    /// Create a new empty buffer with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a named buffer holding `text`
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self {
            text: text.to_string(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a buffer from file contents
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());

        Ok(Self {
            text,
            name,
            filename: Some(path.to_path_buf()),
            modified: false,
        })
    }

    /// Get buffer name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get filename if set
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Check if buffer is modified
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Insert text at a byte position
    pub fn insert_str(&mut self, pos: usize, s: &str) {
        self.text.insert_str(pos, s);
        self.modified = true;
    }

    /// Delete a byte range, returns the deleted text
    pub fn delete_range(&mut self, range: Range<usize>) -> String {
        let deleted: String = self.text.drain(range).collect();
        if !deleted.is_empty() {
            self.modified = true;
        }
        deleted
    }

    /// Write buffer to its file
    pub fn save(&mut self) -> io::Result<()> {
        let Some(path) = self.filename.clone() else {
            return Err(io::Error::new(io::ErrorKind::NotFound, "No filename set"));
        };
        self.write_to(&path)?;
        self.modified = false;
        Ok(())
    }

    /// Write buffer to specific path
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, &self.text)
    }
}

/// Start of the line containing `pos`
pub fn line_start(text: &str, pos: usize) -> usize {
    let pos = pos.min(text.len());
    text.as_bytes()[..pos]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1)
}

/// End of the line containing `pos`, excluding the newline
pub fn line_end(text: &str, pos: usize) -> usize {
    let pos = pos.min(text.len());
    text.as_bytes()[pos..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(text.len(), |i| pos + i)
}

/// First line boundary at or after `pos`
///
/// Returns `pos` itself when it already starts a line, otherwise the start
/// of the next line (or the end of the text).
pub fn whole_line_end(text: &str, pos: usize) -> usize {
    let pos = pos.min(text.len());
    if pos == 0 || text.as_bytes()[pos - 1] == b'\n' {
        return pos;
    }
    match text.as_bytes()[pos..].iter().position(|&b| b == b'\n') {
        Some(i) => pos + i + 1,
        None => text.len(),
    }
}

/// Position of the first non-blank character on the line starting at `line_start`
pub fn first_nonblank(text: &str, line_start: usize) -> usize {
    let end = line_end(text, line_start);
    text[line_start..end]
        .find(|c: char| c != ' ' && c != '\t')
        .map_or(end, |i| line_start + i)
}

/// Text of the line starting at `line_start`, without its newline
pub fn line_text(text: &str, line_start: usize) -> &str {
    &text[line_start..line_end(text, line_start)]
}

/// Check if a line holds only whitespace
pub fn is_blank_line(text: &str, line_start: usize) -> bool {
    line_text(text, line_start).trim().is_empty()
}

/// Start of the closest non-blank line before the one at `line_start`
pub fn previous_nonblank_line(text: &str, line_start: usize) -> Option<usize> {
    let mut start = line_start;
    while start > 0 {
        start = self::line_start(text, start - 1);
        if !is_blank_line(text, start) {
            return Some(start);
        }
    }
    None
}

/// Display column of `pos`, expanding tabs to `tab_width` stops
pub fn column_at(text: &str, pos: usize, tab_width: usize) -> usize {
    let start = line_start(text, pos);
    let tab_width = tab_width.max(1);
    text[start..pos.min(text.len())].chars().fold(0, |col, ch| {
        if ch == '\t' {
            (col / tab_width + 1) * tab_width
        } else {
            col + UnicodeWidthChar::width(ch).unwrap_or(0)
        }
    })
}

/// Current indentation of the line starting at `line_start`, in columns
pub fn indentation(text: &str, line_start: usize, tab_width: usize) -> usize {
    column_at(text, first_nonblank(text, line_start), tab_width)
}

/// Starts of every line intersecting `range`
pub fn line_starts(text: &str, range: Range<usize>) -> Vec<usize> {
    let mut starts = vec![line_start(text, range.start)];
    let end = range.end.min(text.len());
    for (i, b) in text.as_bytes()[range.start.min(end)..end].iter().enumerate() {
        if *b == b'\n' && range.start + i + 1 < end {
            starts.push(range.start + i + 1);
        }
    }
    starts
}
