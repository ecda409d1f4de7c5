//! Terminal styles and fontified spans

use super::face::Face;

/// The ANSI 16-color palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

/// How a face is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Color,
    pub bold: bool,
    pub italic: bool,
}

impl Style {
    pub const fn fg(color: Color) -> Self {
        Self {
            fg: color,
            bold: false,
            italic: false,
        }
    }

    pub const fn with_bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub const fn with_italic(self) -> Self {
        Self { italic: true, ..self }
    }

    /// Whether drawing with this style emits no escape codes
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// A face over the byte range `start..end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub face: Face,
}

impl Span {
    pub fn new(start: usize, end: usize, face: Face) -> Self {
        Self { start, end, face }
    }

    /// The same span `offset` bytes further on, e.g. from line to buffer offsets
    pub fn shifted(self, offset: usize) -> Self {
        Self::new(self.start + offset, self.end + offset, self.face)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}
