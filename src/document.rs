//! Document session
//!
//! A document is one buffer in svelte mode: its text, the cursor, the
//! region tags and faces layered over the text, and the buffer-scoped
//! variables the editing commands read. Tags are computed lazily up to a
//! watermark and invalidated back to a safe restart point on every edit.

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::backend::{BackendId, Registry, Syntax, Tag};
use crate::buffer::{first_nonblank, line_end, line_start, whole_line_end, Buffer};
use crate::command::{self, CommandStatus};
use crate::config::Config;
use crate::error::{ModeError, Result};
use crate::fontify;
use crate::host::{self, HostEngine, HOST_NAME};
use crate::indent;
use crate::interval::IntervalMap;
use crate::locals::{Bindings, Value};
use crate::switch::{EditingContext, StateSwitch};
use crate::syntax::Face;
use crate::tagger::{TagScan, Tagger};

pub struct Document {
    pub(crate) buffer: Buffer,
    pub(crate) point: usize,
    pub(crate) tags: IntervalMap<Tag>,
    pub(crate) props: IntervalMap<Syntax>,
    pub(crate) faces: IntervalMap<Face>,
    pub(crate) locals: Bindings,
    pub(crate) host: HostEngine,
    pub(crate) registry: Arc<Registry>,
    pub(crate) config: Config,
    switch: StateSwitch,
    tagger: Tagger,
    /// Tags are valid for `[0, tagged_upto)`
    tagged_upto: usize,
    /// Scan state at `tagged_upto`
    resume: Option<TagScan>,
}

impl Document {
    /// Create a scratch document holding `text`
    pub fn new(text: &str, config: Config) -> Result<Self> {
        Self::with_registry(Buffer::from_text("*scratch*", text), config, Registry::shared())
    }

    /// Open a file in svelte mode
    pub fn open(path: &Path, config: Config) -> Result<Self> {
        let buffer = Buffer::from_file(path)?;
        Self::with_registry(buffer, config, Registry::shared())
    }

    /// Create a document using a specific backend registry
    pub fn with_registry(buffer: Buffer, config: Config, registry: Arc<Registry>) -> Result<Self> {
        let len = buffer.len();
        let mut locals = host::base_locals();
        locals.set("indent-offset", Value::Int(config.indent_offset as i64));
        locals.set("tab-width", Value::Int(config.tab_width as i64));

        Ok(Self {
            tagger: Tagger::new(&registry, &config)?,
            host: HostEngine::new(&config)?,
            buffer,
            point: 0,
            tags: IntervalMap::new(len, Tag::Host),
            props: IntervalMap::new(len, Syntax::Code),
            faces: IntervalMap::new(len, Face::Default),
            locals,
            registry,
            config,
            switch: StateSwitch::new(),
            tagged_upto: 0,
            resume: None,
        })
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Write the text back to the file it was opened from
    pub fn save(&mut self) -> Result<()> {
        self.buffer.save()?;
        debug!(name = self.buffer.name(), "saved");
        Ok(())
    }

    pub fn point(&self) -> usize {
        self.point
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Buffer-scoped variables as commands see them
    pub fn locals(&self) -> &Bindings {
        &self.locals
    }

    /// The editing context installed by the last command
    pub fn context(&self) -> &EditingContext {
        self.switch.context()
    }

    /// Display name of the language owning `tag`
    pub fn language_name(&self, tag: Tag) -> &'static str {
        match tag {
            Tag::Host => HOST_NAME,
            Tag::Lang(id) => self.registry.name(id),
        }
    }

    // ---- Tagging ----

    /// Tag of the character at `pos`; host at the end of the buffer
    pub fn tag_at(&mut self, pos: usize) -> Tag {
        self.ensure_tagged(pos.saturating_add(1));
        self.tags.get(pos).unwrap_or(Tag::Host)
    }

    /// The maximal run with a single tag containing `pos`
    pub fn region_at(&mut self, pos: usize) -> Option<(Range<usize>, Tag)> {
        self.ensure_tagged(pos.saturating_add(1));
        self.tags.region(pos)
    }

    /// Lexical class a backend gave the character at `pos`
    pub fn syntax_at(&mut self, pos: usize) -> Syntax {
        self.ensure_tagged(pos.saturating_add(1));
        self.props.get(pos).unwrap_or_default()
    }

    /// Every embedded region in the document
    pub fn regions(&mut self) -> Vec<(Range<usize>, BackendId)> {
        self.ensure_tagged(self.len());
        self.tags
            .iter()
            .filter_map(|(range, tag)| tag.backend().map(|id| (range, id)))
            .collect()
    }

    /// Recompute tags over `range`
    ///
    /// The scan starts from the closest safe point at or before
    /// `range.start` and runs to the end of the line containing `range.end`.
    pub fn retag(&mut self, range: Range<usize>) {
        let len = self.len();
        self.ensure_tagged(range.start.min(len));
        let start = self.restart_point(range.start.min(len));
        let end = chunk_end(self.text(), range.end.min(len)).max(start);

        let scan = self.tagger.retag(
            self.buffer.text(),
            &self.host,
            &self.registry,
            &mut self.tags,
            &mut self.props,
            start..end,
            None,
        );
        if end >= self.tagged_upto {
            self.tagged_upto = end;
            self.resume = Some(scan);
        }
    }

    /// Make tags valid for every position before `pos`
    ///
    /// Tagging advances whole lines at a time from the watermark.
    pub(crate) fn ensure_tagged(&mut self, pos: usize) {
        let len = self.len();
        let pos = pos.min(len);
        if pos <= self.tagged_upto {
            return;
        }
        let end = chunk_end(self.text(), pos);

        let resume = self.resume.take();
        let scan = self.tagger.retag(
            self.buffer.text(),
            &self.host,
            &self.registry,
            &mut self.tags,
            &mut self.props,
            self.tagged_upto..end,
            resume,
        );
        if let Some(id) = scan.open_backend() {
            trace!(upto = end, backend = self.registry.name(id), "region still open");
        }
        self.tagged_upto = end;
        self.resume = Some(scan);
    }

    /// Closest position at or before `pos` where a fresh scan is correct
    ///
    /// That is the start of the buffer or the start of a host run that
    /// begins with an end tag, i.e. right after an element region. The end
    /// tag must be complete before `pos` so an edit cannot reopen the region.
    fn restart_point(&self, pos: usize) -> usize {
        let text = self.text();
        let mut start = self.tags.previous_change(pos);
        while start > 0 {
            if self.tags.get(start) == Some(Tag::Host)
                && text[start..].starts_with("</")
                && text[start..pos].contains('>')
            {
                break;
            }
            start = self.tags.previous_change(start);
        }
        start
    }

    /// Drop tags from the restart point before an edit at `pos`
    fn invalidate(&mut self, pos: usize) {
        if pos > self.tagged_upto {
            return;
        }
        let start = self.restart_point(pos);
        if start < self.tagged_upto {
            debug!(from = start, watermark = self.tagged_upto, "invalidating tags");
            self.tagged_upto = start;
            self.resume = None;
        }
    }

    // ---- Editing ----

    fn check_boundary(&self, pos: usize) -> Result<()> {
        if pos > self.len() || !self.text().is_char_boundary(pos) {
            return Err(ModeError::InvalidPosition(pos));
        }
        Ok(())
    }

    /// Insert `s` at `pos`
    pub fn insert(&mut self, pos: usize, s: &str) -> Result<()> {
        self.check_boundary(pos)?;
        if s.is_empty() {
            return Ok(());
        }
        self.invalidate(pos);

        self.buffer.insert_str(pos, s);
        let n = s.len();
        self.tags.insert_gap(pos, n, Tag::Host);
        self.props.insert_gap(pos, n, Syntax::Code);
        self.faces.insert_gap(pos, n, Face::Default);
        if self.point >= pos {
            self.point += n;
        }
        Ok(())
    }

    /// Delete the text in `range`, returning it
    pub fn delete(&mut self, range: Range<usize>) -> Result<String> {
        self.check_boundary(range.start)?;
        self.check_boundary(range.end)?;
        if range.start >= range.end {
            return Ok(String::new());
        }
        self.invalidate(range.start);

        let deleted = self.buffer.delete_range(range.clone());
        self.tags.remove(range.clone());
        self.props.remove(range.clone());
        self.faces.remove(range.clone());
        if self.point >= range.end {
            self.point -= range.len();
        } else if self.point > range.start {
            self.point = range.start;
        }
        Ok(deleted)
    }

    /// Move the cursor without running a command
    pub fn set_point(&mut self, pos: usize) -> Result<()> {
        self.check_boundary(pos)?;
        self.point = pos;
        Ok(())
    }

    /// Replace the indentation of the line at `line` with `column` spaces
    pub(crate) fn indent_line_to(&mut self, line: usize, column: usize) -> Result<()> {
        let first = first_nonblank(self.text(), line);
        let wanted = " ".repeat(column);
        if self.text()[line..first] == wanted {
            return Ok(());
        }
        self.delete(line..first)?;
        self.insert(line, &wanted)
    }

    // ---- Commands ----

    /// Run `command` with the editing context synced before and after
    pub fn run_command<R>(&mut self, command: impl FnOnce(&mut Self) -> R) -> R {
        self.sync_context();
        let result = command(self);
        self.sync_context();
        result
    }

    fn sync_context(&mut self) {
        let tag = self.tag_at(self.point);
        self.switch.sync(tag, &mut self.locals, &self.registry);
    }

    /// Move the cursor as a command
    pub fn goto(&mut self, pos: usize) -> Result<()> {
        self.run_command(|doc| doc.set_point(pos))
    }

    /// Command bound to `key` in the active keymap
    ///
    /// The active backend's bindings shadow the host's.
    pub fn lookup_key(&self, key: &str) -> Option<&'static str> {
        self.switch
            .active_backend()
            .and_then(|backend| backend.keymap().lookup(key))
            .or_else(|| self.host.keymap().lookup(key))
    }

    /// Run the command bound to `key`
    pub fn press_key(&mut self, key: &str) -> Result<CommandStatus> {
        self.sync_context();
        let Some(name) = self.lookup_key(key) else {
            return Ok(CommandStatus::Failure);
        };
        self.execute(name)
    }

    /// Run a named command
    pub fn execute(&mut self, name: &str) -> Result<CommandStatus> {
        let command = command::lookup(name).ok_or_else(|| ModeError::UnknownCommand(name.to_string()))?;
        self.run_command(|doc| (command.function)(doc))
    }

    /// Indent the line containing the cursor, returning its new column
    pub fn indent_line(&mut self) -> Result<usize> {
        self.run_command(|doc| {
            let line = line_start(doc.text(), doc.point);
            indent::indent_line_at(doc, line)
        })
    }

    /// Reindent every line intersecting `range`
    pub fn indent_region(&mut self, range: Range<usize>) -> Result<()> {
        self.run_command(|doc| indent::indent_region(doc, range))
    }

    /// Insert a newline at the cursor and indent the new line
    pub fn newline_and_indent(&mut self) -> Result<usize> {
        self.run_command(indent::newline_and_indent)
    }

    /// Comment out the cursor's line with the active comment syntax
    pub fn comment_line(&mut self) -> Result<()> {
        self.run_command(|doc| {
            let line = line_start(doc.text(), doc.point);
            let start = doc.locals.get_str("comment-start").to_string();
            let end = doc.locals.get_str("comment-end").to_string();
            if start.is_empty() {
                return Err(ModeError::Message("No comment syntax is defined".into()));
            }

            let eol = line_end(doc.text(), line);
            if !end.is_empty() {
                doc.insert(eol, &end)?;
            }
            doc.insert(first_nonblank(doc.text(), line), &start)
        })
    }

    // ---- Fontification ----

    /// Fontify `range`; returns the range covered when it grew
    pub fn fontify_region(&mut self, range: Range<usize>, loudly: bool) -> Option<Range<usize>> {
        fontify::fontify_region(self, range, loudly)
    }

    pub fn fontify_buffer(&mut self) {
        let len = self.len();
        fontify::fontify_region(self, 0..len, false);
    }

    pub fn face_at(&self, pos: usize) -> Face {
        self.faces.get(pos).unwrap_or_default()
    }

    /// Runs of equal face over the whole text
    pub fn faces(&self) -> impl Iterator<Item = (Range<usize>, Face)> + '_ {
        self.faces.iter()
    }
}

/// End of the scan chunk covering `pos`
///
/// Whole lines, pushed past any tag still open at the line end so an
/// opener never straddles two chunks.
fn chunk_end(text: &str, pos: usize) -> usize {
    let mut end = whole_line_end(text, pos);
    while let Some(lt) = text[..end].rfind('<') {
        if text[lt..end].contains('>') {
            break;
        }
        match text[end..].find('>') {
            Some(gt) => end = whole_line_end(text, end + gt + 1),
            None => return text.len(),
        }
    }
    end
}
