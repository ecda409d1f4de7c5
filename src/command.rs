//! Command dispatch
//!
//! Named commands reachable from the keymaps. Every command runs through
//! [`Document::run_command`], so it sees the variables of the region the
//! cursor is in.

use crate::backend::{cycle_color_format, find_definition, Tag};
use crate::document::Document;
use crate::error::Result;

/// Command result status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure,
}

/// Command function signature
pub type CommandFn = fn(&mut Document) -> Result<CommandStatus>;

/// A named command
pub struct Command {
    pub name: &'static str,
    pub function: CommandFn,
}

static COMMANDS: &[Command] = &[
    Command {
        name: "indent-for-tab-command",
        function: indent_for_tab,
    },
    Command {
        name: "newline-and-indent",
        function: newline_and_indent,
    },
    Command {
        name: "indent-buffer",
        function: indent_buffer,
    },
    Command {
        name: "comment-line",
        function: comment_line,
    },
    Command {
        name: "font-lock-fontify-buffer",
        function: fontify_buffer,
    },
    // Host markup
    Command {
        name: "sgml-skip-tag-forward",
        function: skip_tag_forward,
    },
    Command {
        name: "sgml-skip-tag-backward",
        function: skip_tag_backward,
    },
    Command {
        name: "sgml-close-tag",
        function: close_tag,
    },
    // Embedded languages
    Command {
        name: "js-find-symbol",
        function: js_find_symbol,
    },
    Command {
        name: "css-cycle-color-format",
        function: css_cycle_color_format,
    },
];

/// Look up a command by name
pub fn lookup(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// Get all command names (sorted)
pub fn command_names() -> Vec<&'static str> {
    let mut names: Vec<_> = COMMANDS.iter().map(|c| c.name).collect();
    names.sort_unstable();
    names
}

fn moved_to(doc: &mut Document, target: Option<usize>) -> Result<CommandStatus> {
    match target {
        Some(pos) => {
            doc.set_point(pos)?;
            Ok(CommandStatus::Success)
        }
        None => Ok(CommandStatus::Failure),
    }
}

fn indent_for_tab(doc: &mut Document) -> Result<CommandStatus> {
    let line = crate::buffer::line_start(doc.text(), doc.point());
    crate::indent::indent_line_at(doc, line)?;
    Ok(CommandStatus::Success)
}

fn newline_and_indent(doc: &mut Document) -> Result<CommandStatus> {
    crate::indent::newline_and_indent(doc)?;
    Ok(CommandStatus::Success)
}

fn indent_buffer(doc: &mut Document) -> Result<CommandStatus> {
    let len = doc.len();
    crate::indent::indent_region(doc, 0..len)?;
    Ok(CommandStatus::Success)
}

fn comment_line(doc: &mut Document) -> Result<CommandStatus> {
    doc.comment_line()?;
    Ok(CommandStatus::Success)
}

fn fontify_buffer(doc: &mut Document) -> Result<CommandStatus> {
    doc.fontify_buffer();
    Ok(CommandStatus::Success)
}

fn skip_tag_forward(doc: &mut Document) -> Result<CommandStatus> {
    doc.ensure_tagged(doc.len());
    let target = doc.host.skip_tag_forward(doc.text(), &doc.tags, doc.point());
    moved_to(doc, target)
}

fn skip_tag_backward(doc: &mut Document) -> Result<CommandStatus> {
    doc.ensure_tagged(doc.len());
    let target = doc.host.skip_tag_backward(doc.text(), &doc.tags, doc.point());
    moved_to(doc, target)
}

fn close_tag(doc: &mut Document) -> Result<CommandStatus> {
    let point = doc.point();
    doc.ensure_tagged(point);
    let closer = doc
        .host
        .close_tag_at(doc.text(), &doc.tags, point, doc.config.tab_width);
    let Some(closer) = closer else {
        return Ok(CommandStatus::Failure);
    };
    doc.insert(point, &closer)?;
    Ok(CommandStatus::Success)
}

/// Jump to the declaration of the identifier at point
///
/// Every script region is searched, so a directive value can find a
/// function declared in the `<script>` block.
fn js_find_symbol(doc: &mut Document) -> Result<CommandStatus> {
    let point = doc.point();
    if doc.tag_at(point).is_host() && doc.tag_at(point.saturating_sub(1)).is_host() {
        return Ok(CommandStatus::Failure);
    }
    let scopes: Vec<_> = doc
        .regions()
        .into_iter()
        .filter(|(_, id)| matches!(doc.language_name(Tag::Lang(*id)), "JavaScript" | "TypeScript"))
        .map(|(range, _)| range)
        .collect();
    let target = find_definition(doc.text(), &scopes, point)?;
    moved_to(doc, target)
}

fn css_cycle_color_format(doc: &mut Document) -> Result<CommandStatus> {
    let point = doc.point();
    let Some((range, replacement)) = cycle_color_format(doc.text(), point)? else {
        return Ok(CommandStatus::Failure);
    };
    doc.delete(range.clone())?;
    doc.insert(range.start, &replacement)?;
    doc.set_point(range.start)?;
    Ok(CommandStatus::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Registry;
    use crate::config::Config;
    use crate::host::HOST_KEYMAP;

    fn doc(text: &str) -> Document {
        Document::new(text, Config::default()).unwrap()
    }

    #[test]
    fn test_lookup() {
        assert!(lookup("comment-line").is_some());
        assert!(lookup("sgml-skip-tag-forward").is_some());
        assert!(lookup("js-eval-defun").is_none());
        assert_eq!(command_names().len(), COMMANDS.len());
    }

    #[test]
    fn test_every_binding_has_a_command() {
        let registry = Registry::shared();
        let mut names: Vec<&str> = HOST_KEYMAP.commands().collect();
        for (id, _) in registry.specs() {
            let backend = registry.backend(id).unwrap();
            names.extend(backend.keymap().commands());
        }
        for name in names {
            assert!(lookup(name).is_some(), "{name} is bound but not defined");
        }
    }

    #[test]
    fn test_tab_indents_in_any_region() {
        let mut doc = doc("<script>\nlet a;\n</script>\n");
        doc.set_point(10).unwrap();
        // The script keymap does not bind TAB; the host binding applies
        assert_eq!(doc.press_key("TAB").unwrap(), CommandStatus::Success);
        assert_eq!(doc.text(), "<script>\n  let a;\n</script>\n");
    }

    #[test]
    fn test_skip_tag_keys() {
        let text = "<p>x</p>\n<div><b>y</b></div>\n";
        let mut doc = doc(text);
        assert_eq!(doc.press_key("C-c C-f").unwrap(), CommandStatus::Success);
        assert_eq!(doc.point(), 8);
        assert_eq!(doc.press_key("C-c C-f").unwrap(), CommandStatus::Success);
        assert_eq!(doc.point(), text.rfind('>').unwrap() + 1);
        assert_eq!(doc.press_key("C-c C-b").unwrap(), CommandStatus::Success);
        assert_eq!(doc.point(), 9);
        assert_eq!(doc.press_key("C-c C-b").unwrap(), CommandStatus::Success);
        assert_eq!(doc.point(), 0);
        assert_eq!(doc.press_key("C-c C-b").unwrap(), CommandStatus::Failure);
    }

    #[test]
    fn test_close_tag_inserts_end_tag() {
        let mut doc = doc("<ul>\n  <li>one");
        let len = doc.len();
        doc.set_point(len).unwrap();
        assert_eq!(doc.press_key("C-c C-e").unwrap(), CommandStatus::Success);
        assert_eq!(doc.text(), "<ul>\n  <li>one</li>");
        assert_eq!(doc.point(), doc.len());
    }

    #[test]
    fn test_find_symbol_from_directive() {
        let text = "<script>\nfunction go() {}\n</script>\n<a on:click={go}>x</a>\n";
        let mut doc = doc(text);
        doc.set_point(text.rfind("go").unwrap()).unwrap();
        assert_eq!(doc.press_key("M-.").unwrap(), CommandStatus::Success);
        assert_eq!(doc.point(), text.find("go").unwrap());
    }

    #[test]
    fn test_cycle_color_in_style() {
        let text = "<style>\np { color: #fff; }\n</style>\n";
        let mut doc = doc(text);
        doc.set_point(text.find("#fff").unwrap() + 1).unwrap();
        assert_eq!(doc.press_key("C-c C-f").unwrap(), CommandStatus::Success);
        assert!(doc.text().contains("color: rgb(255, 255, 255);"));
        assert_eq!(doc.press_key("C-c C-f").unwrap(), CommandStatus::Success);
        assert!(doc.text().contains("color: #ffffff;"));
    }
}
