//! End-to-end behaviour of a svelte document

use rstest::rstest;

use svelte_mode::backend::{builtin_specs, BackendSpec, LanguageEngine};
use svelte_mode::buffer::Buffer;
use svelte_mode::command::CommandStatus;
use svelte_mode::host;
use svelte_mode::locals::Value;
use svelte_mode::syntax::Face;
use svelte_mode::{Config, Document, ModeError, Registry, Tag, TagRelativeIndent};

fn doc(text: &str) -> Document {
    Document::new(text, Config::default()).unwrap()
}

fn with_policy(policy: TagRelativeIndent) -> Config {
    Config {
        tag_relative_indent: policy,
        ..Config::default()
    }
}

fn region_names(d: &mut Document) -> Vec<(String, &'static str)> {
    d.regions()
        .into_iter()
        .map(|(range, id)| (d.text()[range].to_string(), d.registry().name(id)))
        .collect()
}

#[test]
fn style_region_and_selector_face() {
    let text = "<style>\n.a{color:red;}\n</style>";
    let mut d = doc(text);

    let open_end = "<style>".len();
    let close_start = text.find("</style>").unwrap();
    let regions = d.regions();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].0, open_end..close_start);
    assert_eq!(d.registry().name(regions[0].1), "CSS");

    d.fontify_buffer();
    let selector = text.find(".a").unwrap();
    assert_eq!(d.face_at(selector), Face::Selector);
    assert_ne!(d.face_at(selector), Face::TagName);
}

#[test]
fn template_block_indentation() {
    let mut d = doc("{#if x}\n<p>y</p>\n{/if}");
    let len = d.len();
    d.indent_region(0..len).unwrap();
    assert_eq!(d.text(), "{#if x}\n  <p>y</p>\n{/if}");
}

#[test]
fn inline_style_needs_the_flag() {
    let text = "<div style=\"color:red\">";
    let inside = text.find("color").unwrap() + 2;

    let mut plain = doc(text);
    plain.goto(inside).unwrap();
    assert_eq!(plain.tag_at(inside), Tag::Host);
    assert_eq!(plain.locals().get_str("comment-start"), "<!-- ");

    let config = Config {
        inline_style_detection: true,
        ..Config::default()
    };
    let mut flagged = Document::new(text, config).unwrap();
    flagged.goto(inside).unwrap();
    let tag = flagged.tag_at(inside);
    assert_eq!(flagged.language_name(tag), "CSS");
    assert_eq!(flagged.locals().get_str("comment-start"), "/* ");
}

#[test]
fn directive_values_are_script() {
    let mut d = doc("<input bind:value={name} on:input=\"{() => n++}\">");
    let found = region_names(&mut d);
    assert_eq!(
        found,
        vec![
            ("name".to_string(), "JavaScript"),
            ("{() => n++}".to_string(), "JavaScript"),
        ]
    );
}

#[test]
fn unterminated_region_runs_to_end_of_document() {
    let text = "<p>x</p>\n<script>\nlet a = 1;\n";
    let mut d = doc(text);
    let regions = d.regions();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].0, text.find("<script>").unwrap() + 8..text.len());
}

#[test]
fn closing_the_region_later_retags_it() {
    let mut d = doc("<script>\nlet a = 1;\n<p>x</p>\n");
    assert_eq!(d.regions()[0].0.end, d.len());

    let at = d.text().find("<p>").unwrap();
    d.insert(at, "</script>\n").unwrap();
    let regions = d.regions();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].0, 8..at);
    assert_eq!(d.tag_at(d.len() - 3), Tag::Host);
}

#[rstest]
#[case::relative(TagRelativeIndent::Relative, 2)]
#[case::non_relative(TagRelativeIndent::NonRelative, 0)]
#[case::flush(TagRelativeIndent::Flush, 0)]
fn body_indent_under_column_zero_tag(#[case] policy: TagRelativeIndent, #[case] column: usize) {
    let mut d = Document::new("<script>\nlet a;\n</script>\n", with_policy(policy)).unwrap();
    d.set_point(9).unwrap();
    assert_eq!(d.indent_line().unwrap(), column);
}

#[rstest]
#[case::relative(TagRelativeIndent::Relative, 6)]
#[case::non_relative(TagRelativeIndent::NonRelative, 4)]
#[case::flush(TagRelativeIndent::Flush, 0)]
fn body_indent_under_nested_tag(#[case] policy: TagRelativeIndent, #[case] column: usize) {
    let text = "<div>\n  <section>\n    <style>\np {}\n    </style>\n  </section>\n</div>\n";
    let mut d = Document::new(text, with_policy(policy)).unwrap();
    d.set_point(text.find("p {}").unwrap()).unwrap();
    assert_eq!(d.indent_line().unwrap(), column);
}

#[rstest]
#[case::script("<script>\nlet a;\n</script>\n", "let a;", "// ", "")]
#[case::style("<style>\np {}\n</style>\n", "p {}", "/* ", " */")]
#[case::scss("<style lang=\"scss\">\np {}\n</style>\n", "p {}", "// ", "")]
#[case::host("<div>\n<p>x</p>\n</div>\n", "<p>x</p>", "<!-- ", " -->")]
fn comment_line_uses_region_syntax(
    #[case] text: &str,
    #[case] line: &str,
    #[case] start: &str,
    #[case] end: &str,
) {
    let mut d = doc(text);
    d.set_point(text.find(line).unwrap()).unwrap();
    d.comment_line().unwrap();
    assert!(d.text().contains(&format!("{start}{line}{end}")), "{}", d.text());
}

#[test]
fn leaving_a_region_restores_host_variables() {
    let text = "<p>a</p>\n<script>\nlet a;\n</script>\n<style>\np {}\n</style>\n";
    let mut d = doc(text);
    d.goto(0).unwrap();
    let before = d.locals().clone();

    d.goto(text.find("let").unwrap()).unwrap();
    assert_eq!(d.locals().get("major-mode"), Some(&Value::Symbol("js-mode")));
    d.goto(text.find("p {}").unwrap()).unwrap();
    assert_eq!(d.locals().get("major-mode"), Some(&Value::Symbol("css-mode")));
    d.goto(text.find("a</p>").unwrap()).unwrap();

    assert_eq!(d.locals(), &before);
}

#[test]
fn backend_keymap_shadows_host() {
    let text = "<p>x</p>\n<style>\np {}\n</style>\n";
    let mut d = doc(text);
    d.goto(0).unwrap();
    assert_eq!(d.lookup_key("C-c C-f"), Some("sgml-skip-tag-forward"));
    d.goto(text.find("p {}").unwrap()).unwrap();
    assert_eq!(d.lookup_key("C-c C-f"), Some("css-cycle-color-format"));
    // Unbound in the style keymap, found in the host's
    assert_eq!(d.lookup_key("C-c C-e"), Some("sgml-close-tag"));
}

#[test]
fn host_keys_run_tag_commands() {
    let mut d = doc("<p>x</p>\n");
    assert_eq!(d.press_key("C-c C-f").unwrap(), CommandStatus::Success);
    assert_eq!(d.point(), 8);
}

#[test]
fn unknown_command_is_an_error() {
    let mut d = doc("<p>x</p>");
    assert!(matches!(d.execute("no-such-command"), Err(ModeError::UnknownCommand(_))));
}

fn unavailable() -> svelte_mode::Result<Box<dyn LanguageEngine>> {
    Err(ModeError::Message("engine missing".into()))
}

#[test]
fn unavailable_backend_falls_back_to_host() {
    let specs: Vec<BackendSpec> = builtin_specs()
        .into_iter()
        .map(|mut spec| {
            if spec.name == "JavaScript" {
                spec.load = unavailable;
            }
            spec
        })
        .collect();
    let registry = std::sync::Arc::new(Registry::with_specs(specs, host::base_locals()));
    let text = "<script>\n// <style>\n</script>\n<style>\np {}\n</style>\n";
    let mut d = Document::with_registry(Buffer::from_text("t", text), Config::default(), registry).unwrap();

    let found = region_names(&mut d);
    assert_eq!(found, vec![("\np {}\n".to_string(), "CSS")]);

    d.goto(text.find("// ").unwrap()).unwrap();
    assert_eq!(d.locals().get_str("comment-start"), "<!-- ");
}

#[test]
fn typescript_lang_attribute() {
    let mut d = doc("<script lang=\"ts\">\nlet a: number = 1;\n</script>\n");
    let found = region_names(&mut d);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].1, "TypeScript");
    d.goto(20).unwrap();
    assert_eq!(d.locals().get("major-mode"), Some(&Value::Symbol("typescript-mode")));
}

#[test]
fn fontify_reports_extension() {
    let text = "<style>\n/* one\ntwo */\np {}\n</style>\n";
    let mut d = doc(text);
    let start = text.find("one").unwrap();
    let extended = d.fontify_region(start..start + 1, true).unwrap();
    assert!(extended.start <= text.find("/*").unwrap());
    assert!(extended.end >= text.find("two */").unwrap() + 6);
}
