//! Region tagging
//!
//! Scans host text for region openers, finds each region's closer and
//! tags every position in between with the region's backend. Tagging can
//! stop at any line boundary and pick up later from a [`TagScan`], so a
//! document only ever tags as far as something has asked about.

use std::ops::Range;

use regex::{Match, Regex};
use tracing::{debug, trace};

use crate::backend::{BackendId, Registry, Syntax, Tag};
use crate::config::Config;
use crate::error::Result;
use crate::host::{HostEngine, MarkupScanner};
use crate::interval::IntervalMap;
use crate::syntax::builtin::alternation;

/// How an opener's region ends
#[derive(Debug, Clone, PartialEq, Eq)]
enum Closer {
    /// The backend's closing delimiter, matched case-insensitively
    Literal(&'static str),
    /// The quote that opened an attribute value
    Quote(char),
    /// The brace balancing an attribute's `{`
    Brace(BraceScan),
}

/// Brace matching state, carried across chunk boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BraceScan {
    depth: usize,
    /// Quote of a string the scan is inside
    quote: Option<char>,
    escaped: bool,
}

impl BraceScan {
    fn opened() -> Self {
        Self {
            depth: 1,
            quote: None,
            escaped: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenerKind {
    /// `<script>` / `<style>` element
    Element,
    /// Attribute value
    Attribute,
}

#[derive(Debug)]
struct OpenerRule {
    backend: BackendId,
    kind: OpenerKind,
    pattern: Regex,
}

/// A region whose closer has not been reached yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRegion {
    backend: BackendId,
    closer: Closer,
    /// Where literal scanning resumes: the start of a string or comment
    /// still open at the chunk end, else the chunk end itself
    lexical_from: usize,
}

/// Tagging state at the point a scan stopped
#[derive(Debug, Clone)]
pub struct TagScan {
    scanner: MarkupScanner,
    open: Option<OpenRegion>,
}

impl TagScan {
    /// Backend of a region still open where the scan stopped
    pub fn open_backend(&self) -> Option<BackendId> {
        self.open.as_ref().map(|open| open.backend)
    }
}

enum Applied {
    Closed(usize),
    Open(OpenRegion),
}

/// Finds regions and writes their tags
#[derive(Debug)]
pub struct Tagger {
    rules: Vec<OpenerRule>,
    tab_width: usize,
}

impl Tagger {
    /// Compile opener rules for every backend in `registry`
    ///
    /// Element openers come first, in registry order, so the first rule
    /// wins when two match at the same place. Directive values open script
    /// regions; `style` attributes open style regions when enabled.
    pub fn new(registry: &Registry, config: &Config) -> Result<Self> {
        let mut rules = Vec::new();

        for (id, spec) in registry.specs() {
            rules.push(OpenerRule {
                backend: id,
                kind: OpenerKind::Element,
                pattern: Regex::new(spec.open_pattern)?,
            });
        }

        if let Some(script) = registry.id_of("JavaScript") {
            if !config.directive_prefixes.is_empty() {
                let prefixes = alternation(&config.directive_prefixes);
                rules.push(OpenerRule {
                    backend: script,
                    kind: OpenerKind::Attribute,
                    pattern: Regex::new(&format!(r#"(?:^|\s)(?:{prefixes}):[\w.|-]+\s*=\s*["'{{]"#))?,
                });
            }
        }

        if config.inline_style_detection {
            if let Some(style) = registry.id_of("CSS") {
                rules.push(OpenerRule {
                    backend: style,
                    kind: OpenerKind::Attribute,
                    pattern: Regex::new(r#"(?:^|\s)style\s*=\s*["']"#)?,
                });
            }
        }

        Ok(Self {
            rules,
            tab_width: config.tab_width,
        })
    }

    /// Tag `range`, clearing whatever tags it held before
    ///
    /// `resume` continues a previous scan that stopped at `range.start`;
    /// without it the scan starts fresh, which is only correct at a point
    /// outside every region and every tag. Returns the state at
    /// `range.end`.
    #[allow(clippy::too_many_arguments)]
    pub fn retag(
        &self,
        text: &str,
        host: &HostEngine,
        registry: &Registry,
        tags: &mut IntervalMap<Tag>,
        props: &mut IntervalMap<Syntax>,
        range: Range<usize>,
        resume: Option<TagScan>,
    ) -> TagScan {
        let end = range.end.min(text.len());
        let start = range.start.min(end);
        tags.assign(start..end, Tag::Host);
        props.assign(start..end, Syntax::Code);
        debug!(start, end, resumed = resume.is_some(), "retagging");

        let mut scan = resume.unwrap_or_else(|| TagScan {
            scanner: host.scanner(self.tab_width),
            open: None,
        });

        let mut pos = start;
        if let Some(open) = scan.open.take() {
            match self.apply(text, registry, tags, props, open, pos, end) {
                Applied::Closed(close) => pos = close,
                Applied::Open(open) => {
                    scan.open = Some(open);
                    return scan;
                }
            }
        }

        while pos < end {
            let Some((rule, hit)) = self.next_opener(text, pos, end) else {
                scan.scanner.feed(text, pos..end);
                break;
            };

            scan.scanner.feed(text, pos..hit.start());
            let context = scan.scanner.context();
            if !context.accepts_delimiter() {
                trace!(at = hit.start(), ?context, "ignoring delimiter");
                pos = next_char(text, hit.start());
                scan.scanner.feed(text, hit.start()..pos);
                continue;
            }

            scan.scanner.feed(text, hit.start()..hit.end());
            let Some(backend) = registry.backend(rule.backend) else {
                // Unavailable: the opener is plain host text
                pos = hit.end();
                continue;
            };

            let closer = match rule.kind {
                OpenerKind::Element => Closer::Literal(backend.closing_delimiter()),
                OpenerKind::Attribute => match hit.as_str().chars().last() {
                    Some('{') => Closer::Brace(BraceScan::opened()),
                    Some(quote) => Closer::Quote(quote),
                    None => Closer::Quote('"'),
                },
            };
            let open = OpenRegion {
                backend: rule.backend,
                closer,
                lexical_from: hit.end(),
            };

            match self.apply(text, registry, tags, props, open, hit.end(), end) {
                Applied::Closed(close) => pos = close,
                Applied::Open(open) => {
                    scan.open = Some(open);
                    return scan;
                }
            }
        }

        scan
    }

    /// Earliest opener match in `[pos, end)`; ties go to the earlier rule
    fn next_opener<'t>(&self, text: &'t str, pos: usize, end: usize) -> Option<(&OpenerRule, Match<'t>)> {
        let haystack = &text[..end];
        let mut best: Option<(&OpenerRule, Match<'t>)> = None;
        for rule in &self.rules {
            let Some(hit) = rule.pattern.find_at(haystack, pos) else {
                continue;
            };
            if best.as_ref().map_or(true, |(_, b)| hit.start() < b.start()) {
                best = Some((rule, hit));
            }
        }
        best
    }

    /// Tag a region body from `from` up to its closer or `bound`
    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        text: &str,
        registry: &Registry,
        tags: &mut IntervalMap<Tag>,
        props: &mut IntervalMap<Syntax>,
        open: OpenRegion,
        from: usize,
        bound: usize,
    ) -> Applied {
        let body = &text[from..bound];
        let (stop, still_open) = match open.closer {
            Closer::Literal(delimiter) => match find_ignore_ascii_case(body, delimiter) {
                Some(i) => (from + i, None),
                None => (bound, Some(open.closer.clone())),
            },
            Closer::Quote(quote) => match body.find(quote) {
                Some(i) => (from + i, None),
                None => (bound, Some(open.closer.clone())),
            },
            Closer::Brace(brace) => match balance_braces(body, brace) {
                Ok(i) => (from + i, None),
                Err(brace) => (bound, Some(Closer::Brace(brace))),
            },
        };

        tags.assign(from..stop, Tag::Lang(open.backend));
        // A literal left open by the previous chunk is rescanned from its start
        let lexical_from = open.lexical_from.min(from);
        let mut resume_at = stop;
        if let Some(backend) = registry.backend(open.backend) {
            props.assign(lexical_from..stop, Syntax::Code);
            let literals = backend.engine().propertize(text, lexical_from..stop);
            if let Some(last) = literals.last().filter(|r| r.end >= stop) {
                resume_at = last.start;
            }
            for literal in literals {
                props.assign(literal, Syntax::Literal);
            }
        }
        trace!(
            backend = registry.name(open.backend),
            start = from,
            end = stop,
            closed = still_open.is_none(),
            "tagged region"
        );

        match still_open {
            None => Applied::Closed(stop),
            Some(closer) => Applied::Open(OpenRegion {
                backend: open.backend,
                closer,
                lexical_from: resume_at,
            }),
        }
    }
}

fn next_char(text: &str, pos: usize) -> usize {
    text[pos..].chars().next().map_or(text.len(), |c| pos + c.len_utf8())
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

/// Offset of the brace closing the open ones in `scan`, or the state at the end
fn balance_braces(body: &str, mut scan: BraceScan) -> std::result::Result<usize, BraceScan> {
    for (i, c) in body.char_indices() {
        if let Some(q) = scan.quote {
            if scan.escaped {
                scan.escaped = false;
            } else if c == '\\' {
                scan.escaped = true;
            } else if c == q {
                scan.quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => scan.quote = Some(c),
            '{' => scan.depth += 1,
            '}' => {
                scan.depth -= 1;
                if scan.depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::assert_well_formed;
    use std::sync::Arc;

    struct Fixture {
        registry: Arc<Registry>,
        host: HostEngine,
        tagger: Tagger,
    }

    fn fixture(config: Config) -> Fixture {
        let registry = Registry::shared();
        Fixture {
            host: HostEngine::new(&config).unwrap(),
            tagger: Tagger::new(&registry, &config).unwrap(),
            registry,
        }
    }

    fn tag_all(f: &Fixture, text: &str) -> IntervalMap<Tag> {
        let mut tags = IntervalMap::new(text.len(), Tag::Host);
        let mut props = IntervalMap::new(text.len(), Syntax::Code);
        f.tagger
            .retag(text, &f.host, &f.registry, &mut tags, &mut props, 0..text.len(), None);
        assert_well_formed(&tags);
        tags
    }

    fn regions(f: &Fixture, text: &str) -> Vec<(String, &'static str)> {
        tag_all(f, text)
            .iter()
            .filter_map(|(range, tag)| {
                let id = tag.backend()?;
                Some((text[range].to_string(), f.registry.name(id)))
            })
            .collect()
    }

    #[test]
    fn test_script_and_style() {
        let f = fixture(Config::default());
        let text = "<script>let a;</script>\n<style>p{}</style>";
        assert_eq!(
            regions(&f, text),
            vec![("let a;".to_string(), "JavaScript"), ("p{}".to_string(), "CSS")]
        );
    }

    #[test]
    fn test_lang_attribute_selects_backend() {
        let f = fixture(Config::default());
        let text = "<script lang=\"ts\">let a: number;</script><style lang='scss'>$x: 1;</style>";
        let found: Vec<_> = regions(&f, text).into_iter().map(|(_, name)| name).collect();
        assert_eq!(found, ["TypeScript", "SCSS"]);
    }

    #[test]
    fn test_closer_is_case_insensitive() {
        let f = fixture(Config::default());
        let text = "<SCRIPT>x</SCRIPT>y";
        assert_eq!(regions(&f, text), vec![("x".to_string(), "JavaScript")]);
    }

    #[test]
    fn test_unterminated_region_runs_to_end() {
        let f = fixture(Config::default());
        let text = "<style>p { color: red }";
        let tags = tag_all(&f, text);
        assert_eq!(tags.region(10).map(|(r, _)| r), Some(7..text.len()));
    }

    #[test]
    fn test_opener_in_comment_is_ignored() {
        let f = fixture(Config::default());
        assert!(regions(&f, "<!-- <script> -->\n<p>x</p>").is_empty());
    }

    #[test]
    fn test_opener_in_attribute_string_is_ignored() {
        let f = fixture(Config::default());
        assert!(regions(&f, "<a title=\"<style>\">x</a>").is_empty());
    }

    #[test]
    fn test_directive_values() {
        let f = fixture(Config::default());
        let text = "<button on:click={() => { n += 1 }} bind:value=\"v\">";
        assert_eq!(
            regions(&f, text),
            vec![
                ("() => { n += 1 }".to_string(), "JavaScript"),
                ("v".to_string(), "JavaScript")
            ]
        );
    }

    #[test]
    fn test_inline_style_is_opt_in() {
        let text = "<p style=\"color: red\">x</p>";
        assert!(regions(&fixture(Config::default()), text).is_empty());

        let config = Config {
            inline_style_detection: true,
            ..Config::default()
        };
        assert_eq!(regions(&fixture(config), text), vec![("color: red".to_string(), "CSS")]);
    }

    #[test]
    fn test_resume_matches_single_pass() {
        let f = fixture(Config::default());
        let text = "<p>a</p>\n<script>\nlet s = '<';\n</script>\n<style>\np {}\n</style>\n";
        let whole = tag_all(&f, text);
        let (tags, _) = tag_by_lines(&f, text);
        assert_eq!(tags, whole);
    }

    #[test]
    fn test_props_mark_literals() {
        let f = fixture(Config::default());
        let text = "<script>let s = '}';</script>";
        let mut tags = IntervalMap::new(text.len(), Tag::Host);
        let mut props = IntervalMap::new(text.len(), Syntax::Code);
        f.tagger
            .retag(text, &f.host, &f.registry, &mut tags, &mut props, 0..text.len(), None);
        assert_eq!(props.get(17), Some(Syntax::Literal));
        assert_eq!(props.get(8), Some(Syntax::Code));
    }

    /// Tag `text` one line per call, resuming each time
    fn tag_by_lines(f: &Fixture, text: &str) -> (IntervalMap<Tag>, IntervalMap<Syntax>) {
        let mut tags = IntervalMap::new(text.len(), Tag::Host);
        let mut props = IntervalMap::new(text.len(), Syntax::Code);
        let mut scan = None;
        let mut pos = 0;
        for line in text.split_inclusive('\n') {
            let next = pos + line.len();
            scan = Some(f.tagger.retag(
                text,
                &f.host,
                &f.registry,
                &mut tags,
                &mut props,
                pos..next,
                scan,
            ));
            pos = next;
        }
        (tags, props)
    }

    #[test]
    fn test_balance_braces() {
        let open = BraceScan::opened();
        assert_eq!(balance_braces("a { b } c } d", open), Ok(10));
        assert_eq!(balance_braces("'}' }", open), Ok(4));
        assert_eq!(balance_braces("{ x", open).map_err(|s| s.depth), Err(2));

        let inside = balance_braces("`a\n", open).unwrap_err();
        assert_eq!(inside.quote, Some('`'));
        assert_eq!(balance_braces("}`; }", inside), Ok(4));
    }

    #[test]
    fn test_brace_string_spans_lines() {
        let f = fixture(Config::default());
        let text = "<p on:click={() => {\nlet s = `a\n}`;\n}}>x</p>\n";
        let whole = tag_all(&f, text);
        let (lines, _) = tag_by_lines(&f, text);
        assert_eq!(lines, whole);
        assert_eq!(whole.region(14).map(|(r, _)| r), Some(13..37));
    }

    #[test]
    fn test_comment_spanning_chunks_stays_literal() {
        let f = fixture(Config::default());
        let text = "<script>\n/* a\n{ b */\nfoo();\n</script>\n";
        let mut props = IntervalMap::new(text.len(), Syntax::Code);
        let mut tags = IntervalMap::new(text.len(), Tag::Host);
        f.tagger
            .retag(text, &f.host, &f.registry, &mut tags, &mut props, 0..text.len(), None);

        let (_, by_lines) = tag_by_lines(&f, text);
        assert_eq!(by_lines, props);
        let brace = text.find("{ b").unwrap();
        assert_eq!(by_lines.get(brace), Some(Syntax::Literal));
        assert_eq!(by_lines.get(text.find("foo").unwrap()), Some(Syntax::Code));
    }
}
