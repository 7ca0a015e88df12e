//! Read and write the machine-readable section of generated sitemap
//! documents.
//!
//! The section grammar is the contract between the sitemap generator and
//! later stages:
//!
//! ```text
//! ## Machine-Readable URL List
//! ### Depth 0
//! - ✅ https://example.com/
//! ### Depth 1
//! - 🔒 https://example.com/account
//! ### Files (not extracted recursively)
//! - 📄 https://example.com/manual.pdf
//! ```
//!
//! Parsing is an explicit state machine over lines. Only accessible (✅)
//! and file (📄) items produce entries.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::OnceLock;
use tracing::debug;

/// Text that opens the machine-readable section.
pub const SECTION_MARKER: &str = "Machine-Readable";

/// Heading of the files subsection written by [`render_machine_readable`].
pub const FILES_HEADING: &str = "### Files (not extracted recursively)";

fn section_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^##\s+").expect("static regex"))
}

fn depth_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^###\s+Depth\s+(\d+)").expect("static regex"))
}

fn list_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-\s+(✅|❌|🔒|⚠\x{FE0F}?|📄)\s+(https?://[^\s)]+)").expect("static regex")
    })
}

/// Status glyph at the start of a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusGlyph {
    /// ✅ page loaded and was extracted.
    Accessible,
    /// ❌ page failed to load.
    Error,
    /// 🔒 page requires authentication or was forbidden.
    Blocked,
    /// ⚠️ page loaded with problems.
    Warning,
    /// 📄 downloadable file.
    File,
}

impl StatusGlyph {
    pub fn symbol(self) -> &'static str {
        match self {
            StatusGlyph::Accessible => "✅",
            StatusGlyph::Error => "❌",
            StatusGlyph::Blocked => "🔒",
            StatusGlyph::Warning => "⚠️",
            StatusGlyph::File => "📄",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim_end_matches('\u{FE0F}') {
            "✅" => Some(StatusGlyph::Accessible),
            "❌" => Some(StatusGlyph::Error),
            "🔒" => Some(StatusGlyph::Blocked),
            "⚠" => Some(StatusGlyph::Warning),
            "📄" => Some(StatusGlyph::File),
            _ => None,
        }
    }
}

/// Depth subsection an entry was listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "DepthRepr", try_from = "DepthRepr")]
pub enum SitemapDepth {
    Level(u32),
    Files,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DepthRepr {
    Level(u32),
    Named(String),
}

impl From<SitemapDepth> for DepthRepr {
    fn from(depth: SitemapDepth) -> Self {
        match depth {
            SitemapDepth::Level(n) => DepthRepr::Level(n),
            SitemapDepth::Files => DepthRepr::Named("files".to_string()),
        }
    }
}

impl TryFrom<DepthRepr> for SitemapDepth {
    type Error = String;

    fn try_from(repr: DepthRepr) -> Result<Self, Self::Error> {
        match repr {
            DepthRepr::Level(n) => Ok(SitemapDepth::Level(n)),
            DepthRepr::Named(name) if name == "files" => Ok(SitemapDepth::Files),
            DepthRepr::Named(name) => Err(format!("unknown depth {name:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Page,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Accessible,
    File,
}

/// One URL recovered from a sitemap document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub url: String,
    pub depth: Option<SitemapDepth>,
    pub kind: EntryKind,
    pub status: EntryStatus,
}

/// Parser state between lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Before the machine-readable marker.
    Outside,
    /// Inside the section, before any depth or files heading.
    InSection,
    /// Under `### Depth n`.
    AtDepth(u32),
    /// Under the files heading.
    AtFiles,
}

impl ParseState {
    fn depth(self) -> Option<SitemapDepth> {
        match self {
            ParseState::Outside | ParseState::InSection => None,
            ParseState::AtDepth(n) => Some(SitemapDepth::Level(n)),
            ParseState::AtFiles => Some(SitemapDepth::Files),
        }
    }
}

/// Result of feeding one line to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Next(ParseState),
    Emit(ParseState, SitemapEntry),
    /// An unrelated `##` heading closed the section.
    Stop,
}

/// Transition function of the section parser.
pub fn step(state: ParseState, line: &str) -> Transition {
    if line.contains(SECTION_MARKER) {
        let next = match state {
            ParseState::Outside => ParseState::InSection,
            other => other,
        };
        return Transition::Next(next);
    }

    if state == ParseState::Outside {
        return Transition::Next(state);
    }

    if section_heading_re().is_match(line) {
        return Transition::Stop;
    }

    if let Some(caps) = depth_heading_re().captures(line) {
        return match caps[1].parse::<u32>() {
            Ok(n) => Transition::Next(ParseState::AtDepth(n)),
            Err(_) => Transition::Next(state),
        };
    }

    if line.contains("Files (not extracted recursively)") || line.contains("### Files") {
        return Transition::Next(ParseState::AtFiles);
    }

    let Some(caps) = list_item_re().captures(line) else {
        return Transition::Next(state);
    };
    let (kind, status) = match StatusGlyph::from_symbol(&caps[1]) {
        Some(StatusGlyph::Accessible) => (EntryKind::Page, EntryStatus::Accessible),
        Some(StatusGlyph::File) => (EntryKind::File, EntryStatus::File),
        _ => return Transition::Next(state),
    };

    Transition::Emit(
        state,
        SitemapEntry {
            url: caps[2].to_string(),
            depth: state.depth(),
            kind,
            status,
        },
    )
}

/// Parse all accessible and file entries of a sitemap document.
pub fn parse_sitemap_document(content: &str) -> Vec<SitemapEntry> {
    let mut state = ParseState::Outside;
    let mut entries = Vec::new();

    for line in content.lines() {
        match step(state, line) {
            Transition::Next(next) => state = next,
            Transition::Emit(next, entry) => {
                state = next;
                entries.push(entry);
            }
            Transition::Stop => break,
        }
    }

    if state == ParseState::Outside {
        debug!("sitemap document has no {SECTION_MARKER} section");
    }
    entries
}

/// One crawled URL to list in a sitemap document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapRecord {
    pub url: String,
    pub depth: u32,
    pub glyph: StatusGlyph,
}

/// Render the machine-readable section: depth subsections in ascending
/// order, then the files subsection. Input order is kept within a group.
pub fn render_machine_readable(records: &[SitemapRecord]) -> String {
    let mut out = String::from("## Machine-Readable URL List\n");

    let mut depths: Vec<u32> = records
        .iter()
        .filter(|r| r.glyph != StatusGlyph::File)
        .map(|r| r.depth)
        .collect();
    depths.sort_unstable();
    depths.dedup();

    for depth in depths {
        let _ = writeln!(out, "\n### Depth {depth}");
        for record in records
            .iter()
            .filter(|r| r.glyph != StatusGlyph::File && r.depth == depth)
        {
            let _ = writeln!(out, "- {} {}", record.glyph.symbol(), record.url);
        }
    }

    let files: Vec<&SitemapRecord> = records
        .iter()
        .filter(|r| r.glyph == StatusGlyph::File)
        .collect();
    if !files.is_empty() {
        let _ = writeln!(out, "\n{FILES_HEADING}");
        for record in files {
            let _ = writeln!(out, "- {} {}", record.glyph.symbol(), record.url);
        }
    }

    out
}

/// Render a complete sitemap document with a summary ahead of the
/// machine-readable section.
pub fn render_document(
    site: &str,
    records: &[SitemapRecord],
    generated_at: DateTime<Utc>,
) -> String {
    let count = |glyph: StatusGlyph| records.iter().filter(|r| r.glyph == glyph).count();

    let mut out = String::new();
    let _ = writeln!(out, "# Sitemap: {site}\n");
    let _ = writeln!(out, "Generated: {}\n", generated_at.to_rfc3339());
    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(out, "- Total URLs: {}", records.len());
    for glyph in [
        StatusGlyph::Accessible,
        StatusGlyph::Blocked,
        StatusGlyph::Error,
        StatusGlyph::Warning,
        StatusGlyph::File,
    ] {
        let _ = writeln!(out, "- {} {:?}: {}", glyph.symbol(), glyph, count(glyph));
    }
    out.push('\n');
    out.push_str(&render_machine_readable(records));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_section_stops_at_next_heading() {
        let doc = "# Sitemap\n\
                   - ✅ https://x.test/outside\n\
                   ## Machine-Readable URL List\n\
                   ### Depth 1\n\
                   - ✅ https://x.test/a\n\
                   - ❌ https://x.test/b\n\
                   ## Other\n\
                   - ✅ https://x.test/c\n";
        let entries = parse_sitemap_document(doc);
        assert_eq!(
            entries,
            vec![SitemapEntry {
                url: "https://x.test/a".to_string(),
                depth: Some(SitemapDepth::Level(1)),
                kind: EntryKind::Page,
                status: EntryStatus::Accessible,
            }]
        );

        let value = serde_json::to_value(&entries).unwrap();
        assert_eq!(value[0]["kind"], "page");
        assert_eq!(value[0]["depth"], 1);
        assert!(value[0].get("type").is_none());
    }

    #[test]
    fn test_files_and_glyph_filtering() {
        let doc = "## Machine-Readable\n\
                   - ✅ https://x.test/early\n\
                   ### Depth 0\n\
                   - ✅ https://x.test/\n\
                   ### Depth 2\n\
                   - 🔒 https://x.test/account\n\
                   - ⚠️ https://x.test/slow\n\
                   - ⚠ https://x.test/slower\n\
                   - ✅ https://x.test/guide (Guide)\n\
                   * ✅ https://x.test/not-a-dash\n\
                   ### Files (not extracted recursively)\n\
                   - 📄 https://x.test/manual.pdf\n";
        let entries = parse_sitemap_document(doc);
        let urls: Vec<(&str, Option<SitemapDepth>)> =
            entries.iter().map(|e| (e.url.as_str(), e.depth)).collect();
        assert_eq!(
            urls,
            vec![
                ("https://x.test/early", None),
                ("https://x.test/", Some(SitemapDepth::Level(0))),
                ("https://x.test/guide", Some(SitemapDepth::Level(2))),
                ("https://x.test/manual.pdf", Some(SitemapDepth::Files)),
            ]
        );
        assert_eq!(entries[3].kind, EntryKind::File);
        assert_eq!(entries[3].status, EntryStatus::File);
    }

    #[test]
    fn test_no_section_yields_nothing() {
        let doc = "# Sitemap\n### Depth 0\n- ✅ https://x.test/\n";
        assert!(parse_sitemap_document(doc).is_empty());
        assert!(parse_sitemap_document("").is_empty());
    }

    #[test]
    fn test_marker_inside_section_keeps_depth() {
        let doc = "## Machine-Readable\n### Depth 3\n#### Machine-Readable notes\n- ✅ https://x.test/z\n";
        let entries = parse_sitemap_document(doc);
        assert_eq!(entries[0].depth, Some(SitemapDepth::Level(3)));
    }

    #[test]
    fn test_transitions() {
        assert_eq!(
            step(ParseState::Outside, "### Depth 1"),
            Transition::Next(ParseState::Outside)
        );
        assert_eq!(
            step(ParseState::InSection, "### Depth 4"),
            Transition::Next(ParseState::AtDepth(4))
        );
        assert_eq!(
            step(ParseState::AtDepth(4), "### Files"),
            Transition::Next(ParseState::AtFiles)
        );
        assert_eq!(step(ParseState::AtFiles, "## Notes"), Transition::Stop);
        assert_eq!(
            step(ParseState::AtFiles, "##NoSpace"),
            Transition::Next(ParseState::AtFiles)
        );
    }

    #[test]
    fn test_entry_json_shape() {
        let entries = vec![
            SitemapEntry {
                url: "https://x.test/a".to_string(),
                depth: Some(SitemapDepth::Level(1)),
                kind: EntryKind::Page,
                status: EntryStatus::Accessible,
            },
            SitemapEntry {
                url: "https://x.test/f.pdf".to_string(),
                depth: Some(SitemapDepth::Files),
                kind: EntryKind::File,
                status: EntryStatus::File,
            },
            SitemapEntry {
                url: "https://x.test/b".to_string(),
                depth: None,
                kind: EntryKind::Page,
                status: EntryStatus::Accessible,
            },
        ];
        assert_json_eq!(
            serde_json::to_value(&entries).unwrap(),
            json!([
                {"url": "https://x.test/a", "depth": 1, "kind": "page", "status": "accessible"},
                {"url": "https://x.test/f.pdf", "depth": "files", "kind": "file", "status": "file"},
                {"url": "https://x.test/b", "depth": null, "kind": "page", "status": "accessible"}
            ])
        );
        let back: Vec<SitemapEntry> =
            serde_json::from_value(serde_json::to_value(&entries).unwrap()).unwrap();
        assert_eq!(back, entries);
    }

    #[test]
    fn test_rendered_document_parses_back() {
        let records = vec![
            SitemapRecord {
                url: "https://x.test/guide".to_string(),
                depth: 1,
                glyph: StatusGlyph::Accessible,
            },
            SitemapRecord {
                url: "https://x.test/".to_string(),
                depth: 0,
                glyph: StatusGlyph::Accessible,
            },
            SitemapRecord {
                url: "https://x.test/admin".to_string(),
                depth: 1,
                glyph: StatusGlyph::Blocked,
            },
            SitemapRecord {
                url: "https://x.test/manual.pdf".to_string(),
                depth: 1,
                glyph: StatusGlyph::File,
            },
        ];
        let generated = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let doc = render_document("x.test", &records, generated);
        assert!(doc.contains("Generated: 2026-01-15T12:00:00+00:00"));
        assert!(doc.contains("- 🔒 https://x.test/admin"));

        let entries = parse_sitemap_document(&doc);
        let parsed: Vec<(&str, Option<SitemapDepth>)> =
            entries.iter().map(|e| (e.url.as_str(), e.depth)).collect();
        assert_eq!(
            parsed,
            vec![
                ("https://x.test/", Some(SitemapDepth::Level(0))),
                ("https://x.test/guide", Some(SitemapDepth::Level(1))),
                ("https://x.test/manual.pdf", Some(SitemapDepth::Files)),
            ]
        );
    }
}
