//! NZB document parsing
//!
//! Extracts the ordered list of segment message-ids, the file subjects and the
//! newsgroups from an NZB (XML) document. Message-ids come out in the
//! canonical `<local@domain>` form used by the NNTP `STAT` command.

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::{BTreeSet, HashSet};

/// Maximum number of subjects listed by [`summarize_subjects`]
const MAX_SUMMARY_ENTRIES: usize = 10;

/// Segment and subject information decoded from an NZB document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedNzb {
    /// Unique message-ids in file order, then segment order
    pub segment_ids: Vec<String>,

    /// Number of segments across all files (always `segment_ids.len()`)
    pub total_segments: usize,

    /// True if any subject mentions `7z` (case-insensitive)
    ///
    /// Informational only; 7z posts are verified like any other post.
    pub has_archive_hint: bool,

    /// Distinct, entity-decoded file subjects
    pub subjects: BTreeSet<String>,

    /// Distinct newsgroups the files were posted to, in document order
    pub groups: Vec<String>,
}

/// Element whose text content is currently being collected
#[derive(Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Segment,
    Group,
}

/// Parse an NZB document
///
/// # Errors
///
/// Returns [`Error::InvalidNzb`] if the document is not well-formed XML or
/// does not contain any `<file>` with at least one `<segment>`.
pub fn parse_nzb(data: &[u8]) -> Result<ParsedNzb> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::InvalidNzb("nzb payload is empty".to_string()));
    }

    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(true);

    let mut parsed = ParsedNzb::default();
    let mut seen_ids = HashSet::new();
    let mut file_count = 0usize;
    let mut depth = 0usize;
    let mut target = TextTarget::None;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element)) => {
                depth += 1;
                match element.local_name().as_ref() {
                    b"file" => {
                        file_count += 1;
                        record_subject(&mut parsed, &element)?;
                    }
                    b"segment" => {
                        target = TextTarget::Segment;
                        text.clear();
                    }
                    b"group" => {
                        target = TextTarget::Group;
                        text.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(element)) => {
                if element.local_name().as_ref() == b"file" {
                    file_count += 1;
                    record_subject(&mut parsed, &element)?;
                }
            }
            Ok(Event::Text(content)) => {
                if target != TextTarget::None {
                    let decoded = content
                        .unescape()
                        .map_err(|e| invalid(&reader, format!("bad entity in text: {e}")))?;
                    text.push_str(&decoded);
                }
            }
            Ok(Event::CData(content)) => {
                if target != TextTarget::None {
                    text.push_str(&String::from_utf8_lossy(&content.into_inner()));
                }
            }
            Ok(Event::End(element)) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| invalid(&reader, "unexpected closing tag".to_string()))?;
                match element.local_name().as_ref() {
                    b"segment" => {
                        let id = normalize_message_id(&text);
                        if id.is_empty() {
                            if !text.trim().is_empty() {
                                tracing::warn!(
                                    position = reader.buffer_position(),
                                    "Skipping segment with malformed message-id"
                                );
                            }
                        } else if seen_ids.insert(id.clone()) {
                            parsed.segment_ids.push(id);
                        }
                        target = TextTarget::None;
                    }
                    b"group" => {
                        let group = text.trim();
                        if !group.is_empty() && !parsed.groups.iter().any(|g| g == group) {
                            parsed.groups.push(group.to_string());
                        }
                        target = TextTarget::None;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(invalid(&reader, e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(Error::InvalidNzb(
            "parse nzb: unexpected end of document".to_string(),
        ));
    }
    if file_count == 0 || parsed.segment_ids.is_empty() {
        return Err(Error::InvalidNzb(
            "nzb did not contain any segments".to_string(),
        ));
    }

    parsed.total_segments = parsed.segment_ids.len();
    Ok(parsed)
}

fn record_subject(parsed: &mut ParsedNzb, element: &BytesStart<'_>) -> Result<()> {
    let attribute = element
        .try_get_attribute("subject")
        .map_err(|e| Error::InvalidNzb(format!("parse nzb: bad file attribute: {e}")))?;
    let Some(attribute) = attribute else {
        return Ok(());
    };
    let subject = attribute
        .unescape_value()
        .map_err(|e| Error::InvalidNzb(format!("parse nzb: bad subject: {e}")))?;
    let subject = subject.trim();
    if subject.is_empty() {
        return Ok(());
    }
    if contains_archive_hint(subject) {
        parsed.has_archive_hint = true;
    }
    parsed.subjects.insert(subject.to_string());
    Ok(())
}

fn invalid(reader: &Reader<&[u8]>, reason: String) -> Error {
    Error::InvalidNzb(format!(
        "parse nzb at byte {}: {}",
        reader.buffer_position(),
        reason
    ))
}

fn contains_archive_hint(subject: &str) -> bool {
    subject.to_ascii_lowercase().contains("7z")
}

/// Bring a message-id into `<local@domain>` form
///
/// Surrounding whitespace is removed. An id that is not already wrapped in
/// angle brackets gets wrapped (stray single brackets are dropped first).
/// Blank input, and ids with interior whitespace or control characters
/// (which would split an NNTP command line), yield an empty string.
pub fn normalize_message_id(id: &str) -> String {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return String::new();
    }
    if trimmed.starts_with('<') && trimmed.ends_with('>') && trimmed.len() > 2 {
        return trimmed.to_string();
    }
    let bare = trimmed.trim_matches(|c| c == '<' || c == '>');
    if bare.is_empty() {
        return String::new();
    }
    format!("<{bare}>")
}

/// Sorted, comma-separated subject list for logging, capped at ten entries
pub fn summarize_subjects(subjects: &BTreeSet<String>) -> String {
    if subjects.len() <= MAX_SUMMARY_ENTRIES {
        return subjects
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
    }

    let mut summary: Vec<String> = subjects
        .iter()
        .take(MAX_SUMMARY_ENTRIES)
        .cloned()
        .collect();
    summary.push(format!(
        "... (+{} more)",
        subjects.len() - MAX_SUMMARY_ENTRIES
    ));
    summary.join(", ")
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SEGMENTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nzb>
  <file subject="Example">
    <segments>
      <segment bytes="123" number="1">&lt;item1@test&gt;</segment>
      <segment bytes="124" number="2">&lt;item2@test&gt;</segment>
    </segments>
  </file>
</nzb>"#;

    #[test]
    fn parses_segments_in_order_with_brackets() {
        let parsed = parse_nzb(TWO_SEGMENTS.as_bytes()).unwrap();

        assert_eq!(parsed.total_segments, 2);
        assert_eq!(parsed.segment_ids, vec!["<item1@test>", "<item2@test>"]);
        assert!(!parsed.has_archive_hint);
        assert_eq!(
            parsed.subjects.iter().collect::<Vec<_>>(),
            vec!["Example"]
        );
    }

    #[test]
    fn detects_7z_in_entity_encoded_subject() {
        let nzb = r#"<?xml version="1.0" encoding="UTF-8"?>
<nzb>
  <file subject="[1/8] &quot;Movie.7z&quot; yEnc">
    <segments>
      <segment bytes="123" number="1">&lt;item1@test&gt;</segment>
    </segments>
  </file>
</nzb>"#;

        let parsed = parse_nzb(nzb.as_bytes()).unwrap();

        assert_eq!(parsed.total_segments, 1);
        assert!(parsed.has_archive_hint);
        let subject = parsed.subjects.iter().next().unwrap();
        assert_eq!(subject, r#"[1/8] "Movie.7z" yEnc"#);
    }

    #[test]
    fn archive_hint_is_case_insensitive() {
        let nzb = r#"<nzb><file subject="Show.S01E01.PART1.7Z"><segments>
            <segment number="1">a@b</segment></segments></file></nzb>"#;
        assert!(parse_nzb(nzb.as_bytes()).unwrap().has_archive_hint);
    }

    #[test]
    fn wraps_bare_message_ids() {
        let nzb = r#"<nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
  <file poster="test@example.com" date="1234567890" subject="test.bin (1/2)">
    <groups><group>alt.binaries.test</group></groups>
    <segments>
      <segment bytes="1000" number="1">part1@example.com</segment>
      <segment bytes="1000" number="2">  part2@example.com  </segment>
    </segments>
  </file>
</nzb>"#;

        let parsed = parse_nzb(nzb.as_bytes()).unwrap();

        assert_eq!(
            parsed.segment_ids,
            vec!["<part1@example.com>", "<part2@example.com>"]
        );
        assert_eq!(parsed.groups, vec!["alt.binaries.test"]);
    }

    #[test]
    fn counts_segments_across_files_and_dedupes_subjects() {
        let nzb = r#"<nzb>
  <file subject="Movie.part1.rar"><groups><group>alt.a</group><group>alt.b</group></groups>
    <segments>
      <segment number="1">&lt;a1@x&gt;</segment>
      <segment number="2">&lt;a2@x&gt;</segment>
    </segments>
  </file>
  <file subject="Movie.part2.rar"><groups><group>alt.a</group></groups>
    <segments>
      <segment number="1">&lt;b1@x&gt;</segment>
    </segments>
  </file>
  <file subject="Movie.part1.rar">
    <segments>
      <segment number="1">&lt;c1@x&gt;</segment>
    </segments>
  </file>
</nzb>"#;

        let parsed = parse_nzb(nzb.as_bytes()).unwrap();

        assert_eq!(parsed.total_segments, 4);
        assert_eq!(parsed.segment_ids.len(), parsed.total_segments);
        assert_eq!(
            parsed.segment_ids,
            vec!["<a1@x>", "<a2@x>", "<b1@x>", "<c1@x>"]
        );
        assert_eq!(parsed.subjects.len(), 2);
        assert_eq!(parsed.groups, vec!["alt.a", "alt.b"]);
    }

    #[test]
    fn repeated_message_ids_are_kept_once() {
        let nzb = r#"<nzb><file subject="dup"><segments>
            <segment number="1">&lt;same@x&gt;</segment>
            <segment number="2">same@x</segment>
            <segment number="3">&lt;other@x&gt;</segment>
        </segments></file></nzb>"#;

        let parsed = parse_nzb(nzb.as_bytes()).unwrap();
        assert_eq!(parsed.segment_ids, vec!["<same@x>", "<other@x>"]);
        assert_eq!(parsed.total_segments, 2);
    }

    #[test]
    fn blank_segments_are_skipped() {
        let nzb = r#"<nzb><file subject="s"><segments>
            <segment number="1">   </segment>
            <segment number="2">&lt;ok@x&gt;</segment>
        </segments></file></nzb>"#;

        let parsed = parse_nzb(nzb.as_bytes()).unwrap();
        assert_eq!(parsed.segment_ids, vec!["<ok@x>"]);
    }

    #[test]
    fn message_ids_carrying_extra_command_lines_are_skipped() {
        let nzb = r#"<nzb><file subject="s"><segments>
            <segment number="1">&lt;a@b&gt;&#13;&#10;AUTHINFO USER &lt;x@y&gt;</segment>
            <segment number="2">&lt;ok@x&gt;</segment>
            <segment number="3">bad&#9;tab@x</segment>
        </segments></file></nzb>"#;

        let parsed = parse_nzb(nzb.as_bytes()).unwrap();
        assert_eq!(parsed.segment_ids, vec!["<ok@x>"]);
        assert_eq!(parsed.total_segments, 1);
    }

    #[test]
    fn document_with_only_malformed_message_ids_is_rejected() {
        let nzb = r#"<nzb><file subject="s"><segments>
            <segment number="1">a@b&#13;&#10;QUIT</segment>
        </segments></file></nzb>"#;

        assert!(matches!(
            parse_nzb(nzb.as_bytes()),
            Err(Error::InvalidNzb(_))
        ));
    }

    #[test]
    fn rejects_mismatched_tags() {
        let nzb = "<nzb><file subject=\"x\"><segments><segment>a@b</file></nzb>";
        assert!(matches!(
            parse_nzb(nzb.as_bytes()),
            Err(Error::InvalidNzb(_))
        ));
    }

    #[test]
    fn rejects_truncated_document() {
        let nzb = "<nzb><file subject=\"x\"><segments><segment>a@b</segment>";
        assert!(matches!(
            parse_nzb(nzb.as_bytes()),
            Err(Error::InvalidNzb(_))
        ));
    }

    #[test]
    fn rejects_document_without_segments() {
        let no_files = "<nzb><head><meta type=\"title\">x</meta></head></nzb>";
        let err = parse_nzb(no_files.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("did not contain any segments"));

        let empty_file = "<nzb><file subject=\"x\"><segments/></file></nzb>";
        assert!(matches!(
            parse_nzb(empty_file.as_bytes()),
            Err(Error::InvalidNzb(_))
        ));
    }

    #[test]
    fn rejects_empty_and_non_xml_payloads() {
        assert!(matches!(parse_nzb(b""), Err(Error::InvalidNzb(_))));
        assert!(matches!(parse_nzb(b"  \n "), Err(Error::InvalidNzb(_))));
        assert!(matches!(
            parse_nzb(b"<html><body>rate limited</body></html>"),
            Err(Error::InvalidNzb(_))
        ));
    }

    #[test]
    fn normalize_message_id_cases() {
        assert_eq!(normalize_message_id("<a@b>"), "<a@b>");
        assert_eq!(normalize_message_id("a@b"), "<a@b>");
        assert_eq!(normalize_message_id("  a@b "), "<a@b>");
        assert_eq!(normalize_message_id("<a@b"), "<a@b>");
        assert_eq!(normalize_message_id("a@b>"), "<a@b>");
        assert_eq!(normalize_message_id(""), "");
        assert_eq!(normalize_message_id("<>"), "");
        assert_eq!(normalize_message_id("a b@c"), "");
        assert_eq!(normalize_message_id("<a@b>\r\nQUIT"), "");
        assert_eq!(normalize_message_id("a@b\u{0}"), "");
    }

    #[test]
    fn summary_caps_at_ten_subjects() {
        let few: BTreeSet<String> = ["b", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(summarize_subjects(&few), "a, b");

        let many: BTreeSet<String> = (0..13).map(|i| format!("file{i:02}")).collect();
        let summary = summarize_subjects(&many);
        assert!(summary.starts_with("file00, file01"));
        assert!(summary.contains("file09"));
        assert!(!summary.contains("file10"));
        assert!(summary.ends_with("... (+3 more)"));
    }
}
