//! Clipboard capture: turns a paste into the ordered record list.
//!
//! Spreadsheet applications put an HTML table on the clipboard next to the
//! plain text. When that table is present every `<tr>` becomes one record,
//! with its cells joined by a tab. Otherwise the plain text is split into
//! lines.
//!
//! The markup is scanned tolerantly: tags are matched case-insensitively,
//! closing tags are optional, comments are ignored and character references
//! are decoded before whitespace is normalized.

use regex::Regex;
use std::sync::OnceLock;

/// Marker that identifies separator lines in the capture region.
pub const RECORD_SEPARATOR: &str = "---";

/// Separator line written between records when the capture region is shown.
pub const DISPLAY_SEPARATOR: &str = "----------------------------------------";

/// Ordered records, one per captured row.
pub type RecordList = Vec<String>;

/// What the clipboard held at paste time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardPayload {
    /// Rich `text/html` flavour, if any
    pub html: Option<String>,
    /// Plain `text/plain` flavour
    pub text: String,
}

impl ClipboardPayload {
    /// Payload with only plain text
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            html: None,
            text: text.into(),
        }
    }

    /// Attach the HTML flavour
    #[must_use]
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }
}

/// How the capture region changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOrigin {
    /// The change came from a paste (already handled by [`capture`])
    Paste,
    /// The user typed or deleted text
    Typed,
}

struct Patterns {
    comment: Regex,
    row_open: Regex,
    row_close: Regex,
    cell_open: Regex,
    cell_close: Regex,
    tag: Regex,
}

#[allow(clippy::expect_used)]
fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).expect("static pattern");
        Patterns {
            comment: compile(r"(?s)<!--.*?-->"),
            row_open: compile(r"(?i)<tr\b[^>]*>"),
            row_close: compile(r"(?i)</(?:tr|table|tbody|thead|tfoot)\b"),
            cell_open: compile(r"(?i)<t[dh]\b[^>]*>"),
            cell_close: compile(r"(?i)</t[dh]\b"),
            tag: compile(r"(?s)<[^>]*>"),
        }
    })
}

/// Convert a paste into records.
///
/// Rows of an HTML table win over the plain text; rows whose text is empty
/// are dropped. Without a table the plain text is split on line breaks and
/// blank lines are dropped.
#[must_use]
pub fn capture(payload: &ClipboardPayload) -> RecordList {
    if let Some(html) = payload.html.as_deref().filter(|h| !h.is_empty()) {
        if let Some(rows) = table_rows(html) {
            return rows;
        }
    }
    split_lines(&payload.text)
}

/// Extract one record per table row, or `None` when the markup has no rows.
#[must_use]
pub fn table_rows(html: &str) -> Option<RecordList> {
    let p = patterns();
    let html = p.comment.replace_all(html, "");
    let rows = segments(&html, &p.row_open, &p.row_close);
    if rows.is_empty() {
        return None;
    }

    let records = rows
        .into_iter()
        .filter_map(|row| {
            let cells = segments(row, &p.cell_open, &p.cell_close);
            let text = if cells.is_empty() {
                normalize_whitespace(&visible_text(row))
            } else {
                cells
                    .iter()
                    .map(|cell| normalize_whitespace(&visible_text(cell)))
                    .collect::<Vec<_>>()
                    .join("\t")
                    .trim()
                    .to_string()
            };
            (!text.is_empty()).then_some(text)
        })
        .collect();
    Some(records)
}

/// Split `body` at every opener match; each piece runs to the next opener or
/// the first closer, whichever comes first.
fn segments<'a>(body: &'a str, open: &Regex, close: &Regex) -> Vec<&'a str> {
    let starts: Vec<(usize, usize)> = open.find_iter(body).map(|m| (m.start(), m.end())).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &(_, content_start))| {
            let limit = starts.get(i + 1).map_or(body.len(), |&(next, _)| next);
            let piece = &body[content_start..limit];
            close.find(piece).map_or(piece, |m| &piece[..m.start()])
        })
        .collect()
}

/// Text content of a markup fragment: tags removed, character references
/// decoded (every HTML5 named reference plus numeric ones).
#[must_use]
pub fn visible_text(fragment: &str) -> String {
    let stripped = patterns().tag.replace_all(fragment, "");
    html_escape::decode_html_entities(&stripped).into_owned()
}

/// Collapse line breaks and whitespace runs into single spaces and trim.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split plain text into non-blank lines, order preserved.
#[must_use]
pub fn split_lines(text: &str) -> RecordList {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect()
}

/// Re-derive records after the user edited the capture region by hand.
///
/// Returns `None` for paste-originated changes, which [`capture`] already
/// handled. Separator lines, and any line containing the separator marker,
/// are dropped along with blank lines.
#[must_use]
pub fn manual_edit(text: &str, origin: EditOrigin) -> Option<RecordList> {
    if origin == EditOrigin::Paste {
        return None;
    }
    Some(
        split_lines(text)
            .into_iter()
            .filter(|line| !line.contains(RECORD_SEPARATOR))
            .collect(),
    )
}

/// Render records the way the capture region shows them.
#[must_use]
pub fn display_text(records: &[String]) -> String {
    records.join(&format!("\n{DISPLAY_SEPARATOR}\n"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod html_tests {
        use super::*;

        #[test]
        fn test_cells_joined_with_tab() {
            let html = "<table><tr><td>Kim</td><td>Good work</td></tr>\
                        <tr><td>Lee</td><td>Needs focus</td></tr></table>";
            let records = table_rows(html).unwrap();
            assert_eq!(records, vec!["Kim\tGood work", "Lee\tNeeds focus"]);
        }

        #[test]
        fn test_cell_whitespace_normalized() {
            let html = "<tr><td>  line one\r\n   line\ttwo  </td><th>x</th></tr>";
            let records = table_rows(html).unwrap();
            assert_eq!(records, vec!["line one line two\tx"]);
        }

        #[test]
        fn test_empty_rows_dropped() {
            let html = "<tr><td> </td><td>&nbsp;</td></tr><tr><td>kept</td></tr>";
            let records = table_rows(html).unwrap();
            assert_eq!(records, vec!["kept"]);
        }

        #[test]
        fn test_leading_empty_cell_trimmed_with_row() {
            let html = "<tr><td></td><td>b</td></tr>";
            assert_eq!(table_rows(html).unwrap(), vec!["b"]);
        }

        #[test]
        fn test_row_without_cells_uses_row_text() {
            let html = "<TR class=x>\n  whole   row\n</TR>";
            assert_eq!(table_rows(html).unwrap(), vec!["whole row"]);
        }

        #[test]
        fn test_missing_closing_tags() {
            let html = "<table><tr><td>a<td>b<tr><td>c<td>d</table>";
            assert_eq!(table_rows(html).unwrap(), vec!["a\tb", "c\td"]);
        }

        #[test]
        fn test_entities_and_nested_markup() {
            let html = "<tr><td><span style='x'>A &amp; B</span> &lt;ok&gt; &#65;&#x42;</td></tr>";
            assert_eq!(table_rows(html).unwrap(), vec!["A & B <ok> AB"]);
        }

        #[test]
        fn test_named_references_decoded() {
            let html = "<tr><td>caf&eacute;</td><td>a&middot;b</td><td>&copy;</td></tr>";
            assert_eq!(table_rows(html).unwrap(), vec!["café\ta·b\t©"]);
        }

        #[test]
        fn test_nbsp_collapses_like_whitespace() {
            let html = "<tr><td>&nbsp;x&nbsp;&nbsp;y&nbsp;</td></tr>";
            assert_eq!(table_rows(html).unwrap(), vec!["x y"]);
        }

        #[test]
        fn test_comments_ignored() {
            let html = "<!--[if gte mso 9]><tr><td>hidden</td></tr><![endif]-->\
                        <tr><td>shown</td></tr>";
            assert_eq!(table_rows(html).unwrap(), vec!["shown"]);
        }

        #[test]
        fn test_thead_not_mistaken_for_cell() {
            let html = "<table><thead><tr><th>H</th></tr></thead><tbody><tr><td>v</td></tr></tbody></table>";
            assert_eq!(table_rows(html).unwrap(), vec!["H", "v"]);
        }

        #[test]
        fn test_markup_without_rows() {
            assert!(table_rows("<p>just a paragraph</p>").is_none());
        }
    }

    mod capture_tests {
        use super::*;

        #[test]
        fn test_html_preferred_over_text() {
            let payload = ClipboardPayload::text("ignored\nlines")
                .with_html("<tr><td>a</td><td>b</td></tr>");
            assert_eq!(capture(&payload), vec!["a\tb"]);
        }

        #[test]
        fn test_html_without_rows_falls_back_to_text() {
            let payload = ClipboardPayload::text("one\n\ntwo\n").with_html("<b>bold</b>");
            assert_eq!(capture(&payload), vec!["one", "two"]);
        }

        #[test]
        fn test_empty_html_falls_back_to_text() {
            let payload = ClipboardPayload::text("x").with_html("");
            assert_eq!(capture(&payload), vec!["x"]);
        }

        #[test]
        fn test_plain_text_drops_blank_lines() {
            let payload = ClipboardPayload::text("a\tb\n   \nc\td\r\n\n");
            assert_eq!(capture(&payload), vec!["a\tb", "c\td"]);
        }
    }

    mod manual_edit_tests {
        use super::*;

        #[test]
        fn test_paste_origin_is_ignored() {
            assert!(manual_edit("a\nb", EditOrigin::Paste).is_none());
        }

        #[test]
        fn test_separator_lines_dropped() {
            let text = format!("a\n{DISPLAY_SEPARATOR}\nb\n\nx --- y");
            assert_eq!(manual_edit(&text, EditOrigin::Typed).unwrap(), vec!["a", "b"]);
        }

        #[test]
        fn test_display_text_round_trips_through_edit() {
            let records = vec!["a\tb".to_string(), "c".to_string(), "d e".to_string()];
            let shown = display_text(&records);
            assert_eq!(manual_edit(&shown, EditOrigin::Typed).unwrap(), records);
        }

        #[test]
        fn test_display_text_single_record_has_no_separator() {
            assert_eq!(display_text(&["only".to_string()]), "only");
        }
    }
}
