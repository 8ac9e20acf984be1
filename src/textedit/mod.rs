//! Pure text-editing operations over a buffer plus a selection range.
//!
//! Everything here works on byte offsets into `&str` and returns edit
//! descriptions; the editor layer owns the textarea, converts the DOM's
//! UTF-16 selection offsets at the boundary, and applies keystroke-level
//! edits through the native-undo-preserving insertion primitive. The bulk
//! full-buffer rewrites (indent/outdent/renumber, empty-item removal)
//! intentionally bypass native undo; callers bracket them with application
//! history snapshots instead.

/// How far back the link detector looks for an opening `[` on the same run.
const LINK_SCAN_LIMIT: usize = 500;

/// Spaces added per indent step. Outdent removes up to four (or one tab).
const INDENT: &str = "   ";
const OUTDENT_MAX_SPACES: usize = 4;

/// A splice: replace `start..end` with `insert`, then select `select`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub insert: String,
    pub select: (usize, usize),
}

/// A whole-buffer rewrite with the selection to restore afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LinesRewrite {
    pub buffer: String,
    pub sel_start: usize,
    pub sel_end: usize,
}

// ========== offsets ==========

/// DOM selection offsets are UTF-16 code units; convert at the boundary.
pub(crate) fn utf16_to_byte_idx(s: &str, pos_utf16: u32) -> usize {
    if pos_utf16 == 0 {
        return 0;
    }
    let mut acc: u32 = 0;
    for (i, ch) in s.char_indices() {
        let w = ch.len_utf16() as u32;
        if acc + w > pos_utf16 {
            return i;
        }
        acc += w;
        if acc == pos_utf16 {
            return i + ch.len_utf8();
        }
    }
    s.len()
}

pub(crate) fn byte_idx_to_utf16(s: &str, byte_idx: usize) -> u32 {
    s[..byte_idx.min(s.len())].encode_utf16().count() as u32
}

pub(crate) fn line_start(buffer: &str, pos: usize) -> usize {
    buffer[..pos].rfind('\n').map(|p| p + 1).unwrap_or(0)
}

pub(crate) fn line_end(buffer: &str, pos: usize) -> usize {
    buffer[pos..].find('\n').map(|p| pos + p).unwrap_or(buffer.len())
}

fn leading_ws(line: &str) -> &str {
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

fn split_first_line(s: &str) -> (&str, &str, bool) {
    match s.find('\n') {
        Some(p) => (&s[..p], &s[p + 1..], true),
        None => (s, "", false),
    }
}

// ========== format toggling ==========

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Format {
    Bold,
    Italic,
    Underline,
}

impl Format {
    fn open(self) -> &'static str {
        match self {
            Format::Bold => "**",
            Format::Italic => "*",
            Format::Underline => "<u>",
        }
    }

    fn close(self) -> &'static str {
        match self {
            Format::Bold => "**",
            Format::Italic => "*",
            Format::Underline => "</u>",
        }
    }

    /// Marker character that must not touch a match (`**` vs `***`).
    fn guard(self) -> Option<char> {
        match self {
            Format::Bold | Format::Italic => Some('*'),
            Format::Underline => None,
        }
    }
}

fn marker_stands_alone(buffer: &str, pos: usize, len: usize, guard: Option<char>) -> bool {
    let Some(g) = guard else {
        return true;
    };
    buffer[..pos].chars().next_back() != Some(g) && buffer[pos + len..].chars().next() != Some(g)
}

/// Last guarded occurrence of `marker` in `buffer[region]`.
fn rfind_marker(buffer: &str, from: usize, to: usize, marker: &str, guard: Option<char>) -> Option<usize> {
    buffer[from..to]
        .match_indices(marker)
        .map(|(i, _)| from + i)
        .filter(|&i| marker_stands_alone(buffer, i, marker.len(), guard))
        .last()
}

/// First guarded occurrence of `marker` in `buffer[region]`.
fn find_marker(buffer: &str, from: usize, to: usize, marker: &str, guard: Option<char>) -> Option<usize> {
    buffer[from..to]
        .match_indices(marker)
        .map(|(i, _)| from + i)
        .find(|&i| marker_stands_alone(buffer, i, marker.len(), guard))
}

/// Toggle a formatting wrapper around the selection.
///
/// Looks left of the selection and right of it, within the current line only,
/// for an enclosing open/close marker pair. Enclosed selection → unwrap and
/// select the inner text. Otherwise wrap the selection (or the placeholder
/// `text`) and select the inner text. A toggle, not a blind wrap.
pub(crate) fn toggle_format(
    buffer: &str,
    sel_start: usize,
    sel_end: usize,
    format: Format,
) -> TextEdit {
    let open = format.open();
    let close = format.close();
    let ls = line_start(buffer, sel_start);
    let le = line_end(buffer, sel_end);

    let enclosing = rfind_marker(buffer, ls, sel_start, open, format.guard()).and_then(|o| {
        find_marker(buffer, sel_end, le, close, format.guard()).map(|c| (o, c))
    });

    if let Some((open_pos, close_pos)) = enclosing {
        let inner = buffer[open_pos + open.len()..close_pos].to_string();
        let inner_len = inner.len();
        return TextEdit {
            start: open_pos,
            end: close_pos + close.len(),
            insert: inner,
            select: (open_pos, open_pos + inner_len),
        };
    }

    let selected = if sel_start == sel_end {
        "text"
    } else {
        &buffer[sel_start..sel_end]
    };
    let insert = format!("{open}{selected}{close}");
    TextEdit {
        start: sel_start,
        end: sel_end,
        insert,
        select: (
            sel_start + open.len(),
            sel_start + open.len() + selected.len(),
        ),
    }
}

// ========== links ==========

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LinkSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub url: String,
}

/// The `[text](url)` span the cursor sits inside, if any.
///
/// The backward scan for `[` is bounded to 500 characters and stops at a
/// newline or a prior `)`, so a closed earlier link never matches.
pub(crate) fn link_span_at(buffer: &str, cursor: usize) -> Option<LinkSpan> {
    let cursor = cursor.min(buffer.len());
    let mut open = None;
    for (scanned, (i, ch)) in buffer[..cursor].char_indices().rev().enumerate() {
        if scanned >= LINK_SCAN_LIMIT {
            break;
        }
        match ch {
            '\n' | ')' => break,
            '[' => {
                open = Some(i);
                break;
            }
            _ => {}
        }
    }

    let start = open?;
    let rest = &buffer[start..];
    let text_end = rest.find("](")?;
    let text = &rest[1..text_end];
    let url_rest = &rest[text_end + 2..];
    let url_end = url_rest.find(')')?;
    let url = &url_rest[..url_end];
    if text.contains('\n') || url.contains('\n') {
        return None;
    }

    Some(LinkSpan {
        start,
        end: start + text_end + 2 + url_end + 1,
        text: text.to_string(),
        url: url.to_string(),
    })
}

/// Re-point an existing link; an empty URL removes the link, keeping the text.
pub(crate) fn replace_link_url(span: &LinkSpan, new_url: &str) -> TextEdit {
    if new_url.trim().is_empty() {
        let len = span.text.len();
        TextEdit {
            start: span.start,
            end: span.end,
            insert: span.text.clone(),
            select: (span.start, span.start + len),
        }
    } else {
        let insert = format!("[{}]({})", span.text, new_url);
        let cursor = span.start + insert.len();
        TextEdit {
            start: span.start,
            end: span.end,
            insert,
            select: (cursor, cursor),
        }
    }
}

/// Wrap the selection (or the placeholder `link text`) as a new link.
pub(crate) fn insert_link(buffer: &str, sel_start: usize, sel_end: usize, url: &str) -> TextEdit {
    let text = if sel_start == sel_end {
        "link text"
    } else {
        &buffer[sel_start..sel_end]
    };
    let insert = format!("[{text}]({url})");
    let cursor = sel_start + insert.len();
    TextEdit {
        start: sel_start,
        end: sel_end,
        insert,
        select: (cursor, cursor),
    }
}

// ========== lists ==========

#[derive(Clone, Debug, PartialEq, Eq)]
struct UnorderedItem<'a> {
    indent: &'a str,
    marker: char,
    content: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct OrderedItem<'a> {
    indent: &'a str,
    number: u64,
    content: &'a str,
}

fn parse_unordered(line: &str) -> Option<UnorderedItem<'_>> {
    let indent = leading_ws(line);
    let rest = &line[indent.len()..];
    let mut chars = rest.chars();
    let marker = chars.next()?;
    if !matches!(marker, '-' | '*' | '+') || chars.next() != Some(' ') {
        return None;
    }
    Some(UnorderedItem {
        indent,
        marker,
        content: &rest[2..],
    })
}

fn parse_ordered(line: &str) -> Option<OrderedItem<'_>> {
    let indent = leading_ws(line);
    let rest = &line[indent.len()..];
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let after = &rest[digits..];
    let content = after.strip_prefix(". ")?;
    Some(OrderedItem {
        indent,
        number: rest[..digits].parse().ok()?,
        content,
    })
}

/// What Enter should do inside a list line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ListEnter {
    /// Insert at the cursor through the native-undo primitive.
    Insert { text: String },
    /// Insert through the primitive, then renumber the following run with
    /// [`renumber_after_list_insert`].
    InsertThenRenumber { text: String },
    /// Whole-buffer rewrite (empty-item removal, plus any tail renumbering).
    Rewrite { buffer: String, cursor: usize },
}

/// Renumber the same-indent ordered run starting at byte offset `from`
/// (a line boundary), numbering from `next`. Blank and deeper-indented lines
/// are passed through; the first other line ends the run.
fn renumber_following_run(buffer: &str, from: usize, indent: &str, mut next: u64) -> String {
    let mut out = String::with_capacity(buffer.len() + 8);
    out.push_str(&buffer[..from]);

    let mut remaining = &buffer[from..];
    while !remaining.is_empty() {
        let (line, rest, had_newline) = split_first_line(remaining);
        let blank = line.trim().is_empty();
        let deeper = !blank && leading_ws(line).len() > indent.len();

        if blank || deeper {
            out.push_str(line);
        } else if let Some(item) = parse_ordered(line).filter(|item| item.indent == indent) {
            out.push_str(item.indent);
            out.push_str(&item.number_rewritten(next));
            next += 1;
        } else {
            out.push_str(remaining);
            return out;
        }

        if had_newline {
            out.push('\n');
        }
        remaining = rest;
    }
    out
}

impl OrderedItem<'_> {
    fn number_rewritten(&self, number: u64) -> String {
        format!("{number}. {}", self.content)
    }
}

/// Handle Enter on a list line (no active selection). `None` means the line
/// is not a list item and Enter should behave natively.
pub(crate) fn continue_list_on_enter(buffer: &str, cursor: usize) -> Option<ListEnter> {
    let ls = line_start(buffer, cursor);
    let le = line_end(buffer, cursor);
    let line = &buffer[ls..le];

    if let Some(item) = parse_unordered(line) {
        if item.content.trim().is_empty() {
            // Empty item terminates the list: drop the marker, keep the line.
            let mut rewritten = String::with_capacity(buffer.len());
            rewritten.push_str(&buffer[..ls]);
            rewritten.push_str(&buffer[le..]);
            return Some(ListEnter::Rewrite {
                buffer: rewritten,
                cursor: ls,
            });
        }
        return Some(ListEnter::Insert {
            text: format!("\n{}{} ", item.indent, item.marker),
        });
    }

    if let Some(item) = parse_ordered(line) {
        if item.content.trim().is_empty() {
            let indent = item.indent.to_string();
            let number = item.number;
            let mut rewritten = String::with_capacity(buffer.len());
            rewritten.push_str(&buffer[..ls]);
            rewritten.push_str(&buffer[le..]);
            // The items below close ranks starting from the removed number.
            let from = if le < buffer.len() { ls + 1 } else { ls };
            let rewritten = if from < rewritten.len() {
                renumber_following_run(&rewritten, from, &indent, number)
            } else {
                rewritten
            };
            return Some(ListEnter::Rewrite {
                buffer: rewritten,
                cursor: ls,
            });
        }
        return Some(ListEnter::InsertThenRenumber {
            text: format!("\n{}{}. ", item.indent, item.number + 1),
        });
    }

    None
}

/// After inserting a `N.` continuation line, renumber the rest of its run so
/// numbering stays sequential. `cursor` must sit on the freshly inserted
/// line. Returns `None` when nothing follows.
pub(crate) fn renumber_after_list_insert(buffer: &str, cursor: usize) -> Option<String> {
    let ls = line_start(buffer, cursor);
    let le = line_end(buffer, cursor);
    let item = parse_ordered(&buffer[ls..le])?;
    if le >= buffer.len() {
        return None;
    }
    let indent = item.indent.to_string();
    let next = item.number + 1;
    Some(renumber_following_run(buffer, le + 1, &indent, next))
}

/// Tab: indent every line the selection touches by three spaces; a numbered
/// item being nested becomes a sub-bullet.
pub(crate) fn indent_lines(buffer: &str, sel_start: usize, sel_end: usize) -> LinesRewrite {
    rewrite_lines(buffer, sel_start, sel_end, |line| {
        if let Some(item) = parse_ordered(line) {
            format!("{INDENT}{}- {}", item.indent, item.content)
        } else {
            format!("{INDENT}{line}")
        }
    })
}

/// Shift+Tab: remove up to four leading spaces (or one tab) per line.
pub(crate) fn outdent_lines(buffer: &str, sel_start: usize, sel_end: usize) -> LinesRewrite {
    rewrite_lines(buffer, sel_start, sel_end, |line| {
        if let Some(rest) = line.strip_prefix('\t') {
            return rest.to_string();
        }
        let spaces = line
            .chars()
            .take(OUTDENT_MAX_SPACES)
            .take_while(|&c| c == ' ')
            .count();
        line[spaces..].to_string()
    })
}

fn rewrite_lines(
    buffer: &str,
    sel_start: usize,
    sel_end: usize,
    f: impl Fn(&str) -> String,
) -> LinesRewrite {
    let ls = line_start(buffer, sel_start);
    let le = line_end(buffer, sel_end.max(sel_start));

    let rewritten: Vec<String> = buffer[ls..le].split('\n').map(|line| f(line)).collect();
    let rewritten = rewritten.join("\n");
    let new_le = ls + rewritten.len();

    let mut out = String::with_capacity(buffer.len() + rewritten.len());
    out.push_str(&buffer[..ls]);
    out.push_str(&rewritten);
    out.push_str(&buffer[le..]);

    LinesRewrite {
        buffer: out,
        sel_start: ls,
        sel_end: new_le,
    }
}

/// True when deleted text contained an ordered item on any line; the caller
/// should schedule a [`renumber_ordered_lists`] pass after the delete lands.
pub(crate) fn selection_had_ordered_item(deleted: &str) -> bool {
    deleted.split('\n').any(|line| parse_ordered(line).is_some())
}

/// Renumber every ordered run in the buffer, starting at 1 per run. Runs are
/// grouped by matching indent and survive blank or deeper-indented lines.
pub(crate) fn renumber_ordered_lists(buffer: &str) -> String {
    let mut counters: Vec<(String, u64)> = Vec::new();
    let mut out: Vec<String> = Vec::new();

    for line in buffer.split('\n') {
        if line.trim().is_empty() {
            out.push(line.to_string());
            continue;
        }

        let indent_len = leading_ws(line).len();
        if let Some(item) = parse_ordered(line) {
            counters.retain(|(indent, _)| indent.len() <= item.indent.len());
            let number = match counters.iter_mut().find(|(indent, _)| indent == item.indent) {
                Some((_, next)) => {
                    let n = *next;
                    *next += 1;
                    n
                }
                None => {
                    counters.push((item.indent.to_string(), 2));
                    1
                }
            };
            out.push(format!("{}{}", item.indent, item.number_rewritten(number)));
        } else {
            counters.retain(|(indent, _)| indent_len > indent.len());
            out.push(line.to_string());
        }
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(buffer: &str, edit: &TextEdit) -> String {
        format!("{}{}{}", &buffer[..edit.start], edit.insert, &buffer[edit.end..])
    }

    #[test]
    fn test_wrap_selection_in_bold() {
        let buffer = "hello world";
        let edit = toggle_format(buffer, 6, 11, Format::Bold);
        assert_eq!(apply(buffer, &edit), "hello **world**");
        assert_eq!(edit.select, (8, 13));
    }

    #[test]
    fn test_wrap_empty_selection_uses_placeholder() {
        let buffer = "";
        let edit = toggle_format(buffer, 0, 0, Format::Bold);
        assert_eq!(apply(buffer, &edit), "**text**");
        assert_eq!(edit.select, (2, 6));
    }

    #[test]
    fn test_unwrap_selection_inside_bold() {
        let buffer = "a **bold** b";
        let edit = toggle_format(buffer, 4, 8, Format::Bold);
        assert_eq!(apply(buffer, &edit), "a bold b");
        assert_eq!(edit.select, (2, 6));
    }

    #[test]
    fn test_toggle_is_self_inverse() {
        let buffer = "hello world";
        let wrap = toggle_format(buffer, 6, 11, Format::Bold);
        let wrapped = apply(buffer, &wrap);
        let unwrap = toggle_format(&wrapped, wrap.select.0, wrap.select.1, Format::Bold);
        assert_eq!(apply(&wrapped, &unwrap), buffer);
    }

    #[test]
    fn test_italic_does_not_match_bold_markers() {
        let buffer = "**x**";
        let edit = toggle_format(buffer, 2, 3, Format::Italic);
        assert_eq!(apply(buffer, &edit), "***x***");
    }

    #[test]
    fn test_bold_does_not_match_inside_triple_asterisks() {
        let buffer = "***x***";
        let edit = toggle_format(buffer, 3, 4, Format::Bold);
        // No clean `**` pair found, so this wraps again.
        assert_eq!(apply(buffer, &edit), "*****x*****");
    }

    #[test]
    fn test_underline_toggle() {
        let buffer = "<u>under</u>";
        let edit = toggle_format(buffer, 3, 8, Format::Underline);
        assert_eq!(apply(buffer, &edit), "under");
        assert_eq!(edit.select, (0, 5));
    }

    #[test]
    fn test_markers_on_other_lines_are_ignored() {
        let buffer = "**a**\nplain\n**b**";
        let edit = toggle_format(buffer, 6, 11, Format::Bold);
        assert_eq!(apply(buffer, &edit), "**a**\n**plain**\n**b**");
    }

    #[test]
    fn test_link_span_detection() {
        let buffer = "see [docs](https://example.com) end";
        let span = link_span_at(buffer, 7).expect("cursor inside link text");
        assert_eq!(span.text, "docs");
        assert_eq!(span.url, "https://example.com");
        assert_eq!(&buffer[span.start..span.end], "[docs](https://example.com)");

        // Cursor after the closing paren: the scan hits `)` and gives up.
        assert!(link_span_at(buffer, 33).is_none());

        // Cursor on a later line never matches an earlier link.
        let buffer = "[a](b)\ncursor here";
        assert!(link_span_at(buffer, 10).is_none());
    }

    #[test]
    fn test_link_scan_is_bounded() {
        let mut buffer = String::from("[text](url");
        buffer.push_str(&"x".repeat(600));
        assert!(link_span_at(&buffer, buffer.len()).is_none());
    }

    #[test]
    fn test_replace_link_url_and_removal() {
        let buffer = "go [here](http://a) now";
        let span = link_span_at(buffer, 5).unwrap();

        let edit = replace_link_url(&span, "http://b");
        assert_eq!(apply(buffer, &edit), "go [here](http://b) now");

        let edit = replace_link_url(&span, "");
        assert_eq!(apply(buffer, &edit), "go here now");
        assert_eq!(edit.select, (3, 7));
    }

    #[test]
    fn test_insert_link_wraps_selection_or_placeholder() {
        let buffer = "visit site today";
        let edit = insert_link(buffer, 6, 10, "http://x");
        assert_eq!(apply(buffer, &edit), "visit [site](http://x) today");

        let edit = insert_link(buffer, 6, 6, "http://x");
        assert_eq!(apply(buffer, &edit), "visit [link text](http://x)site today");
    }

    #[test]
    fn test_enter_continues_unordered_list() {
        let buffer = "- alpha";
        match continue_list_on_enter(buffer, 7) {
            Some(ListEnter::Insert { text }) => assert_eq!(text, "\n- "),
            other => panic!("expected insert, got {other:?}"),
        }

        let buffer = "  * nested";
        match continue_list_on_enter(buffer, 10) {
            Some(ListEnter::Insert { text }) => assert_eq!(text, "\n  * "),
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[test]
    fn test_enter_on_empty_unordered_item_terminates_list() {
        let buffer = "- alpha\n- ";
        match continue_list_on_enter(buffer, 10) {
            Some(ListEnter::Rewrite { buffer: b, cursor }) => {
                assert_eq!(b, "- alpha\n");
                assert_eq!(cursor, 8);
            }
            other => panic!("expected rewrite, got {other:?}"),
        }
    }

    #[test]
    fn test_enter_inserts_next_number_and_renumbers_tail() {
        let buffer = "1. a\n2. b\n3. c";
        // Enter at the end of "2. b".
        match continue_list_on_enter(buffer, 9) {
            Some(ListEnter::InsertThenRenumber { text }) => {
                assert_eq!(text, "\n3. ");
                let inserted = format!("{}{}{}", &buffer[..9], text, &buffer[9..]);
                assert_eq!(inserted, "1. a\n2. b\n3. \n3. c");
                let renumbered =
                    renumber_after_list_insert(&inserted, 9 + text.len()).expect("tail exists");
                assert_eq!(renumbered, "1. a\n2. b\n3. \n4. c");
            }
            other => panic!("expected insert+renumber, got {other:?}"),
        }
    }

    #[test]
    fn test_enter_on_empty_ordered_item_removes_and_renumbers() {
        let buffer = "1. a\n2. \n3. c\n4. d";
        // Cursor at the end of the empty "2. " line.
        match continue_list_on_enter(buffer, 8) {
            Some(ListEnter::Rewrite { buffer: b, cursor }) => {
                assert_eq!(b, "1. a\n\n2. c\n3. d");
                assert_eq!(cursor, 5);
            }
            other => panic!("expected rewrite, got {other:?}"),
        }
    }

    #[test]
    fn test_tail_renumbering_stops_at_non_list_line() {
        let buffer = "1. a\n2. \n3. b\nplain\n9. unrelated";
        match continue_list_on_enter(buffer, 8) {
            Some(ListEnter::Rewrite { buffer: b, .. }) => {
                assert_eq!(b, "1. a\n\n2. b\nplain\n9. unrelated");
            }
            other => panic!("expected rewrite, got {other:?}"),
        }
    }

    #[test]
    fn test_tail_renumbering_skips_blank_and_nested_lines() {
        let buffer = "1. a\n2. \n\n   nested note\n3. b";
        match continue_list_on_enter(buffer, 8) {
            Some(ListEnter::Rewrite { buffer: b, .. }) => {
                assert_eq!(b, "1. a\n\n\n   nested note\n2. b");
            }
            other => panic!("expected rewrite, got {other:?}"),
        }
    }

    #[test]
    fn test_enter_elsewhere_is_native() {
        assert!(continue_list_on_enter("plain text", 5).is_none());
        assert!(continue_list_on_enter("-not a list", 4).is_none());
        assert!(continue_list_on_enter("1.missing space", 4).is_none());
    }

    #[test]
    fn test_indent_adds_three_spaces_and_converts_numbers() {
        let buffer = "1. one\nplain";
        let rewrite = indent_lines(buffer, 0, buffer.len());
        assert_eq!(rewrite.buffer, "   - one\n   plain");
    }

    #[test]
    fn test_indent_only_touches_selected_lines() {
        let buffer = "a\nb\nc";
        // Selection inside "b" only.
        let rewrite = indent_lines(buffer, 2, 3);
        assert_eq!(rewrite.buffer, "a\n   b\nc");
        assert_eq!(&rewrite.buffer[rewrite.sel_start..rewrite.sel_end], "   b");
    }

    #[test]
    fn test_outdent_removes_up_to_four_spaces_or_one_tab() {
        let buffer = "      six\n\ttabbed\n  two\nplain";
        let rewrite = outdent_lines(buffer, 0, buffer.len());
        assert_eq!(rewrite.buffer, "  six\ntabbed\ntwo\nplain");
    }

    #[test]
    fn test_selection_had_ordered_item() {
        assert!(selection_had_ordered_item("x\n2. gone\ny"));
        assert!(!selection_had_ordered_item("nothing\n- bullet"));
    }

    #[test]
    fn test_full_renumber_by_indent_runs() {
        let input = "3. a\n7. b\n\n9. c\nplain\n5. fresh\n   2. deep\n   9. deep2\n6. back";
        let expected = "1. a\n2. b\n\n3. c\nplain\n1. fresh\n   1. deep\n   2. deep2\n2. back";
        assert_eq!(renumber_ordered_lists(input), expected);
    }

    #[test]
    fn test_utf16_byte_roundtrip_with_multibyte() {
        let s = "a→b😀c";
        for (byte_idx, _) in s.char_indices() {
            let utf16 = byte_idx_to_utf16(s, byte_idx);
            assert_eq!(utf16_to_byte_idx(s, utf16), byte_idx);
        }
        assert_eq!(utf16_to_byte_idx(s, byte_idx_to_utf16(s, s.len())), s.len());
    }
}
