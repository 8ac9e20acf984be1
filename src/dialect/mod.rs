//! The markdown dialect read and written by the card editor.
//!
//! Cards are plain markdown plus a few HTML-comment markers:
//! `<!-- block -->` between blocks, `<!-- row -->`/`<!-- col -->`/
//! `<!-- /row -->` for two-column rows, `!video(url)` for plain video embeds,
//! and a small set of recognized HTML forms (img/details/callout/aligned div).
//!
//! Decoding is best-effort and never fails: malformed markup degrades to the
//! documented defaults (empty string, left alignment, closed details) or to a
//! plain text block. Encoding is minimal: the plain markdown forms are kept
//! unless a block carries sizing or non-default alignment.

use crate::models::{Align, Block, BlockData, Document, DEFAULT_DETAILS_SUMMARY};

pub(crate) const BLOCK_SEPARATOR: &str = "<!-- block -->";
pub(crate) const ROW_START: &str = "<!-- row -->";
pub(crate) const ROW_END: &str = "<!-- /row -->";
pub(crate) const COL_SEPARATOR: &str = "<!-- col -->";

// ========== helpers ==========

/// Split on `BLOCK_SEPARATOR` demanding at least one newline on each side;
/// the surrounding newline runs are consumed with the separator.
fn split_blocks(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut search_from = 0;

    while let Some(pos) = text[search_from..].find(BLOCK_SEPARATOR) {
        let sep_start = search_from + pos;
        let sep_end = sep_start + BLOCK_SEPARATOR.len();

        let mut before = sep_start;
        while before > start && bytes[before - 1] == b'\n' {
            before -= 1;
        }
        let mut after = sep_end;
        while after < bytes.len() && bytes[after] == b'\n' {
            after += 1;
        }

        if before < sep_start && after > sep_end {
            parts.push(&text[start..before]);
            start = after;
            search_from = after;
        } else {
            search_from = sep_end;
        }
    }

    parts.push(&text[start..]);
    parts
}

/// Split on `COL_SEPARATOR`, consuming any newlines directly around it.
fn split_columns(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut search_from = 0;

    while let Some(pos) = text[search_from..].find(COL_SEPARATOR) {
        let sep_start = search_from + pos;
        let sep_end = sep_start + COL_SEPARATOR.len();

        let mut before = sep_start;
        while before > start && bytes[before - 1] == b'\n' {
            before -= 1;
        }
        let mut after = sep_end;
        while after < bytes.len() && bytes[after] == b'\n' {
            after += 1;
        }

        parts.push(&text[start..before]);
        start = after;
        search_from = after;
    }

    parts.push(&text[start..]);
    parts
}

/// First `name="value"` occurrence anywhere in `html`.
fn attr_value<'a>(html: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}=\"");
    let start = html.find(&needle)? + needle.len();
    let end = html[start..].find('"')?;
    Some(&html[start..start + end])
}

/// Text between the first `open` and the first `close` after it.
fn inner_between<'a>(s: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = s.find(open)? + open.len();
    let end = s[start..].find(close)?;
    Some(&s[start..start + end])
}

/// Remove every `prop<ws>value[;]<ws>` occurrence (`prop` includes the colon).
fn strip_directive(style: &str, prop: &str, value: &str) -> String {
    let mut out = String::with_capacity(style.len());
    let mut rest = style;

    while let Some(pos) = rest.find(prop) {
        let after_prop = &rest[pos + prop.len()..];
        let after_ws = after_prop.trim_start();
        if let Some(after_value) = after_ws.strip_prefix(value) {
            let tail = after_value.strip_prefix(';').unwrap_or(after_value);
            out.push_str(&rest[..pos]);
            rest = tail.trim_start();
        } else {
            out.push_str(&rest[..pos + prop.len()]);
            rest = after_prop;
        }
    }

    out.push_str(rest);
    out
}

// ========== style parsing ==========

/// Media alignment from an inline style string.
///
/// Both margins auto means centered, `margin-left` alone means right-aligned.
/// `margin-right: auto` alone is never produced by the encoder and maps to
/// left here; that asymmetry is part of the dialect.
pub(crate) fn parse_alignment_from_style(style: Option<&str>) -> Align {
    let Some(style) = style else {
        return Align::Left;
    };
    let has_margin_left =
        style.contains("margin-left: auto") || style.contains("margin-left:auto");
    let has_margin_right =
        style.contains("margin-right: auto") || style.contains("margin-right:auto");

    if has_margin_left && has_margin_right {
        Align::Center
    } else if has_margin_left {
        Align::Right
    } else {
        Align::Left
    }
}

/// Text alignment from a `text-align: <value>` directive; left when absent
/// or unrecognized.
pub(crate) fn parse_text_alignment_from_style(style: &str) -> Align {
    let Some(pos) = style.find("text-align:") else {
        return Align::Left;
    };
    let value = style[pos + "text-align:".len()..].trim_start();
    for candidate in [Align::Left, Align::Center, Align::Right] {
        if value.starts_with(candidate.as_ref()) {
            return candidate;
        }
    }
    Align::Left
}

/// Rebuild a media style string: `display: block`, then the size-only part of
/// the existing style (alignment margins and display stripped), then the
/// margins for the requested alignment.
pub(crate) fn build_media_style_string(style: Option<&str>, align: Align) -> String {
    let mut parts = vec!["display: block".to_string()];

    if let Some(style) = style {
        let size_only = strip_directive(style, "margin-left:", "auto");
        let size_only = strip_directive(&size_only, "margin-right:", "auto");
        let size_only = strip_directive(&size_only, "display:", "block");
        // Dangling separators would otherwise accumulate across
        // encode/decode cycles and break idempotency.
        let size_only = size_only.trim().trim_end_matches(';').trim_end();
        if !size_only.is_empty() {
            parts.push(size_only.to_string());
        }
    }

    let margins = align.margin_style();
    if !margins.is_empty() {
        parts.push(margins.to_string());
    }

    parts.join("; ")
}

// ========== decoding ==========

/// Whole-segment `![alt](src)` on a single line.
fn parse_md_image(trimmed: &str) -> Option<(String, String)> {
    if trimmed.contains('\n') || !trimmed.starts_with("![") || !trimmed.ends_with(')') {
        return None;
    }
    let close_bracket = trimmed.find("](")?;
    let alt = &trimmed[2..close_bracket];
    let rest = &trimmed[close_bracket + 2..];
    let paren = rest.find(')')?;
    Some((alt.to_string(), rest[..paren].to_string()))
}

fn is_divider(trimmed: &str) -> bool {
    if trimmed.len() < 3 {
        return false;
    }
    let mut chars = trimmed.chars();
    let first = chars.next().unwrap_or(' ');
    matches!(first, '*' | '-' | '_') && chars.all(|c| c == first)
}

fn parse_details(trimmed: &str) -> BlockData {
    let summary = inner_between(trimmed, "<summary>", "</summary>")
        .map(str::trim)
        .unwrap_or(DEFAULT_DETAILS_SUMMARY)
        .to_string();

    let body = match (trimmed.find("</summary>"), trimmed.rfind("</details>")) {
        (Some(s), Some(e)) if s + "</summary>".len() <= e => {
            trimmed[s + "</summary>".len()..e].trim().to_string()
        }
        _ => String::new(),
    };

    BlockData::Details {
        summary,
        body,
        is_open: trimmed.contains("<details open"),
    }
}

fn parse_html_image(trimmed: &str) -> BlockData {
    let style = attr_value(trimmed, "style").map(str::to_string);
    BlockData::Image {
        src: attr_value(trimmed, "src").unwrap_or_default().to_string(),
        alt: attr_value(trimmed, "alt").unwrap_or_default().to_string(),
        align: parse_alignment_from_style(style.as_deref()),
        style,
    }
}

fn parse_html_video(trimmed: &str) -> BlockData {
    // The style must sit inside the opening container tag, not on the iframe.
    let opening_tag = trimmed
        .find('>')
        .map(|gt| &trimmed[..gt])
        .unwrap_or(trimmed);
    let style = attr_value(opening_tag, "style").map(str::to_string);

    BlockData::Video {
        src: attr_value(trimmed, "src").unwrap_or_default().to_string(),
        align: parse_alignment_from_style(style.as_deref()),
        style,
    }
}

fn parse_aligned_text(raw: &str, trimmed: &str) -> BlockData {
    // Expect `<div style="...">` with nothing between the closing quote and
    // the `>`; anything else leaves the segment as unaligned raw text.
    let prefix = "<div style=\"";
    let style_start = prefix.len();
    let parsed = trimmed[style_start..].find('"').and_then(|quote| {
        let style = &trimmed[style_start..style_start + quote];
        let after_quote = &trimmed[style_start + quote + 1..];
        let inner = after_quote.strip_prefix('>')?;
        let content = &inner[..inner.find("</div>")?];
        Some((style, content))
    });

    match parsed {
        Some((style, content)) => BlockData::Text {
            content: content.trim().to_string(),
            align: parse_text_alignment_from_style(style),
        },
        None => BlockData::Text {
            content: raw.to_string(),
            align: Align::Left,
        },
    }
}

/// Classify one raw segment. Precedence: details, image, video, callout,
/// aligned text, divider, then plain text with the segment kept verbatim.
pub(crate) fn parse_single_block(raw: &str) -> Block {
    let trimmed = raw.trim();

    let data = if trimmed.starts_with("<details") {
        parse_details(trimmed)
    } else if trimmed.starts_with("<img") {
        parse_html_image(trimmed)
    } else if let Some((alt, src)) = parse_md_image(trimmed) {
        BlockData::Image {
            src,
            alt,
            style: None,
            align: Align::Left,
        }
    } else if trimmed.starts_with("!video(") {
        let src = inner_between(trimmed, "!video(", ")").unwrap_or_default();
        BlockData::Video {
            src: src.to_string(),
            style: None,
            align: Align::Left,
        }
    } else if trimmed.starts_with("<div class=\"video-container\"") {
        parse_html_video(trimmed)
    } else if trimmed.starts_with("<div class=\"callout\"") {
        BlockData::Callout {
            content: inner_between(trimmed, "<div class=\"callout\">", "</div>")
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        }
    } else if trimmed.starts_with("<div style=\"text-align:")
        || trimmed.starts_with("<div style=\"text-align :")
    {
        parse_aligned_text(raw, trimmed)
    } else if is_divider(trimmed) {
        BlockData::Divider
    } else {
        BlockData::Text {
            content: raw.to_string(),
            align: Align::Left,
        }
    };

    Block::with_data(data)
}

/// Decode a card's markdown into its block tree. Never fails.
pub(crate) fn parse_into_blocks(markdown: &str) -> Document {
    split_blocks(markdown)
        .into_iter()
        .map(|raw| {
            let trimmed = raw.trim();

            if trimmed.starts_with(ROW_START) && trimmed.ends_with(ROW_END) {
                let inner = trimmed[ROW_START.len()..trimmed.len() - ROW_END.len()].trim();
                let columns = split_columns(inner);
                // A row needs exactly two columns; anything else degrades to
                // a plain segment below.
                if columns.len() == 2 {
                    return Block::with_data(BlockData::Row {
                        left: Box::new(parse_single_block(columns[0])),
                        right: Box::new(parse_single_block(columns[1])),
                    });
                }
            }

            parse_single_block(raw)
        })
        .collect()
}

// ========== encoding ==========

fn has_size(style: &Option<String>) -> bool {
    style
        .as_deref()
        .is_some_and(|s| s.contains("width") || s.contains("max-width"))
}

/// Encode one block back to dialect text.
pub(crate) fn block_to_markdown(block: &Block) -> String {
    match &block.data {
        BlockData::Text { content, align } => {
            let content = content.trim();
            if *align != Align::Left {
                format!("<div style=\"{}\">{content}</div>", align.text_style())
            } else {
                content.to_string()
            }
        }
        BlockData::Image {
            src,
            alt,
            style,
            align,
        } => {
            if has_size(style) || *align != Align::Left {
                format!(
                    "<img src=\"{src}\" alt=\"{alt}\" style=\"{}\">",
                    build_media_style_string(style.as_deref(), *align)
                )
            } else {
                format!("![{alt}]({src})")
            }
        }
        BlockData::Video { src, style, align } => {
            if has_size(style) || *align != Align::Left {
                format!(
                    "<div class=\"video-container\" style=\"{}\"><iframe src=\"{src}\" \
                     frameborder=\"0\" allow=\"accelerometer; autoplay; clipboard-write; \
                     encrypted-media; gyroscope; picture-in-picture\" allowfullscreen>\
                     </iframe></div>",
                    build_media_style_string(style.as_deref(), *align)
                )
            } else {
                format!("!video({src})")
            }
        }
        BlockData::Details {
            summary,
            body,
            is_open,
        } => {
            let open_attr = if *is_open { " open" } else { "" };
            format!("<details{open_attr}>\n<summary>{summary}</summary>\n\n{body}\n\n</details>")
        }
        BlockData::Callout { content } => format!("<div class=\"callout\">{content}</div>"),
        BlockData::Divider => "***".to_string(),
        BlockData::Row { left, right } => format!(
            "{ROW_START}\n{}\n{COL_SEPARATOR}\n{}\n{ROW_END}",
            block_to_markdown(left),
            block_to_markdown(right)
        ),
    }
}

/// Encode a document, blocks joined by the block separator.
pub(crate) fn blocks_to_markdown(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(block_to_markdown)
        .collect::<Vec<_>>()
        .join(&format!("\n\n{BLOCK_SEPARATOR}\n\n"))
}

// ========== cards ==========

/// Split a session document into cards on lines holding only `---`.
/// A `---` on the very first line is content, not a separator.
pub(crate) fn split_into_cards(text: &str) -> Vec<String> {
    let mut cards: Vec<Vec<&str>> = vec![Vec::new()];
    for (i, line) in text.lines().enumerate() {
        if i > 0 && line.trim() == "---" {
            cards.push(Vec::new());
        } else {
            cards.last_mut().expect("cards is never empty").push(line);
        }
    }
    cards.into_iter().map(|lines| lines.join("\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockKind;

    /// Ids are regenerated on every parse; blank them out for equivalence
    /// comparisons.
    fn strip_ids(mut blocks: Document) -> Document {
        fn strip(block: &mut Block) {
            block.id = String::new();
            if let BlockData::Row { left, right } = &mut block.data {
                strip(left);
                strip(right);
            }
        }
        for block in &mut blocks {
            strip(block);
        }
        blocks
    }

    #[test]
    fn test_decode_text_then_image() {
        let blocks = parse_into_blocks("Hello\n<!-- block -->\n![alt](x.png)");
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0].data,
            BlockData::Text {
                content: "Hello".to_string(),
                align: Align::Left,
            }
        );
        assert_eq!(
            blocks[1].data,
            BlockData::Image {
                src: "x.png".to_string(),
                alt: "alt".to_string(),
                style: None,
                align: Align::Left,
            }
        );
    }

    #[test]
    fn test_separator_requires_surrounding_newlines() {
        let blocks = parse_into_blocks("before <!-- block --> after");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind(), BlockKind::Text);
    }

    #[test]
    fn test_separator_consumes_extra_newlines() {
        let blocks = parse_into_blocks("a\n\n\n<!-- block -->\n\nb");
        assert_eq!(blocks.len(), 2);
        match (&blocks[0].data, &blocks[1].data) {
            (
                BlockData::Text { content: a, .. },
                BlockData::Text { content: b, .. },
            ) => {
                assert_eq!(a, "a");
                assert_eq!(b, "b");
            }
            other => panic!("expected two text blocks, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_details_variants() {
        let blocks =
            parse_into_blocks("<details open>\n<summary>More</summary>\n\nbody text\n\n</details>");
        assert_eq!(
            blocks[0].data,
            BlockData::Details {
                summary: "More".to_string(),
                body: "body text".to_string(),
                is_open: true,
            }
        );

        // No summary tag: default summary, body needs the closing summary tag.
        let blocks = parse_into_blocks("<details>\nno summary here\n</details>");
        assert_eq!(
            blocks[0].data,
            BlockData::Details {
                summary: DEFAULT_DETAILS_SUMMARY.to_string(),
                body: String::new(),
                is_open: false,
            }
        );
    }

    #[test]
    fn test_decode_html_image_with_alignment() {
        let blocks = parse_into_blocks(
            "<img src=\"a.png\" alt=\"pic\" style=\"display: block; width: 300px; \
             margin-left: auto; margin-right: auto\">",
        );
        assert_eq!(
            blocks[0].data,
            BlockData::Image {
                src: "a.png".to_string(),
                alt: "pic".to_string(),
                style: Some(
                    "display: block; width: 300px; margin-left: auto; margin-right: auto"
                        .to_string()
                ),
                align: Align::Center,
            }
        );
    }

    #[test]
    fn test_decode_video_forms() {
        let blocks = parse_into_blocks("!video(https://www.youtube.com/embed/abc)");
        assert_eq!(
            blocks[0].data,
            BlockData::Video {
                src: "https://www.youtube.com/embed/abc".to_string(),
                style: None,
                align: Align::Left,
            }
        );

        let blocks = parse_into_blocks(
            "<div class=\"video-container\" style=\"display: block; width: 400px; \
             margin-left: auto\"><iframe src=\"https://player.vimeo.com/video/1\" \
             frameborder=\"0\" allowfullscreen></iframe></div>",
        );
        match &blocks[0].data {
            BlockData::Video { src, style, align } => {
                assert_eq!(src, "https://player.vimeo.com/video/1");
                assert_eq!(
                    style.as_deref(),
                    Some("display: block; width: 400px; margin-left: auto")
                );
                assert_eq!(*align, Align::Right);
            }
            other => panic!("expected video, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_callout_and_divider() {
        let blocks = parse_into_blocks("<div class=\"callout\">Heads up</div>\n\n<!-- block -->\n\n***");
        assert_eq!(
            blocks[0].data,
            BlockData::Callout {
                content: "Heads up".to_string()
            }
        );
        assert_eq!(blocks[1].data, BlockData::Divider);
    }

    #[test]
    fn test_divider_shapes() {
        for seg in ["***", "-----", "___"] {
            assert_eq!(parse_single_block(seg).kind(), BlockKind::Divider);
        }
        for seg in ["**", "**-", "--", "* * *"] {
            assert_eq!(parse_single_block(seg).kind(), BlockKind::Text);
        }
    }

    #[test]
    fn test_decode_aligned_text() {
        let blocks = parse_into_blocks("<div style=\"text-align: center\">Centered</div>");
        assert_eq!(
            blocks[0].data,
            BlockData::Text {
                content: "Centered".to_string(),
                align: Align::Center,
            }
        );
    }

    #[test]
    fn test_aligned_text_with_extra_attr_degrades_to_raw_text() {
        let raw = "<div style=\"text-align: center\" class=\"x\">y</div>";
        let blocks = parse_into_blocks(raw);
        assert_eq!(
            blocks[0].data,
            BlockData::Text {
                content: raw.to_string(),
                align: Align::Left,
            }
        );
    }

    #[test]
    fn test_decode_row() {
        let blocks = parse_into_blocks(
            "<!-- row -->\nleft text\n<!-- col -->\n![a](b.png)\n<!-- /row -->",
        );
        assert_eq!(blocks.len(), 1);
        match &blocks[0].data {
            BlockData::Row { left, right } => {
                assert_eq!(left.kind(), BlockKind::Text);
                assert_eq!(right.kind(), BlockKind::Image);
            }
            other => panic!("expected row, got {other:?}"),
        }
    }

    #[test]
    fn test_row_with_wrong_column_count_degrades_to_text() {
        let raw = "<!-- row -->\na\n<!-- col -->\nb\n<!-- col -->\nc\n<!-- /row -->";
        let blocks = parse_into_blocks(raw);
        assert_eq!(blocks[0].kind(), BlockKind::Text);

        let raw = "<!-- row -->\nonly one\n<!-- /row -->";
        assert_eq!(parse_into_blocks(raw)[0].kind(), BlockKind::Text);
    }

    #[test]
    fn test_malformed_html_never_panics() {
        for raw in [
            "<img src=",
            "<img",
            "<details><summary>unterminated",
            "<div class=\"video-container\"",
            "<div class=\"callout\" data-x=\"1\">y</div>",
            "![unclosed](",
        ] {
            let blocks = parse_into_blocks(raw);
            assert_eq!(blocks.len(), 1);
        }

        // Unterminated img: attributes fall back to empty / left.
        match &parse_into_blocks("<img src=")[0].data {
            BlockData::Image {
                src, alt, style, align,
            } => {
                assert_eq!(src, "");
                assert_eq!(alt, "");
                assert!(style.is_none());
                assert_eq!(*align, Align::Left);
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn test_alignment_from_style_asymmetry() {
        assert_eq!(parse_alignment_from_style(None), Align::Left);
        assert_eq!(
            parse_alignment_from_style(Some("margin-left:auto")),
            Align::Right
        );
        assert_eq!(
            parse_alignment_from_style(Some("margin-left: auto; margin-right:auto")),
            Align::Center
        );
        // margin-right alone is not a recognized alignment.
        assert_eq!(
            parse_alignment_from_style(Some("margin-right: auto")),
            Align::Left
        );
    }

    #[test]
    fn test_build_media_style_string_strips_and_rebuilds() {
        let style = Some("margin-left: auto; width: 240px; display: block; margin-right:auto");
        assert_eq!(
            build_media_style_string(style, Align::Right),
            "display: block; width: 240px; margin-left: auto"
        );
        assert_eq!(build_media_style_string(None, Align::Center), "display: block; margin-left: auto; margin-right: auto");
        assert_eq!(build_media_style_string(None, Align::Left), "display: block");
    }

    #[test]
    fn test_encode_text_alignment_wrapper_only_when_needed() {
        let mut block = Block::new(BlockKind::Text);
        if let BlockData::Text { content, .. } = &mut block.data {
            *content = "  hi  ".to_string();
        }
        assert_eq!(block_to_markdown(&block), "hi");

        block.set_align(Align::Right);
        assert_eq!(
            block_to_markdown(&block),
            "<div style=\"text-align: right\">hi</div>"
        );
    }

    #[test]
    fn test_encode_image_plain_vs_styled() {
        let mut img = Block::image("x.png");
        assert_eq!(block_to_markdown(&img), "![](x.png)");

        img.set_align(Align::Center);
        assert_eq!(
            block_to_markdown(&img),
            "<img src=\"x.png\" alt=\"\" style=\"display: block; margin-left: auto; \
             margin-right: auto\">"
        );

        img.set_align(Align::Left);
        img.set_media_style(Some("max-width: 300px; width: 300px".to_string()));
        assert_eq!(
            block_to_markdown(&img),
            "<img src=\"x.png\" alt=\"\" style=\"display: block; max-width: 300px; \
             width: 300px\">"
        );
    }

    #[test]
    fn test_encode_video_plain_vs_styled() {
        let mut vid = Block::video("https://www.youtube.com/embed/abc");
        assert_eq!(
            block_to_markdown(&vid),
            "!video(https://www.youtube.com/embed/abc)"
        );

        vid.set_align(Align::Center);
        let html = block_to_markdown(&vid);
        assert!(html.starts_with("<div class=\"video-container\" style=\"display: block; "));
        assert!(html.contains("allowfullscreen"));
        assert!(html.contains("src=\"https://www.youtube.com/embed/abc\""));
    }

    #[test]
    fn test_roundtrip_each_variant() {
        let source = [
            "plain paragraph with **bold**",
            "<div style=\"text-align: center\">centered</div>",
            "![alt](img.png)",
            "<img src=\"img.png\" alt=\"alt\" style=\"display: block; width: 200px; margin-left: auto\">",
            "!video(https://www.youtube.com/embed/abc)",
            "<details open>\n<summary>Summary</summary>\n\nbody\n\n</details>",
            "<div class=\"callout\">note</div>",
            "***",
            "<!-- row -->\nleft\n<!-- col -->\nright\n<!-- /row -->",
        ]
        .join("\n\n<!-- block -->\n\n");

        let decoded = parse_into_blocks(&source);
        assert_eq!(decoded.len(), 9);

        let reencoded = blocks_to_markdown(&decoded);
        let redecoded = parse_into_blocks(&reencoded);
        assert_eq!(strip_ids(decoded), strip_ids(redecoded));
    }

    #[test]
    fn test_encode_decode_idempotent_after_one_cycle() {
        let messy = "  spaced text  \n\n<!-- block -->\n\n<img src=\"a.png\" alt=\"\" \
                     style=\"width: 120px; margin-left:auto;  margin-right:auto\">";
        let once = blocks_to_markdown(&parse_into_blocks(messy));
        let twice = blocks_to_markdown(&parse_into_blocks(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_split_into_cards() {
        let cards = split_into_cards("first card\n---\nsecond\ncard\n ---\nthird");
        assert_eq!(cards, vec!["first card", "second\ncard", "third"]);

        // A leading --- line is content of the first card, not a separator.
        let cards = split_into_cards("---\nafter");
        assert_eq!(cards, vec!["---\nafter"]);

        // A ----- line is not a card separator (it is a divider segment).
        let cards = split_into_cards("a\n-----\nb");
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn test_markdown_image_must_fill_the_segment() {
        assert_eq!(parse_single_block("![a](x) trailing").kind(), BlockKind::Text);
        assert_eq!(
            parse_single_block("![a](x)\n![b](y)").kind(),
            BlockKind::Text
        );
        assert_eq!(parse_single_block("![a](x)").kind(), BlockKind::Image);
    }
}
