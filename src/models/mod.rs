use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::{AsRefStr, Display, EnumString};

/// Summary shown for a collapsible block when the author left it blank.
pub(crate) const DEFAULT_DETAILS_SUMMARY: &str = "Click to expand";

/// Horizontal alignment of a text or media block.
///
/// `Left` is the default and the "no wrapper emitted" case: the encoder only
/// produces alignment markup for `Center`/`Right`, which keeps untouched
/// documents byte-stable across edit sessions.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// Margin directives used by media blocks.
    ///
    /// Note the asymmetry: `Right` emits only `margin-left: auto`, and
    /// `margin-right: auto` alone is never produced (nor mapped back).
    pub fn margin_style(self) -> &'static str {
        match self {
            Align::Center => "margin-left: auto; margin-right: auto",
            Align::Right => "margin-left: auto",
            Align::Left => "",
        }
    }

    /// `text-align` directive for text blocks; empty for the default.
    pub fn text_style(self) -> String {
        match self {
            Align::Left => String::new(),
            other => format!("text-align: {other}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum BlockKind {
    Text,
    Image,
    Video,
    Details,
    Callout,
    Divider,
    Row,
}

/// Which column of a row block an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum ColumnSide {
    Left,
    Right,
}

/// One semantic unit of card content.
///
/// `id` is opaque and unique within a single document snapshot only: parsing
/// regenerates ids, in-place edits reuse them, and undo/redo restores make no
/// promise either way.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Block {
    pub id: String,
    #[serde(flatten)]
    pub data: BlockData,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum BlockData {
    Text {
        content: String,
        align: Align,
    },
    Image {
        src: String,
        alt: String,
        style: Option<String>,
        align: Align,
    },
    Video {
        src: String,
        style: Option<String>,
        align: Align,
    },
    Details {
        summary: String,
        body: String,
        is_open: bool,
    },
    Callout {
        content: String,
    },
    Divider,
    /// Two side-by-side columns. Columns are always non-row blocks; the
    /// factory and the codec both enforce a recursion depth of exactly one.
    Row {
        left: Box<Block>,
        right: Box<Block>,
    },
}

/// The editor's document: a flat ordered sequence of top-level blocks.
pub(crate) type Document = Vec<Block>;

static BLOCK_COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Session-unique block id: `block-` plus a hashed per-call counter.
pub(crate) fn next_block_id() -> String {
    let mut hasher = DefaultHasher::new();
    BLOCK_COUNTER.fetch_add(1, Ordering::SeqCst).hash(&mut hasher);
    format!("block-{}", hasher.finish())
}

impl Block {
    pub fn with_data(data: BlockData) -> Self {
        Self {
            id: next_block_id(),
            data,
        }
    }

    /// Create a new block of the given kind with its documented defaults.
    pub fn new(kind: BlockKind) -> Self {
        let data = match kind {
            BlockKind::Text => BlockData::Text {
                content: String::new(),
                align: Align::Left,
            },
            BlockKind::Image => BlockData::Image {
                src: String::new(),
                alt: String::new(),
                style: None,
                align: Align::Left,
            },
            BlockKind::Video => BlockData::Video {
                src: String::new(),
                style: None,
                align: Align::Left,
            },
            BlockKind::Details => BlockData::Details {
                summary: DEFAULT_DETAILS_SUMMARY.to_string(),
                body: String::new(),
                is_open: false,
            },
            BlockKind::Callout => BlockData::Callout {
                content: String::new(),
            },
            BlockKind::Divider => BlockData::Divider,
            BlockKind::Row => BlockData::Row {
                left: Box::new(Block::new(BlockKind::Text)),
                right: Box::new(Block::new(BlockKind::Text)),
            },
        };
        Self::with_data(data)
    }

    pub fn image(src: impl Into<String>) -> Self {
        Self::with_data(BlockData::Image {
            src: src.into(),
            alt: String::new(),
            style: None,
            align: Align::Left,
        })
    }

    pub fn video(src: impl Into<String>) -> Self {
        Self::with_data(BlockData::Video {
            src: src.into(),
            style: None,
            align: Align::Left,
        })
    }

    pub fn kind(&self) -> BlockKind {
        match self.data {
            BlockData::Text { .. } => BlockKind::Text,
            BlockData::Image { .. } => BlockKind::Image,
            BlockData::Video { .. } => BlockKind::Video,
            BlockData::Details { .. } => BlockKind::Details,
            BlockData::Callout { .. } => BlockKind::Callout,
            BlockData::Divider => BlockKind::Divider,
            BlockData::Row { .. } => BlockKind::Row,
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(
            self.data,
            BlockData::Image { .. } | BlockData::Video { .. }
        )
    }

    /// Alignment of a text/media block (`None` for the other variants).
    pub fn align(&self) -> Option<Align> {
        match &self.data {
            BlockData::Text { align, .. }
            | BlockData::Image { align, .. }
            | BlockData::Video { align, .. } => Some(*align),
            _ => None,
        }
    }

    pub fn set_align(&mut self, new_align: Align) {
        match &mut self.data {
            BlockData::Text { align, .. }
            | BlockData::Image { align, .. }
            | BlockData::Video { align, .. } => *align = new_align,
            _ => {}
        }
    }

    /// Persisted style string of a media block.
    pub fn media_style(&self) -> Option<&str> {
        match &self.data {
            BlockData::Image { style, .. } | BlockData::Video { style, .. } => style.as_deref(),
            _ => None,
        }
    }

    pub fn set_media_style(&mut self, new_style: Option<String>) {
        match &mut self.data {
            BlockData::Image { style, .. } | BlockData::Video { style, .. } => *style = new_style,
            _ => {}
        }
    }

    pub fn column(&self, side: ColumnSide) -> Option<&Block> {
        match &self.data {
            BlockData::Row { left, right } => Some(match side {
                ColumnSide::Left => left,
                ColumnSide::Right => right,
            }),
            _ => None,
        }
    }

    pub fn column_mut(&mut self, side: ColumnSide) -> Option<&mut Block> {
        match &mut self.data {
            BlockData::Row { left, right } => Some(match side {
                ColumnSide::Left => left,
                ColumnSide::Right => right,
            }),
            _ => None,
        }
    }
}
