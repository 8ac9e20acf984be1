//! Media interaction: resize geometry, alignment toolbar placement, video
//! embed URLs and upload tracking.
//!
//! Everything in this module is pure; the editor layer owns the DOM side
//! (corner handles, document-level pointer listeners, live style writes) and
//! feeds viewport numbers in.

use strum::{AsRefStr, Display};

pub(crate) const MIN_WIDTH_PERCENT: f64 = 20.0;
pub(crate) const MAX_WIDTH_PERCENT: f64 = 100.0;

const TOOLBAR_WIDTH: f64 = 90.0;
const TOOLBAR_HEIGHT: f64 = 32.0;
const TOOLBAR_GAP: f64 = 8.0;
const TOOLBAR_MARGIN: f64 = 10.0;

/// The four resize handles. Dragging an east handle rightward grows the
/// element; a west handle inverts the delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Corner {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::Nw, Corner::Ne, Corner::Sw, Corner::Se];

    fn grows_rightward(self) -> bool {
        matches!(self, Corner::Ne | Corner::Se)
    }
}

/// One resize drag, captured at pointer-down. Bounds come from the card
/// width at drag start; the aspect ratio is fixed for the whole gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ResizeGesture {
    pub corner: Corner,
    pub start_x: f64,
    pub start_width: f64,
    aspect_ratio: f64,
    pub min_width: f64,
    pub max_width: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ResizedBox {
    pub width: f64,
    pub height: f64,
}

impl ResizeGesture {
    pub fn begin(
        corner: Corner,
        start_x: f64,
        start_width: f64,
        start_height: f64,
        card_width: f64,
    ) -> Self {
        Self {
            corner,
            start_x,
            start_width,
            aspect_ratio: if start_height > 0.0 {
                start_width / start_height
            } else {
                1.0
            },
            min_width: card_width * MIN_WIDTH_PERCENT / 100.0,
            max_width: card_width * MAX_WIDTH_PERCENT / 100.0,
        }
    }

    /// Width/height for the current pointer position, clamped to the card
    /// bounds with the aspect ratio preserved.
    pub fn apply_drag(&self, client_x: f64) -> ResizedBox {
        let raw_delta = client_x - self.start_x;
        let delta = if self.corner.grows_rightward() {
            raw_delta
        } else {
            -raw_delta
        };

        let width = (self.start_width + delta).clamp(self.min_width, self.max_width);
        ResizedBox {
            width,
            height: width / self.aspect_ratio,
        }
    }
}

impl ResizedBox {
    /// Persisted style for an image block; height follows via `height: auto`
    /// in the live element, so only widths are stored.
    pub fn image_style(&self) -> String {
        let w = self.width.round();
        format!("max-width: {w}px; width: {w}px")
    }

    /// Persisted style for a video container. The explicit height replaces
    /// the container's aspect-ratio padding hack, which must be zeroed.
    pub fn video_style(&self) -> String {
        let w = self.width.round();
        let h = self.height.round();
        format!("max-width: {w}px; width: {w}px; height: {h}px; padding-bottom: 0")
    }
}

/// Alignment toolbar position: centered above the element, clamped into the
/// viewport, dropping below the element when there is no room above.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ToolbarPosition {
    pub left: f64,
    pub top: f64,
}

pub(crate) fn place_toolbar(
    element_left: f64,
    element_top: f64,
    element_width: f64,
    element_bottom: f64,
    viewport_width: f64,
) -> ToolbarPosition {
    let left = (element_left + element_width / 2.0 - TOOLBAR_WIDTH / 2.0)
        .clamp(TOOLBAR_MARGIN, viewport_width - TOOLBAR_WIDTH - TOOLBAR_MARGIN);

    let mut top = element_top - TOOLBAR_HEIGHT - TOOLBAR_GAP;
    if top < TOOLBAR_MARGIN {
        top = element_bottom + TOOLBAR_GAP;
    }

    ToolbarPosition { left, top }
}

// ========== video embeds ==========

/// Minimal scheme+host check; the dialect only ever carries http(s) URLs.
fn is_valid_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty()
        }
        None => false,
    }
}

fn youtube_watch_id(url: &str) -> Option<&str> {
    let query = url.split_once('?')?.1;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("v="))
        .filter(|id| !id.is_empty())
}

/// Convert a pasted video URL to its embeddable form.
///
/// YouTube watch/short URLs and Vimeo page URLs become embed URLs; any other
/// valid URL passes through unchanged (it may already be an embed link).
/// `None` means the URL is invalid and no block should be created.
pub(crate) fn convert_to_embed_url(url: &str) -> Option<String> {
    let url = url.trim();
    if !is_valid_http_url(url) {
        return None;
    }

    if url.contains("youtube.com/watch") {
        return youtube_watch_id(url).map(|id| format!("https://www.youtube.com/embed/{id}"));
    }

    if let Some(rest) = url.split_once("youtu.be/").map(|(_, rest)| rest) {
        let id = rest.split(['?', '/']).next().unwrap_or("");
        return if id.is_empty() {
            None
        } else {
            Some(format!("https://www.youtube.com/embed/{id}"))
        };
    }

    if url.contains("vimeo.com/") && !url.contains("/video/") {
        let rest = url.split_once("vimeo.com/").map(|(_, rest)| rest)?;
        let id = rest.split('?').next().unwrap_or("");
        return if id.is_empty() {
            None
        } else {
            Some(format!("https://player.vimeo.com/video/{id}"))
        };
    }

    Some(url.to_string())
}

// ========== upload tracking ==========

/// Images uploaded during the current edit session. Saved edits drain the
/// list into the save payload; cancelled edits hand it to the cleanup
/// collaborator instead.
#[derive(Default)]
pub(crate) struct UploadTracker {
    images: Vec<String>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an upload. Server-side duplicates are not tracked: the file
    /// already existed before this session and must survive a cancel.
    pub fn record(&mut self, path: &str, duplicate: bool) {
        if !duplicate {
            self.images.push(path.to_string());
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.images
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.images)
    }
}
