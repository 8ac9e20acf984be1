//! The in-place block editor for one card.
//!
//! `CardEditor` owns the document (a flat block list), the undo/redo
//! history, the media selection/resize state and the slash menu while a card
//! is being edited. Structural operations on the block list are plain
//! functions at the top of this module so they stay testable without a DOM;
//! the component layer below wires them to the UI.

use crate::components::ui::{Button, ButtonSize, ButtonVariant, Spinner};
use crate::dialect::{blocks_to_markdown, build_media_style_string, parse_into_blocks};
use crate::history::{History, TEXT_DEBOUNCE_MS};
use crate::media::{
    convert_to_embed_url, place_toolbar, Corner, ResizeGesture, ToolbarPosition, UploadTracker,
};
use crate::models::{Align, Block, BlockData, BlockKind, ColumnSide, Document};
use crate::slash::{
    strip_trigger, AnchorRect, SlashCommand, SlashKeyAction, SlashMenu, SlashMenuState,
    SlashTrigger,
};
use crate::state::AppContext;
use crate::textedit::{
    byte_idx_to_utf16, continue_list_on_enter, indent_lines, insert_link, link_span_at,
    outdent_lines, renumber_after_list_insert, renumber_ordered_lists, replace_link_url,
    selection_had_ordered_item, toggle_format, utf16_to_byte_idx, Format, LinesRewrite, ListEnter,
    TextEdit,
};
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use wasm_bindgen::JsCast;

const CARD_EDITOR_ID: &str = "card-editor";

// ========== document operations ==========

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DropPosition {
    Before,
    After,
}

/// Insert after `index`, clamped to the end. Returns the new block's index.
pub(crate) fn insert_block_after(blocks: &mut Document, index: usize, block: Block) -> usize {
    let at = (index + 1).min(blocks.len());
    blocks.insert(at, block);
    at
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DeleteOutcome {
    Removed,
    /// A row column was deleted; the row collapsed to the surviving column.
    ColumnCollapsed,
    /// Refused: a document always keeps at least one block.
    LastBlock,
}

pub(crate) fn delete_block(
    blocks: &mut Document,
    index: usize,
    column: Option<ColumnSide>,
) -> DeleteOutcome {
    if let Some(side) = column {
        if let Some(BlockData::Row { left, right }) = blocks.get(index).map(|b| &b.data) {
            let survivor = match side {
                ColumnSide::Left => (**right).clone(),
                ColumnSide::Right => (**left).clone(),
            };
            blocks[index] = survivor;
            return DeleteOutcome::ColumnCollapsed;
        }
    }

    if blocks.len() <= 1 {
        return DeleteOutcome::LastBlock;
    }
    if index < blocks.len() {
        blocks.remove(index);
    }
    DeleteOutcome::Removed
}

/// Merge `after_index` and its successor into a row. Rows never nest, so
/// both sides must be non-row blocks.
pub(crate) fn merge_into_row(blocks: &mut Document, after_index: usize) -> bool {
    if after_index + 1 >= blocks.len() {
        return false;
    }
    let left = blocks[after_index].clone();
    let right = blocks[after_index + 1].clone();
    if left.kind() == BlockKind::Row || right.kind() == BlockKind::Row {
        return false;
    }

    let row = Block::with_data(BlockData::Row {
        left: Box::new(left),
        right: Box::new(right),
    });
    blocks.splice(after_index..=after_index + 1, [row]);
    true
}

pub(crate) fn split_row(blocks: &mut Document, index: usize) -> bool {
    let Some(BlockData::Row { left, right }) = blocks.get(index).map(|b| &b.data) else {
        return false;
    };
    let (left, right) = ((**left).clone(), (**right).clone());
    blocks.splice(index..=index, [left, right]);
    true
}

pub(crate) fn swap_row_columns(blocks: &mut Document, index: usize) -> bool {
    match blocks.get_mut(index).map(|b| &mut b.data) {
        Some(BlockData::Row { left, right }) => {
            std::mem::swap(left, right);
            true
        }
        _ => false,
    }
}

/// Drag-reorder: drop `from` before/after `target`.
pub(crate) fn move_block(
    blocks: &mut Document,
    from: usize,
    target: usize,
    position: DropPosition,
) -> bool {
    if from == target || from >= blocks.len() || target >= blocks.len() {
        return false;
    }

    let dragged = blocks.remove(from);
    let mut to = target;
    if from < target {
        to -= 1;
    }
    if position == DropPosition::After {
        to += 1;
    }
    blocks.insert(to.min(blocks.len()), dragged);
    true
}

// Rows are exactly one level deep, so id lookups only need to check each
// top-level block and, for rows, its two columns.

pub(crate) fn find_block_by_id(blocks: &Document, id: &str) -> Option<Block> {
    for block in blocks {
        if block.id == id {
            return Some(block.clone());
        }
        if let BlockData::Row { left, right } = &block.data {
            if left.id == id {
                return Some((**left).clone());
            }
            if right.id == id {
                return Some((**right).clone());
            }
        }
    }
    None
}

pub(crate) fn update_block_by_id(blocks: &mut Document, id: &str, f: impl FnOnce(&mut Block)) {
    for block in blocks.iter_mut() {
        if block.id == id {
            f(block);
            return;
        }
        if let BlockData::Row { left, right } = &mut block.data {
            if left.id == id {
                f(left);
                return;
            }
            if right.id == id {
                f(right);
                return;
            }
        }
    }
}

/// Top-level index (and column side, for blocks living inside a row).
pub(crate) fn locate_block(blocks: &Document, id: &str) -> Option<(usize, Option<ColumnSide>)> {
    for (i, block) in blocks.iter().enumerate() {
        if block.id == id {
            return Some((i, None));
        }
        if let BlockData::Row { left, right } = &block.data {
            if left.id == id {
                return Some((i, Some(ColumnSide::Left)));
            }
            if right.id == id {
                return Some((i, Some(ColumnSide::Right)));
            }
        }
    }
    None
}

fn block_at_mut<'a>(
    blocks: &'a mut Document,
    index: usize,
    column: Option<ColumnSide>,
) -> Option<&'a mut Block> {
    let block = blocks.get_mut(index)?;
    match column {
        Some(side) => block.column_mut(side),
        None => Some(block),
    }
}

// ========== media selection ==========

/// The one selected media element, if any. The DOM node is looked up by id
/// when geometry is needed; only plain data lives in the signal.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MediaSelection {
    pub block_id: String,
    pub block_index: usize,
    pub column: Option<ColumnSide>,
    pub kind: BlockKind,
}

fn media_dom_id(block_id: &str) -> String {
    format!("media-{block_id}")
}

fn surface_dom_id(block_id: &str) -> String {
    format!("surface-{block_id}")
}

fn body_dom_id(block_id: &str) -> String {
    format!("body-{block_id}")
}

// ========== DOM interop ==========

fn element_by_id(id: &str) -> Option<web_sys::HtmlElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(id)?
        .dyn_into()
        .ok()
}

fn textarea_by_id(id: &str) -> Option<web_sys::HtmlTextAreaElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(id)?
        .dyn_into()
        .ok()
}

fn event_textarea(ev: &web_sys::Event) -> Option<web_sys::HtmlTextAreaElement> {
    ev.target()?.dyn_into().ok()
}

/// Byte-offset selection of a textarea (the DOM reports UTF-16 units).
fn selection_bytes(textarea: &web_sys::HtmlTextAreaElement) -> (usize, usize) {
    let value = textarea.value();
    let start = textarea.selection_start().ok().flatten().unwrap_or(0);
    let end = textarea.selection_end().ok().flatten().unwrap_or(start);
    (
        utf16_to_byte_idx(&value, start),
        utf16_to_byte_idx(&value, end),
    )
}

fn set_selection_bytes(textarea: &web_sys::HtmlTextAreaElement, start: usize, end: usize) {
    let value = textarea.value();
    let _ = textarea.set_selection_range(
        byte_idx_to_utf16(&value, start),
        byte_idx_to_utf16(&value, end),
    );
}

/// Insert at the current selection keeping the browser's native undo stack
/// alive. `execCommand` is deprecated but still the only way to do that;
/// `setRangeText` is the undo-less fallback.
fn insert_text_with_undo(textarea: &web_sys::HtmlTextAreaElement, text: &str) {
    let _ = textarea.focus();
    let inserted = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok())
        .and_then(|d| {
            d.exec_command_with_show_ui_and_value("insertText", false, text)
                .ok()
        })
        .unwrap_or(false);

    if !inserted {
        let start = textarea.selection_start().ok().flatten().unwrap_or(0);
        let end = textarea.selection_end().ok().flatten().unwrap_or(start);
        let _ = textarea.set_range_text_with_start_and_end(text, start, end);
        let cursor = start + text.encode_utf16().count() as u32;
        let _ = textarea.set_selection_range(cursor, cursor);
    }
}

/// Apply a splice-style edit through the native-undo-preserving primitive.
fn apply_text_edit(textarea: &web_sys::HtmlTextAreaElement, edit: &TextEdit) {
    set_selection_bytes(textarea, edit.start, edit.end);
    insert_text_with_undo(textarea, &edit.insert);
    set_selection_bytes(textarea, edit.select.0, edit.select.1);
}

/// Whole-buffer rewrite. Bypasses native undo on purpose; callers snapshot
/// the document history around it.
fn apply_lines_rewrite(textarea: &web_sys::HtmlTextAreaElement, rewrite: &LinesRewrite) {
    textarea.set_value(&rewrite.buffer);
    set_selection_bytes(textarea, rewrite.sel_start, rewrite.sel_end);
}

fn autoresize(textarea: &web_sys::HtmlTextAreaElement) {
    let style = web_sys::HtmlElement::style(textarea);
    let _ = style.set_property("height", "auto");
    let _ = style.set_property("height", &format!("{}px", textarea.scroll_height()));
}

fn anchor_rect_of(el: &web_sys::HtmlElement) -> AnchorRect {
    let rect = el.get_bounding_client_rect();
    AnchorRect {
        left: rect.left(),
        top: rect.top(),
        bottom: rect.bottom(),
    }
}

fn viewport_width() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(1024.0)
}

fn defer(ms: i32, f: impl FnOnce() + 'static) {
    if let Some(window) = web_sys::window() {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            wasm_bindgen::closure::Closure::once_into_js(f)
                .as_ref()
                .unchecked_ref(),
            ms,
        );
    }
}

fn is_text_field_focused() -> bool {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.active_element())
        .map(|el| {
            let tag = el.tag_name().to_lowercase();
            tag == "textarea" || tag == "input"
        })
        .unwrap_or(false)
}

// ========== editor context ==========

/// Which flow the shared hidden file input is currently serving.
#[derive(Clone, Debug, PartialEq)]
enum UploadTarget {
    /// Build an image block and insert it after this index.
    InsertBlockAfter(usize),
    /// Insert `![](path)` markdown at the cursor of a details body.
    InsertMarkdown { body_id: String },
}

#[derive(Clone, Copy)]
struct EditorCtx {
    app: AppContext,
    session_file: StoredValue<String>,
    blocks: RwSignal<Document>,
    history: StoredValue<History>,
    /// Bumped on every history mutation so the undo/redo buttons stay
    /// reactive over the non-reactive stacks.
    history_rev: RwSignal<u64>,
    debounce_timer: RwSignal<Option<i32>>,
    selection: RwSignal<Option<MediaSelection>>,
    gesture: RwSignal<Option<ResizeGesture>>,
    toolbar_pos: RwSignal<Option<ToolbarPosition>>,
    slash: RwSignal<SlashMenuState>,
    uploads: StoredValue<UploadTracker>,
    upload_target: RwSignal<Option<UploadTarget>>,
    uploading: RwSignal<bool>,
    file_input_ref: NodeRef<html::Input>,
    drag_from: RwSignal<Option<usize>>,
    drop_hint: RwSignal<Option<(usize, DropPosition)>>,
}

impl EditorCtx {
    fn save_snapshot(&self, label: &str) {
        let current = self.blocks.get_untracked();
        self.history.update_value(|h| h.save_state(&current, label));
        self.history_rev.update(|v| *v += 1);
    }

    /// Keystroke-level change: capture the pre-burst state once and restart
    /// the idle timer that will commit it.
    fn record_text_change(&self) {
        let current = self.blocks.get_untracked();
        self.history.update_value(|h| h.save_text_change(&current));
        self.history_rev.update(|v| *v += 1);

        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(handle) = self.debounce_timer.get_untracked() {
            window.clear_timeout_with_handle(handle);
        }

        let history = self.history;
        let history_rev = self.history_rev;
        let handle = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                wasm_bindgen::closure::Closure::once_into_js(move || {
                    history.update_value(|h| h.flush_pending());
                    history_rev.update(|v| *v += 1);
                })
                .as_ref()
                .unchecked_ref(),
                TEXT_DEBOUNCE_MS,
            )
            .ok();
        self.debounce_timer.set(handle);
    }

    fn can_undo(&self) -> bool {
        self.history_rev.get();
        self.history.with_value(|h| h.can_undo())
    }

    fn can_redo(&self) -> bool {
        self.history_rev.get();
        self.history.with_value(|h| h.can_redo())
    }

    fn undo(&self) {
        let current = self.blocks.get_untracked();
        let mut restored = None;
        self.history.update_value(|h| restored = h.undo(&current));
        self.history_rev.update(|v| *v += 1);
        if let Some(snapshot) = restored {
            self.deselect_media();
            self.blocks.set(snapshot);
        }
    }

    fn redo(&self) {
        let current = self.blocks.get_untracked();
        let mut restored = None;
        self.history.update_value(|h| restored = h.redo(&current));
        self.history_rev.update(|v| *v += 1);
        if let Some(snapshot) = restored {
            self.deselect_media();
            self.blocks.set(snapshot);
        }
    }

    fn deselect_media(&self) {
        self.selection.set(None);
        self.toolbar_pos.set(None);
        self.gesture.set(None);
    }

    fn select_media(&self, selection: MediaSelection) {
        self.selection.set(Some(selection));
        self.reposition_toolbar();
    }

    fn reposition_toolbar(&self) {
        let Some(sel) = self.selection.get_untracked() else {
            self.toolbar_pos.set(None);
            return;
        };
        let Some(el) = element_by_id(&media_dom_id(&sel.block_id)) else {
            return;
        };
        let rect = el.get_bounding_client_rect();
        self.toolbar_pos.set(Some(place_toolbar(
            rect.left(),
            rect.top(),
            rect.width(),
            rect.bottom(),
            viewport_width(),
        )));
    }

    fn begin_resize(&self, corner: Corner, client_x: f64) {
        let Some(sel) = self.selection.get_untracked() else {
            return;
        };
        let Some(el) = element_by_id(&media_dom_id(&sel.block_id)) else {
            return;
        };
        let rect = el.get_bounding_client_rect();
        let card_width = element_by_id(CARD_EDITOR_ID)
            .map(|card| card.get_bounding_client_rect().width())
            .unwrap_or_else(|| rect.width());

        // One undo step per gesture, taken up front.
        self.save_snapshot("resize media");
        self.gesture.set(Some(ResizeGesture::begin(
            corner,
            client_x,
            rect.width(),
            rect.height(),
            card_width,
        )));
    }

    fn apply_resize_drag(&self, client_x: f64) {
        let Some(gesture) = self.gesture.get_untracked() else {
            return;
        };
        let Some(sel) = self.selection.get_untracked() else {
            return;
        };

        let resized = gesture.apply_drag(client_x);
        let style = match sel.kind {
            BlockKind::Image => resized.image_style(),
            BlockKind::Video => resized.video_style(),
            _ => return,
        };
        self.blocks.update(|blocks| {
            if let Some(block) = block_at_mut(blocks, sel.block_index, sel.column) {
                block.set_media_style(Some(style));
            }
        });
        self.reposition_toolbar();
    }

    /// Pointer-up: drop the drag bookkeeping. The snapshot already happened
    /// at drag start, so a whole gesture is one undo step.
    fn end_resize(&self) {
        self.gesture.set(None);
    }

    fn set_media_alignment(&self, align: Align) {
        let Some(sel) = self.selection.get_untracked() else {
            return;
        };
        self.save_snapshot("align media");
        self.blocks.update(|blocks| {
            if let Some(block) = block_at_mut(blocks, sel.block_index, sel.column) {
                block.set_align(align);
            }
        });

        // The new margins may shift the element; reposition once the DOM
        // has settled.
        let ctx = *self;
        defer(10, move || ctx.reposition_toolbar());
    }

    fn set_text_alignment(&self, block_id: &str, align: Align) {
        self.save_snapshot("align text");
        let block_id = block_id.to_string();
        self.blocks.update(|blocks| {
            update_block_by_id(blocks, &block_id, |b| b.set_align(align));
        });
    }

    fn delete_at(&self, index: usize, column: Option<ColumnSide>) {
        self.save_snapshot("delete block");
        let mut outcome = DeleteOutcome::Removed;
        self.blocks.update(|blocks| {
            outcome = delete_block(blocks, index, column);
        });
        match outcome {
            DeleteOutcome::LastBlock => self.app.0.notify_error("Cannot delete the last block"),
            DeleteOutcome::ColumnCollapsed => self.app.0.notify_success("Column deleted"),
            DeleteOutcome::Removed => self.app.0.notify_success("Block deleted"),
        }
        self.deselect_media();
    }

    fn insert_after(&self, index: usize, block: Block) {
        let block_id = block.id.clone();
        self.save_snapshot("insert block");
        self.blocks.update(|blocks| {
            insert_block_after(blocks, index, block);
        });
        // Focus the new surface once it has mounted.
        defer(0, move || {
            if let Some(el) = element_by_id(&surface_dom_id(&block_id)) {
                let _ = el.focus();
            }
        });
    }
}

// ========== text surface wiring ==========

/// Shared keydown handling for every text-bearing surface: slash menu keys,
/// list continuation, indent/outdent, bulk-delete renumbering, and the
/// Cmd/Ctrl+B/I/U/K formatting shortcuts.
fn handle_surface_keydown(
    ctx: EditorCtx,
    ev: &web_sys::KeyboardEvent,
    textarea: &web_sys::HtmlTextAreaElement,
    set_content: Callback<String>,
) {
    // The slash menu owns its four keys while open.
    if ctx.slash.get_untracked().is_active() {
        let mut action = SlashKeyAction::Ignored;
        ctx.slash.update(|s| action = s.handle_key(&ev.key()));
        match action {
            SlashKeyAction::Handled => {
                ev.prevent_default();
                ev.stop_propagation();
                return;
            }
            SlashKeyAction::Execute(cmd) => {
                ev.prevent_default();
                ev.stop_propagation();
                execute_slash_command(ctx, cmd);
                return;
            }
            SlashKeyAction::Ignored => {}
        }
    }

    let key = ev.key();
    let meta = ev.meta_key() || ev.ctrl_key();
    let value = textarea.value();
    let (sel_start, sel_end) = selection_bytes(textarea);

    if key == "Enter" && !meta && !ev.shift_key() && sel_start == sel_end {
        if let Some(action) = continue_list_on_enter(&value, sel_start) {
            ev.prevent_default();
            match action {
                ListEnter::Insert { text } => {
                    ctx.record_text_change();
                    insert_text_with_undo(textarea, &text);
                    set_content.run(textarea.value());
                }
                ListEnter::InsertThenRenumber { text } => {
                    ctx.record_text_change();
                    insert_text_with_undo(textarea, &text);
                    let after_insert = textarea.value();
                    let (cursor, _) = selection_bytes(textarea);
                    if let Some(renumbered) = renumber_after_list_insert(&after_insert, cursor) {
                        if renumbered != after_insert {
                            textarea.set_value(&renumbered);
                            set_selection_bytes(textarea, cursor, cursor);
                        }
                    }
                    set_content.run(textarea.value());
                }
                ListEnter::Rewrite { buffer, cursor } => {
                    ctx.save_snapshot("list edit");
                    apply_lines_rewrite(
                        textarea,
                        &LinesRewrite {
                            buffer,
                            sel_start: cursor,
                            sel_end: cursor,
                        },
                    );
                    set_content.run(textarea.value());
                }
            }
            return;
        }
    }

    if key == "Tab" {
        ev.prevent_default();
        let rewrite = if ev.shift_key() {
            ctx.save_snapshot("outdent");
            outdent_lines(&value, sel_start, sel_end)
        } else {
            ctx.save_snapshot("indent");
            indent_lines(&value, sel_start, sel_end)
        };
        apply_lines_rewrite(textarea, &rewrite);
        set_content.run(textarea.value());
        return;
    }

    // Deleting a selection that held ordered items leaves the tail
    // misnumbered; fix the whole buffer right after the native delete lands.
    if (key == "Backspace" || key == "Delete") && sel_start != sel_end {
        let deleted = &value[sel_start..sel_end];
        if selection_had_ordered_item(deleted) {
            let textarea_id = textarea.id();
            defer(0, move || {
                let Some(ta) = textarea_by_id(&textarea_id) else {
                    return;
                };
                let value = ta.value();
                let renumbered = renumber_ordered_lists(&value);
                if renumbered != value {
                    ctx.save_snapshot("renumber list");
                    let (s, e) = selection_bytes(&ta);
                    ta.set_value(&renumbered);
                    set_selection_bytes(&ta, s.min(renumbered.len()), e.min(renumbered.len()));
                }
                set_content.run(ta.value());
            });
        }
        return;
    }

    if meta {
        let format = match key.as_str() {
            "b" => Some(Format::Bold),
            "i" => Some(Format::Italic),
            "u" => Some(Format::Underline),
            _ => None,
        };
        if let Some(format) = format {
            ev.prevent_default();
            ctx.record_text_change();
            let edit = toggle_format(&value, sel_start, sel_end, format);
            apply_text_edit(textarea, &edit);
            set_content.run(textarea.value());
            return;
        }

        if key == "k" {
            ev.prevent_default();
            run_link_flow(ctx, textarea, set_content);
        }
    }
}

/// Cmd/Ctrl+K: edit the enclosing link if the cursor sits in one, else wrap
/// the selection as a new link. URL prompting is the browser dialog.
fn run_link_flow(
    ctx: EditorCtx,
    textarea: &web_sys::HtmlTextAreaElement,
    set_content: Callback<String>,
) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let value = textarea.value();
    let (sel_start, sel_end) = selection_bytes(textarea);

    if let Some(span) = link_span_at(&value, sel_start) {
        let answer = window
            .prompt_with_message_and_default("Edit URL (leave empty to remove link):", &span.url)
            .ok()
            .flatten();
        let Some(new_url) = answer else {
            return;
        };
        ctx.record_text_change();
        apply_text_edit(textarea, &replace_link_url(&span, &new_url));
        set_content.run(textarea.value());
        return;
    }

    let answer = window.prompt_with_message("Enter URL:").ok().flatten();
    let Some(url) = answer else {
        return;
    };
    if url.trim().is_empty() {
        return;
    }
    ctx.record_text_change();
    apply_text_edit(textarea, &insert_link(&value, sel_start, sel_end, &url));
    set_content.run(textarea.value());
}

// ========== slash command execution ==========

fn execute_slash_command(ctx: EditorCtx, cmd: SlashCommand) {
    let state = ctx.slash.get_untracked();
    let Some(trigger) = state.trigger else {
        return;
    };
    let insert_index = match trigger {
        SlashTrigger::Typed { index } | SlashTrigger::Button { index } => index,
    };

    // A typed trigger leaves `/query` in the host buffer; remove it first
    // and report the edited content back to the block.
    if let SlashTrigger::Typed { index } = trigger {
        let block_id = ctx.blocks.get_untracked().get(index).map(|b| b.id.clone());
        if let Some(block_id) = block_id {
            if let Some(ta) = textarea_by_id(&surface_dom_id(&block_id)) {
                let value = ta.value();
                let (cursor, _) = selection_bytes(&ta);
                if let Some((stripped, new_cursor)) = strip_trigger(&value, cursor) {
                    ta.set_value(&stripped);
                    set_selection_bytes(&ta, new_cursor, new_cursor);
                    let content = ta.value();
                    ctx.blocks.update(|blocks| {
                        update_block_by_id(blocks, &block_id, |b| {
                            if let BlockData::Text { content: c, .. } = &mut b.data {
                                *c = content;
                            }
                        });
                    });
                }
            }
        }
    }

    ctx.slash.update(|s| s.hide());

    match cmd.kind {
        BlockKind::Image => start_image_upload(ctx, UploadTarget::InsertBlockAfter(insert_index)),
        BlockKind::Video => add_video_block(ctx, insert_index),
        kind => ctx.insert_after(insert_index, Block::new(kind)),
    }
}

// ========== media flows ==========

fn start_image_upload(ctx: EditorCtx, target: UploadTarget) {
    if ctx.uploading.get_untracked() {
        return;
    }
    ctx.upload_target.set(Some(target));
    if let Some(input) = ctx.file_input_ref.get_untracked() {
        input.click();
    }
}

/// Change handler for the shared hidden file input.
fn handle_file_picked(ctx: EditorCtx) {
    let Some(input) = ctx.file_input_ref.get_untracked() else {
        return;
    };
    let Some(file) = input.files().and_then(|files| files.get(0)) else {
        return;
    };
    if ctx.uploading.get_untracked() {
        return;
    }
    ctx.uploading.set(true);
    ctx.app.0.notify_success("Uploading image...");

    let session = ctx.session_file.get_value();
    let api = ctx.app.0.api_client.get_untracked();
    spawn_local(async move {
        match read_file_bytes(&file).await {
            Ok(bytes) => match api.upload_image(&session, &file.name(), bytes).await {
                Ok(res) => {
                    ctx.uploads
                        .update_value(|t| t.record(&res.path, res.duplicate));
                    match ctx.upload_target.get_untracked() {
                        Some(UploadTarget::InsertBlockAfter(index)) => {
                            ctx.insert_after(index, Block::image(res.path.clone()));
                        }
                        Some(UploadTarget::InsertMarkdown { body_id }) => {
                            if let Some(ta) = textarea_by_id(&body_id) {
                                ctx.record_text_change();
                                insert_text_with_undo(&ta, &format!("![]({})", res.path));
                                sync_details_body(ctx, &body_id, ta.value());
                            }
                        }
                        None => {}
                    }
                    ctx.app.0.notify_success(if res.duplicate {
                        "Image already exists, reusing!"
                    } else {
                        "Image added!"
                    });
                }
                Err(e) => ctx.app.0.notify_error(format!("Upload error: {e}")),
            },
            Err(message) => ctx.app.0.notify_error(message),
        }
        // Allow re-picking the same file later.
        if let Some(input) = ctx.file_input_ref.get_untracked() {
            input.set_value("");
        }
        ctx.upload_target.set(None);
        ctx.uploading.set(false);
    });
}

async fn read_file_bytes(file: &web_sys::File) -> Result<Vec<u8>, String> {
    let buffer = wasm_bindgen_futures::JsFuture::from(file.array_buffer())
        .await
        .map_err(|_| "Could not read file".to_string())?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

fn add_video_block(ctx: EditorCtx, insert_index: usize) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let answer = window
        .prompt_with_message("Enter video URL (YouTube, Vimeo, etc.):")
        .ok()
        .flatten();
    let Some(url) = answer else {
        return;
    };

    match convert_to_embed_url(&url) {
        Some(embed) => {
            ctx.insert_after(insert_index, Block::video(embed));
            ctx.app.0.notify_success("Video added!");
        }
        None => ctx.app.0.notify_error("Invalid video URL"),
    }
}

/// `!video(url)` markdown inserted into a details body.
fn add_video_markdown(ctx: EditorCtx, body_id: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let answer = window
        .prompt_with_message("Enter video URL (YouTube, Vimeo, etc.):")
        .ok()
        .flatten();
    let Some(url) = answer else {
        return;
    };
    match convert_to_embed_url(&url) {
        Some(embed) => {
            if let Some(ta) = textarea_by_id(body_id) {
                ctx.record_text_change();
                insert_text_with_undo(&ta, &format!("!video({embed})"));
                sync_details_body(ctx, body_id, ta.value());
            }
        }
        None => ctx.app.0.notify_error("Invalid video URL"),
    }
}

fn sync_details_body(ctx: EditorCtx, body_id: &str, value: String) {
    let block_id = body_id.trim_start_matches("body-").to_string();
    ctx.blocks.update(|blocks| {
        update_block_by_id(blocks, &block_id, |b| {
            if let BlockData::Details { body, .. } = &mut b.data {
                *body = value;
            }
        });
    });
}

// ========== components ==========

#[component]
pub fn CardEditor(
    session_file: String,
    card_index: usize,
    card_count: usize,
    initial_content: String,
    #[prop(into)] on_saved: Callback<String>,
    #[prop(into)] on_cancelled: Callback<()>,
    #[prop(into)] on_deleted: Callback<()>,
) -> impl IntoView {
    let app = expect_context::<AppContext>();

    let ctx = EditorCtx {
        app,
        session_file: StoredValue::new(session_file),
        blocks: RwSignal::new(parse_into_blocks(&initial_content)),
        history: StoredValue::new(History::new()),
        history_rev: RwSignal::new(0),
        debounce_timer: RwSignal::new(None),
        selection: RwSignal::new(None),
        gesture: RwSignal::new(None),
        toolbar_pos: RwSignal::new(None),
        slash: RwSignal::new(SlashMenuState::default()),
        uploads: StoredValue::new(UploadTracker::new()),
        upload_target: RwSignal::new(None),
        uploading: RwSignal::new(false),
        file_input_ref: NodeRef::new(),
        drag_from: RwSignal::new(None),
        drop_hint: RwSignal::new(None),
    };
    provide_context(ctx);

    let saving: RwSignal<bool> = RwSignal::new(false);
    let library_open: RwSignal<bool> = RwSignal::new(false);

    let save_card = Callback::new(move |_: ()| {
        if saving.get_untracked() {
            return;
        }
        saving.set(true);

        let content = blocks_to_markdown(&ctx.blocks.get_untracked());
        let uploaded = ctx.uploads.with_value(|t| t.paths().to_vec());
        let api = ctx.app.0.api_client.get_untracked();
        let session = ctx.session_file.get_value();
        spawn_local(async move {
            match api
                .update_card(&session, card_index, &content, &uploaded)
                .await
            {
                Ok(res) => {
                    ctx.uploads.update_value(|t| t.clear());
                    ctx.app.0.notify_success("Card saved successfully!");
                    if res.deleted_images > 0 {
                        let suffix = if res.deleted_images == 1 { "" } else { "s" };
                        ctx.app.0.notify_success(format!(
                            "Cleaned up {} unused image{suffix}",
                            res.deleted_images
                        ));
                    }
                    on_saved.run(content);
                }
                Err(e) => ctx.app.0.notify_error(format!("Error: {e}")),
            }
            saving.set(false);
        });
    });

    let cancel_edit = Callback::new(move |_: ()| {
        let mut abandoned = vec![];
        ctx.uploads.update_value(|t| abandoned = t.take());
        let api = ctx.app.0.api_client.get_untracked();
        spawn_local(async move {
            api.cleanup_images(&abandoned).await;
        });
        ctx.app.0.notify_warning("Changes discarded");
        on_cancelled.run(());
    });

    let delete_card = Callback::new(move |_: ()| {
        if card_count <= 1 {
            ctx.app.0.notify_error("Cannot delete the only card");
            return;
        }
        let confirmed = window()
            .confirm_with_message("Delete this card? This cannot be undone.")
            .unwrap_or(false);
        if !confirmed {
            return;
        }

        let mut abandoned = vec![];
        ctx.uploads.update_value(|t| abandoned = t.take());
        let api = ctx.app.0.api_client.get_untracked();
        let session = ctx.session_file.get_value();
        spawn_local(async move {
            api.cleanup_images(&abandoned).await;
            match api.delete_card(&session, card_index).await {
                Ok(_) => {
                    ctx.app.0.notify_success("Card deleted");
                    on_deleted.run(());
                }
                Err(e) => ctx.app.0.notify_error(format!("Error: {e}")),
            }
        });
    });

    // Global keyboard shortcuts while editing. Surface-level handlers stop
    // propagation for keys they consume, so there is no double handling.
    let _keydown = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if ctx.slash.get_untracked().is_active() {
            let mut action = SlashKeyAction::Ignored;
            ctx.slash.update(|s| action = s.handle_key(&ev.key()));
            match action {
                SlashKeyAction::Handled => {
                    ev.prevent_default();
                    ev.stop_propagation();
                    return;
                }
                SlashKeyAction::Execute(cmd) => {
                    ev.prevent_default();
                    ev.stop_propagation();
                    execute_slash_command(ctx, cmd);
                    return;
                }
                SlashKeyAction::Ignored => {}
            }
        }

        let key = ev.key();
        let meta = ev.meta_key() || ev.ctrl_key();

        if meta && key == "s" {
            ev.prevent_default();
            save_card.run(());
            return;
        }

        // Inside a focused field the browser's own undo applies; the
        // document history only takes over outside text fields.
        if meta && !is_text_field_focused() {
            if key == "z" && !ev.shift_key() {
                ev.prevent_default();
                ctx.undo();
                return;
            }
            if (key == "z" && ev.shift_key()) || key == "y" {
                ev.prevent_default();
                ctx.redo();
                return;
            }
        }

        if key == "Escape" {
            cancel_edit.run(());
            return;
        }

        if (key == "Delete" || key == "Backspace") && !is_text_field_focused() {
            if let Some(sel) = ctx.selection.get_untracked() {
                ev.prevent_default();
                ctx.delete_at(sel.block_index, sel.column);
            }
        }
    });

    let _mousemove = window_event_listener(ev::mousemove, move |ev| {
        if ctx.gesture.get_untracked().is_some() {
            ev.prevent_default();
            ctx.apply_resize_drag(ev.client_x() as f64);
        }
    });
    let _mouseup = window_event_listener(ev::mouseup, move |_| {
        ctx.end_resize();
    });
    let _scroll = window_event_listener(ev::scroll, move |_| {
        ctx.reposition_toolbar();
    });
    let _resize = window_event_listener(ev::resize, move |_| {
        ctx.reposition_toolbar();
    });

    on_cleanup(move || {
        if let (Some(window), Some(handle)) =
            (web_sys::window(), ctx.debounce_timer.get_untracked())
        {
            window.clear_timeout_with_handle(handle);
        }
    });

    let block_ids = move || {
        ctx.blocks
            .get()
            .iter()
            .map(|b| b.id.clone())
            .collect::<Vec<_>>()
    };

    let on_slash_execute = Callback::new(move |cmd: SlashCommand| {
        execute_slash_command(ctx, cmd);
    });

    view! {
        <div class="relative">
            <div class="mb-3 flex items-center gap-2">
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:disabled=move || !ctx.can_undo()
                    on:click=move |_| ctx.undo()
                >
                    "↩ Undo"
                </Button>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:disabled=move || !ctx.can_redo()
                    on:click=move |_| ctx.redo()
                >
                    "↪ Redo"
                </Button>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    on:click=move |_| library_open.set(true)
                >
                    "🖼 Library"
                </Button>

                <div class="ml-auto flex items-center gap-2">
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Sm
                        on:click=move |_| cancel_edit.run(())
                    >
                        "✕ Cancel"
                    </Button>
                    <Button
                        size=ButtonSize::Sm
                        attr:disabled=move || saving.get()
                        on:click=move |_| save_card.run(())
                    >
                        <Show when=move || saving.get() fallback=|| ().into_view()>
                            <Spinner />
                        </Show>
                        "💾 Save"
                    </Button>
                    <Button
                        variant=ButtonVariant::Destructive
                        size=ButtonSize::Sm
                        on:click=move |_| delete_card.run(())
                    >
                        "🗑 Delete"
                    </Button>
                </div>
            </div>

            <div
                id=CARD_EDITOR_ID
                class="space-y-1 rounded-lg border bg-background p-4"
                on:click=move |_| ctx.deselect_media()
            >
                <For
                    each=block_ids
                    key=|id| id.clone()
                    children=move |id| view! { <BlockRow block_id=id /> }
                />

                <button
                    class="mt-2 w-full rounded-md border border-dashed py-2 text-sm text-muted-foreground hover:bg-accent/30"
                    on:click=move |ev: web_sys::MouseEvent| {
                        ev.stop_propagation();
                        let anchor = ev
                            .target()
                            .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                            .map(|el| anchor_rect_of(&el))
                            .unwrap_or_default();
                        let last = ctx.blocks.get_untracked().len().saturating_sub(1);
                        ctx.slash.update(|s| {
                            s.show(SlashTrigger::Button { index: last }, anchor);
                        });
                    }
                >
                    "+ Add Block"
                </button>
            </div>

            <SlashMenu state=ctx.slash on_execute=on_slash_execute />
            <MediaAlignToolbar />
            <ImageLibrary open=library_open />

            <input
                type="file"
                accept="image/*"
                class="hidden"
                node_ref=ctx.file_input_ref
                on:change=move |_| handle_file_picked(ctx)
            />
        </div>
    }
}

/// One top-level block: drag handle, content surface, delete button, and
/// the divider affordances (add/merge) below it.
#[component]
fn BlockRow(block_id: String) -> impl IntoView {
    let ctx = expect_context::<EditorCtx>();
    let id_sv = StoredValue::new(block_id);

    let index = move || {
        ctx.blocks
            .get()
            .iter()
            .position(|b| b.id == id_sv.get_value())
    };

    let wrapper_class = move || {
        let base = "group relative flex items-start gap-1 rounded-md py-1";
        match (index(), ctx.drop_hint.get()) {
            (Some(i), Some((target, DropPosition::Before))) if i == target => {
                format!("{base} border-t-2 border-primary")
            }
            (Some(i), Some((target, DropPosition::After))) if i == target => {
                format!("{base} border-b-2 border-primary")
            }
            _ => base.to_string(),
        }
    };

    view! {
        <div
            class=wrapper_class
            on:dragover=move |ev: web_sys::DragEvent| {
                ev.prevent_default();
                let Some(i) = index() else { return };
                if ctx.drag_from.get_untracked() == Some(i) {
                    return;
                }
                let position = ev
                    .current_target()
                    .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
                    .map(|el| {
                        let rect = el.get_bounding_client_rect();
                        let mid_y = rect.top() + rect.height() / 2.0;
                        if (ev.client_y() as f64) < mid_y {
                            DropPosition::Before
                        } else {
                            DropPosition::After
                        }
                    })
                    .unwrap_or(DropPosition::After);
                ctx.drop_hint.set(Some((i, position)));
            }
            on:drop=move |ev: web_sys::DragEvent| {
                ev.prevent_default();
                let (Some(from), Some(target)) = (ctx.drag_from.get_untracked(), index()) else {
                    ctx.drag_from.set(None);
                    ctx.drop_hint.set(None);
                    return;
                };
                let position = ctx
                    .drop_hint
                    .get_untracked()
                    .map(|(_, p)| p)
                    .unwrap_or(DropPosition::After);
                if from != target {
                    ctx.save_snapshot("reorder blocks");
                    ctx.blocks.update(|blocks| {
                        move_block(blocks, from, target, position);
                    });
                }
                ctx.drag_from.set(None);
                ctx.drop_hint.set(None);
            }
        >
            <div
                class="mt-1 shrink-0 cursor-grab select-none px-1 text-muted-foreground opacity-0 group-hover:opacity-100"
                draggable="true"
                on:dragstart=move |ev: web_sys::DragEvent| {
                    let Some(i) = index() else { return };
                    ctx.drag_from.set(Some(i));
                    if let Some(dt) = ev.data_transfer() {
                        let _ = dt.set_data("text/plain", &i.to_string());
                        dt.set_effect_allowed("move");
                    }
                }
                on:dragend=move |_| {
                    ctx.drag_from.set(None);
                    ctx.drop_hint.set(None);
                }
            >
                "⋮⋮"
            </div>

            <div class="min-w-0 flex-1">
                <BlockContent block_id=id_sv.get_value() in_column=false />
            </div>

            <button
                class="mt-1 shrink-0 rounded px-1 text-muted-foreground opacity-0 hover:text-destructive group-hover:opacity-100"
                title="Delete block"
                on:click=move |ev: web_sys::MouseEvent| {
                    ev.stop_propagation();
                    if let Some(i) = index() {
                        ctx.delete_at(i, None);
                    }
                }
            >
                "×"
            </button>
        </div>

        // Divider affordances between this block and the next.
        {move || {
            let Some(i) = index() else {
                return ().into_view().into_any();
            };
            let blocks = ctx.blocks.get();
            if i + 1 >= blocks.len() {
                return ().into_view().into_any();
            }
            let can_merge = blocks[i].kind() != BlockKind::Row
                && blocks[i + 1].kind() != BlockKind::Row;

            view! {
                <div class="group/divider relative flex h-4 items-center justify-center gap-2 opacity-0 hover:opacity-100">
                    <button
                        class="rounded-full border bg-background px-2 text-xs text-muted-foreground hover:bg-accent"
                        title="Add block here"
                        on:click=move |ev: web_sys::MouseEvent| {
                            ev.stop_propagation();
                            let anchor = ev
                                .target()
                                .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                                .map(|el| anchor_rect_of(&el))
                                .unwrap_or_default();
                            ctx.slash.update(|s| {
                                s.show(SlashTrigger::Button { index: i }, anchor);
                            });
                        }
                    >
                        "+"
                    </button>
                    <Show when=move || can_merge fallback=|| ().into_view()>
                        <button
                            class="rounded-full border bg-background px-2 text-xs text-muted-foreground hover:bg-accent"
                            title="Merge these two blocks into side-by-side columns"
                            on:click=move |ev: web_sys::MouseEvent| {
                                ev.stop_propagation();
                                ctx.save_snapshot("merge blocks");
                                let mut merged = false;
                                ctx.blocks.update(|blocks| {
                                    merged = merge_into_row(blocks, i);
                                });
                                if merged {
                                    ctx.app.0.notify_success("Blocks merged into columns");
                                }
                            }
                        >
                            "◫"
                        </button>
                    </Show>
                </div>
            }
            .into_any()
        }}
    }
}

/// Dispatch a block to its editing surface.
#[component]
fn BlockContent(block_id: String, in_column: bool) -> impl IntoView {
    let ctx = expect_context::<EditorCtx>();
    let id_sv = StoredValue::new(block_id);

    move || {
        let id = id_sv.get_value();
        let Some(block) = find_block_by_id(&ctx.blocks.get(), &id) else {
            return ().into_view().into_any();
        };
        match block.kind() {
            BlockKind::Text => view! { <TextSurface block_id=id in_column=in_column /> }.into_any(),
            BlockKind::Image | BlockKind::Video => {
                view! { <MediaSurface block_id=id /> }.into_any()
            }
            BlockKind::Details => view! { <DetailsSurface block_id=id /> }.into_any(),
            BlockKind::Callout => view! { <CalloutSurface block_id=id /> }.into_any(),
            BlockKind::Divider => view! { <hr class="my-3 border-border" /> }.into_any(),
            BlockKind::Row => view! { <RowSurface block_id=id /> }.into_any(),
        }
    }
}

#[component]
fn TextSurface(block_id: String, in_column: bool) -> impl IntoView {
    let ctx = expect_context::<EditorCtx>();
    let id_sv = StoredValue::new(block_id);

    let content = move || {
        find_block_by_id(&ctx.blocks.get(), &id_sv.get_value())
            .and_then(|b| match b.data {
                BlockData::Text { content, .. } => Some(content),
                _ => None,
            })
            .unwrap_or_default()
    };
    let align = move || {
        find_block_by_id(&ctx.blocks.get(), &id_sv.get_value())
            .and_then(|b| b.align())
            .unwrap_or_default()
    };

    let set_content = Callback::new(move |value: String| {
        ctx.blocks.update(|blocks| {
            update_block_by_id(blocks, &id_sv.get_value(), |b| {
                if let BlockData::Text { content, .. } = &mut b.data {
                    *content = value;
                }
            });
        });
    });

    view! {
        <div class="group/text relative">
            <div class="absolute -top-2 right-0 z-10 hidden gap-0.5 rounded border bg-background p-0.5 group-focus-within/text:flex">
                {[Align::Left, Align::Center, Align::Right]
                    .into_iter()
                    .map(|a| {
                        let active = move || align() == a;
                        view! {
                            <button
                                class=move || {
                                    if active() {
                                        "rounded bg-accent px-1.5 text-xs"
                                    } else {
                                        "rounded px-1.5 text-xs text-muted-foreground hover:bg-accent/50"
                                    }
                                }
                                title=format!("Align {a}")
                                on:mousedown=move |ev: web_sys::MouseEvent| {
                                    ev.prevent_default();
                                    ev.stop_propagation();
                                    ctx.set_text_alignment(&id_sv.get_value(), a);
                                }
                            >
                                {a.to_string()}
                            </button>
                        }
                    })
                    .collect_view()}
            </div>

            <textarea
                id=surface_dom_id(&id_sv.get_value())
                class="w-full resize-none overflow-hidden rounded-md border-none bg-transparent p-1 text-sm outline-none focus:ring-1 focus:ring-ring"
                style=move || format!("text-align: {}", align())
                placeholder="Type markdown here..."
                rows=2
                prop:value=content
                on:input=move |ev| {
                    let Some(ta) = event_textarea(&ev) else { return };
                    autoresize(&ta);
                    ctx.record_text_change();
                    set_content.run(ta.value());

                    if !in_column {
                        let value = ta.value();
                        let (cursor, _) = selection_bytes(&ta);
                        let before_cursor = value[..cursor].to_string();
                        let anchor = anchor_rect_of(&ta);
                        if let Some((index, None)) =
                            locate_block(&ctx.blocks.get_untracked(), &id_sv.get_value())
                        {
                            ctx.slash.update(|s| s.track_input(&before_cursor, index, anchor));
                        }
                    }
                }
                on:keydown=move |ev: web_sys::KeyboardEvent| {
                    let Some(ta) = event_textarea(&ev) else { return };
                    handle_surface_keydown(ctx, &ev, &ta, set_content);
                }
            ></textarea>
        </div>
    }
}

#[component]
fn CalloutSurface(block_id: String) -> impl IntoView {
    let ctx = expect_context::<EditorCtx>();
    let id_sv = StoredValue::new(block_id);

    let content = move || {
        find_block_by_id(&ctx.blocks.get(), &id_sv.get_value())
            .and_then(|b| match b.data {
                BlockData::Callout { content } => Some(content),
                _ => None,
            })
            .unwrap_or_default()
    };

    let set_content = Callback::new(move |value: String| {
        ctx.blocks.update(|blocks| {
            update_block_by_id(blocks, &id_sv.get_value(), |b| {
                if let BlockData::Callout { content } = &mut b.data {
                    *content = value;
                }
            });
        });
    });

    view! {
        <div class="rounded-md border-l-4 border-primary bg-accent/30 p-2">
            <textarea
                id=surface_dom_id(&id_sv.get_value())
                class="w-full resize-none overflow-hidden bg-transparent text-sm outline-none"
                placeholder="Callout text..."
                rows=2
                prop:value=content
                on:input=move |ev| {
                    let Some(ta) = event_textarea(&ev) else { return };
                    autoresize(&ta);
                    ctx.record_text_change();
                    set_content.run(ta.value());
                }
                on:keydown=move |ev: web_sys::KeyboardEvent| {
                    let Some(ta) = event_textarea(&ev) else { return };
                    handle_surface_keydown(ctx, &ev, &ta, set_content);
                }
            ></textarea>
        </div>
    }
}

#[component]
fn DetailsSurface(block_id: String) -> impl IntoView {
    let ctx = expect_context::<EditorCtx>();
    let id_sv = StoredValue::new(block_id);

    let details = move || {
        find_block_by_id(&ctx.blocks.get(), &id_sv.get_value()).and_then(|b| match b.data {
            BlockData::Details {
                summary,
                body,
                is_open,
            } => Some((summary, body, is_open)),
            _ => None,
        })
    };
    let summary = move || details().map(|(s, _, _)| s).unwrap_or_default();
    let body = move || details().map(|(_, b, _)| b).unwrap_or_default();
    let is_open = move || details().map(|(_, _, o)| o).unwrap_or(false);

    let set_body = Callback::new(move |value: String| {
        ctx.blocks.update(|blocks| {
            update_block_by_id(blocks, &id_sv.get_value(), |b| {
                if let BlockData::Details { body, .. } = &mut b.data {
                    *body = value;
                }
            });
        });
    });

    view! {
        <div class="space-y-2 rounded-md border p-2">
            <label class="text-xs text-muted-foreground">"Summary:"</label>
            <input
                type="text"
                id=surface_dom_id(&id_sv.get_value())
                class="w-full rounded-md border bg-transparent px-2 py-1 text-sm"
                placeholder="Click to expand"
                prop:value=summary
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    ctx.record_text_change();
                    ctx.blocks.update(|blocks| {
                        update_block_by_id(blocks, &id_sv.get_value(), |b| {
                            if let BlockData::Details { summary, .. } = &mut b.data {
                                *summary = value;
                            }
                        });
                    });
                }
            />

            <label class="text-xs text-muted-foreground">"Content:"</label>
            <div class="flex gap-2">
                <button
                    class="rounded border px-2 py-0.5 text-xs text-muted-foreground hover:bg-accent"
                    prop:disabled=move || ctx.uploading.get()
                    on:click=move |ev: web_sys::MouseEvent| {
                        ev.stop_propagation();
                        start_image_upload(
                            ctx,
                            UploadTarget::InsertMarkdown {
                                body_id: body_dom_id(&id_sv.get_value()),
                            },
                        );
                    }
                >
                    "+ Image"
                </button>
                <button
                    class="rounded border px-2 py-0.5 text-xs text-muted-foreground hover:bg-accent"
                    on:click=move |ev: web_sys::MouseEvent| {
                        ev.stop_propagation();
                        add_video_markdown(ctx, &body_dom_id(&id_sv.get_value()));
                    }
                >
                    "+ Video"
                </button>
            </div>
            <textarea
                id=body_dom_id(&id_sv.get_value())
                class="w-full resize-none overflow-hidden rounded-md border bg-transparent p-2 text-sm"
                placeholder="Content shown when expanded..."
                rows=4
                prop:value=body
                on:input=move |ev| {
                    let Some(ta) = event_textarea(&ev) else { return };
                    autoresize(&ta);
                    ctx.record_text_change();
                    set_body.run(ta.value());
                }
                on:keydown=move |ev: web_sys::KeyboardEvent| {
                    let Some(ta) = event_textarea(&ev) else { return };
                    handle_surface_keydown(ctx, &ev, &ta, set_body);
                }
            ></textarea>

            <label class="flex items-center gap-2 text-xs text-muted-foreground">
                <input
                    type="checkbox"
                    prop:checked=is_open
                    on:change=move |ev| {
                        let checked = event_target_checked(&ev);
                        ctx.save_snapshot("toggle details");
                        ctx.blocks.update(|blocks| {
                            update_block_by_id(blocks, &id_sv.get_value(), |b| {
                                if let BlockData::Details { is_open, .. } = &mut b.data {
                                    *is_open = checked;
                                }
                            });
                        });
                    }
                />
                " Open by default"
            </label>
        </div>
    }
}

#[component]
fn MediaSurface(block_id: String) -> impl IntoView {
    let ctx = expect_context::<EditorCtx>();
    let id_sv = StoredValue::new(block_id);

    let block = move || find_block_by_id(&ctx.blocks.get(), &id_sv.get_value());
    let is_selected = move || {
        ctx.selection
            .get()
            .map(|s| s.block_id == id_sv.get_value())
            .unwrap_or(false)
    };

    let inline_style = move || {
        block()
            .map(|b| {
                build_media_style_string(b.media_style(), b.align().unwrap_or_default())
            })
            .unwrap_or_default()
    };

    let select = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        let blocks = ctx.blocks.get_untracked();
        let id = id_sv.get_value();
        let (Some((index, column)), Some(b)) = (locate_block(&blocks, &id), find_block_by_id(&blocks, &id))
        else {
            return;
        };
        ctx.select_media(MediaSelection {
            block_id: id,
            block_index: index,
            column,
            kind: b.kind(),
        });
    };

    let handles = move || {
        if !is_selected() {
            return ().into_view().into_any();
        }
        Corner::ALL
            .into_iter()
            .map(|corner| {
                let pos_class = match corner {
                    Corner::Nw => "-top-1.5 -left-1.5 cursor-nwse-resize",
                    Corner::Ne => "-top-1.5 -right-1.5 cursor-nesw-resize",
                    Corner::Sw => "-bottom-1.5 -left-1.5 cursor-nesw-resize",
                    Corner::Se => "-bottom-1.5 -right-1.5 cursor-nwse-resize",
                };
                view! {
                    <div
                        class=format!(
                            "absolute z-10 size-3 rounded-full border-2 border-primary bg-background {pos_class}"
                        )
                        on:mousedown=move |ev: web_sys::MouseEvent| {
                            ev.prevent_default();
                            ev.stop_propagation();
                            ctx.begin_resize(corner, ev.client_x() as f64);
                        }
                    ></div>
                }
            })
            .collect_view()
            .into_any()
    };

    move || {
        let Some(b) = block() else {
            return ().into_view().into_any();
        };
        let wrapper_class = move || {
            if is_selected() {
                "relative w-fit max-w-full ring-2 ring-primary"
            } else {
                "relative w-fit max-w-full"
            }
        };

        match b.data {
            BlockData::Image { src, alt, .. } => view! {
                <div
                    id=media_dom_id(&id_sv.get_value())
                    class=wrapper_class
                    style=inline_style
                    on:click=select
                >
                    <img src=src alt=alt class="block h-auto w-full" draggable="false" />
                    {handles}
                </div>
            }
            .into_any(),
            BlockData::Video { src, .. } => view! {
                <div
                    id=media_dom_id(&id_sv.get_value())
                    class=wrapper_class
                    style=inline_style
                    on:click=select
                >
                    <iframe
                        src=src
                        class="aspect-video w-full"
                        {::leptos::tachys::html::attribute::custom::custom_attribute("frameborder", "0")}
                        allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture"
                        allowfullscreen=""
                    ></iframe>
                    // Capture clicks the iframe would otherwise swallow.
                    <div class="absolute inset-0" on:click=select></div>
                    {handles}
                </div>
            }
            .into_any(),
            _ => ().into_view().into_any(),
        }
    }
}

#[component]
fn RowSurface(block_id: String) -> impl IntoView {
    let ctx = expect_context::<EditorCtx>();
    let id_sv = StoredValue::new(block_id);

    let index = move || {
        ctx.blocks
            .get()
            .iter()
            .position(|b| b.id == id_sv.get_value())
    };
    let column_ids = move || {
        find_block_by_id(&ctx.blocks.get(), &id_sv.get_value()).and_then(|b| match b.data {
            BlockData::Row { left, right } => Some((left.id.clone(), right.id.clone())),
            _ => None,
        })
    };

    view! {
        <div class="group/row relative rounded-md border border-dashed p-2">
            <div class="absolute -top-3 right-2 z-10 hidden gap-1 group-hover/row:flex">
                <button
                    class="rounded border bg-background px-2 text-xs text-muted-foreground hover:bg-accent"
                    title="Swap columns"
                    on:click=move |ev: web_sys::MouseEvent| {
                        ev.stop_propagation();
                        let Some(i) = index() else { return };
                        ctx.save_snapshot("swap columns");
                        ctx.blocks.update(|blocks| {
                            swap_row_columns(blocks, i);
                        });
                        ctx.app.0.notify_success("Columns swapped");
                    }
                >
                    "⇄ Swap"
                </button>
                <button
                    class="rounded border bg-background px-2 text-xs text-muted-foreground hover:bg-accent"
                    title="Split into separate blocks"
                    on:click=move |ev: web_sys::MouseEvent| {
                        ev.stop_propagation();
                        let Some(i) = index() else { return };
                        ctx.save_snapshot("split row");
                        ctx.blocks.update(|blocks| {
                            split_row(blocks, i);
                        });
                        ctx.app.0.notify_success("Row split into separate blocks");
                    }
                >
                    "↕ Split"
                </button>
            </div>

            {move || {
                let Some((left_id, right_id)) = column_ids() else {
                    return ().into_view().into_any();
                };
                view! {
                    <div class="grid grid-cols-2 gap-3">
                        <div><BlockContent block_id=left_id in_column=true /></div>
                        <div><BlockContent block_id=right_id in_column=true /></div>
                    </div>
                }
                .into_any()
            }}
        </div>
    }
}

/// The floating left/center/right toolbar above the selected media element.
#[component]
fn MediaAlignToolbar() -> impl IntoView {
    let ctx = expect_context::<EditorCtx>();

    let current_align = move || {
        ctx.selection
            .get()
            .and_then(|sel| find_block_by_id(&ctx.blocks.get(), &sel.block_id))
            .and_then(|b| b.align())
            .unwrap_or_default()
    };

    view! {
        <Show
            when=move || ctx.selection.get().is_some() && ctx.toolbar_pos.get().is_some()
            fallback=|| ().into_view()
        >
            <div
                class="fixed z-50 flex gap-0.5 rounded-md border bg-background p-1 shadow-md"
                style=move || {
                    let pos = ctx.toolbar_pos.get().unwrap_or(ToolbarPosition {
                        left: 0.0,
                        top: 0.0,
                    });
                    format!("left: {}px; top: {}px", pos.left, pos.top)
                }
            >
                {[Align::Left, Align::Center, Align::Right]
                    .into_iter()
                    .map(|a| {
                        view! {
                            <button
                                class=move || {
                                    if current_align() == a {
                                        "rounded bg-accent px-2 py-0.5 text-xs"
                                    } else {
                                        "rounded px-2 py-0.5 text-xs text-muted-foreground hover:bg-accent/50"
                                    }
                                }
                                title=format!("Align {a}")
                                on:mousedown=move |ev: web_sys::MouseEvent| {
                                    ev.prevent_default();
                                    ev.stop_propagation();
                                }
                                on:click=move |ev: web_sys::MouseEvent| {
                                    ev.stop_propagation();
                                    ctx.set_media_alignment(a);
                                }
                            >
                                {a.to_string()}
                            </button>
                        }
                    })
                    .collect_view()}
            </div>
        </Show>
    }
}

/// Previously uploaded images for this session, fetched once and cached for
/// the rest of the session.
#[component]
fn ImageLibrary(open: RwSignal<bool>) -> impl IntoView {
    let ctx = expect_context::<EditorCtx>();

    Effect::new(move |_| {
        if !open.get() {
            return;
        }
        let app = ctx.app.0;
        if app.image_library.get_untracked().is_some() || app.image_library_loading.get_untracked()
        {
            return;
        }
        app.image_library_loading.set(true);

        let api = app.api_client.get_untracked();
        let session = ctx.session_file.get_value();
        spawn_local(async move {
            match api.list_images().await {
                Ok(res) => {
                    let entries = res.images.get(&session).cloned().unwrap_or_default();
                    app.image_library.set(Some(entries));
                }
                Err(e) => {
                    app.notify_error(format!("Failed to list images: {e}"));
                    app.image_library.set(Some(vec![]));
                }
            }
            app.image_library_loading.set(false);
        });
    });

    view! {
        <Show when=move || open.get() fallback=|| ().into_view()>
            <div
                class="fixed inset-0 z-50 flex items-center justify-center bg-black/40"
                on:click=move |_| open.set(false)
            >
                <div
                    class="max-h-[70vh] w-full max-w-md overflow-y-auto rounded-lg border bg-background p-4 shadow-lg"
                    on:click=move |ev: web_sys::MouseEvent| ev.stop_propagation()
                >
                    <div class="mb-3 flex items-center justify-between">
                        <h3 class="text-sm font-medium">"Image library"</h3>
                        <button
                            class="text-muted-foreground hover:text-foreground"
                            on:click=move |_| open.set(false)
                        >
                            "×"
                        </button>
                    </div>

                    <Show
                        when=move || !ctx.app.0.image_library_loading.get()
                        fallback=|| view! { <Spinner /> }
                    >
                        {move || {
                            let entries = ctx.app.0.image_library.get().unwrap_or_default();
                            if entries.is_empty() {
                                view! {
                                    <div class="text-sm text-muted-foreground">
                                        "No images uploaded for this session yet."
                                    </div>
                                }
                                .into_any()
                            } else {
                                entries
                                    .into_iter()
                                    .map(|entry| {
                                        let path = entry.path.clone();
                                        view! {
                                            <button
                                                class="flex w-full items-center gap-2 rounded p-1 text-left text-sm hover:bg-accent/50"
                                                on:click=move |_| {
                                                    let last = ctx
                                                        .blocks
                                                        .get_untracked()
                                                        .len()
                                                        .saturating_sub(1);
                                                    ctx.insert_after(last, Block::image(path.clone()));
                                                    open.set(false);
                                                }
                                            >
                                                <img
                                                    src=entry.path.clone()
                                                    class="size-10 rounded object-cover"
                                                />
                                                <span class="truncate">{entry.path.clone()}</span>
                                                <span class="ml-auto text-xs text-muted-foreground">
                                                    {entry.date.clone()}
                                                </span>
                                            </button>
                                        }
                                    })
                                    .collect_view()
                                    .into_any()
                            }
                        }}
                    </Show>
                </div>
            </div>
        </Show>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockKind;

    fn doc(kinds: &[BlockKind]) -> Document {
        kinds.iter().map(|&k| Block::new(k)).collect()
    }

    #[test]
    fn test_insert_after_clamps_to_end() {
        let mut blocks = doc(&[BlockKind::Text]);
        let at = insert_block_after(&mut blocks, 0, Block::new(BlockKind::Divider));
        assert_eq!(at, 1);
        assert_eq!(blocks[1].kind(), BlockKind::Divider);

        let at = insert_block_after(&mut blocks, 99, Block::new(BlockKind::Callout));
        assert_eq!(at, 2);
        assert_eq!(blocks.last().map(|b| b.kind()), Some(BlockKind::Callout));
    }

    #[test]
    fn test_delete_refuses_last_block() {
        let mut blocks = doc(&[BlockKind::Text]);
        assert_eq!(delete_block(&mut blocks, 0, None), DeleteOutcome::LastBlock);
        assert_eq!(blocks.len(), 1);

        let mut blocks = doc(&[BlockKind::Text, BlockKind::Divider]);
        assert_eq!(delete_block(&mut blocks, 1, None), DeleteOutcome::Removed);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_deleting_a_column_collapses_the_row() {
        let mut blocks = vec![Block::new(BlockKind::Row)];
        let right_id = blocks[0]
            .column(ColumnSide::Right)
            .map(|b| b.id.clone())
            .expect("row has right column");

        let outcome = delete_block(&mut blocks, 0, Some(ColumnSide::Left));
        assert_eq!(outcome, DeleteOutcome::ColumnCollapsed);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id, right_id);
        assert_eq!(blocks[0].kind(), BlockKind::Text);
    }

    #[test]
    fn test_merge_requires_two_non_row_neighbors() {
        let mut blocks = doc(&[BlockKind::Text, BlockKind::Image]);
        assert!(merge_into_row(&mut blocks, 0));
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind(), BlockKind::Row);
        assert_eq!(
            blocks[0].column(ColumnSide::Right).map(|b| b.kind()),
            Some(BlockKind::Image)
        );

        // A row cannot merge again.
        let mut blocks2 = vec![blocks[0].clone(), Block::new(BlockKind::Text)];
        assert!(!merge_into_row(&mut blocks2, 0));

        // No successor.
        assert!(!merge_into_row(&mut blocks, 0));
    }

    #[test]
    fn test_split_row_restores_both_blocks_in_order() {
        let mut blocks = doc(&[BlockKind::Text, BlockKind::Image]);
        merge_into_row(&mut blocks, 0);
        assert!(split_row(&mut blocks, 0));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind(), BlockKind::Text);
        assert_eq!(blocks[1].kind(), BlockKind::Image);

        assert!(!split_row(&mut blocks, 0));
    }

    #[test]
    fn test_swap_row_columns() {
        let mut blocks = doc(&[BlockKind::Text, BlockKind::Image]);
        merge_into_row(&mut blocks, 0);
        assert!(swap_row_columns(&mut blocks, 0));
        assert_eq!(
            blocks[0].column(ColumnSide::Left).map(|b| b.kind()),
            Some(BlockKind::Image)
        );

        let mut plain = doc(&[BlockKind::Text]);
        assert!(!swap_row_columns(&mut plain, 0));
    }

    #[test]
    fn test_move_block_index_math() {
        let mut blocks = doc(&[BlockKind::Text, BlockKind::Image, BlockKind::Callout]);
        let ids: Vec<String> = blocks.iter().map(|b| b.id.clone()).collect();

        // Drag first block after the last one.
        assert!(move_block(&mut blocks, 0, 2, DropPosition::After));
        let order: Vec<&String> = blocks.iter().map(|b| &b.id).collect();
        assert_eq!(order, [&ids[1], &ids[2], &ids[0]]);

        // Drag it back before the first.
        assert!(move_block(&mut blocks, 2, 0, DropPosition::Before));
        let order: Vec<&String> = blocks.iter().map(|b| &b.id).collect();
        assert_eq!(order, [&ids[0], &ids[1], &ids[2]]);

        // Dropping on itself is a no-op.
        assert!(!move_block(&mut blocks, 1, 1, DropPosition::After));
    }

    #[test]
    fn test_locate_and_update_reach_row_columns() {
        let mut blocks = doc(&[BlockKind::Text, BlockKind::Image]);
        merge_into_row(&mut blocks, 0);
        let left_id = blocks[0]
            .column(ColumnSide::Left)
            .map(|b| b.id.clone())
            .unwrap();

        assert_eq!(
            locate_block(&blocks, &left_id),
            Some((0, Some(ColumnSide::Left)))
        );
        assert_eq!(locate_block(&blocks, &blocks[0].id), Some((0, None)));
        assert_eq!(locate_block(&blocks, "missing"), None);

        update_block_by_id(&mut blocks, &left_id, |b| {
            if let BlockData::Text { content, .. } = &mut b.data {
                *content = "updated".to_string();
            }
        });
        let found = find_block_by_id(&blocks, &left_id).unwrap();
        match found.data {
            BlockData::Text { content, .. } => assert_eq!(content, "updated"),
            other => panic!("expected text, got {other:?}"),
        }
    }
}
