//! Slash command menu: a single command palette for inserting typed blocks.
//!
//! The state machine here is plain Rust and host-testable; the component at
//! the bottom renders it as a fixed-position overlay. The menu never mutates
//! the document itself: execution surfaces a command id + insertion index and
//! the editor owns what happens next.

use crate::models::BlockKind;
use leptos::prelude::*;

pub(crate) const MENU_WIDTH: f64 = 240.0;
const MENU_MARGIN: f64 = 10.0;
const MENU_GAP: f64 = 5.0;
const MENU_MAX_HEIGHT: f64 = 300.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SlashCommand {
    pub kind: BlockKind,
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

pub(crate) const COMMANDS: [SlashCommand; 5] = [
    SlashCommand {
        kind: BlockKind::Text,
        id: "text",
        label: "Text",
        icon: "📝",
        description: "Add a text block",
    },
    SlashCommand {
        kind: BlockKind::Image,
        id: "image",
        label: "Image",
        icon: "📷",
        description: "Add an image",
    },
    SlashCommand {
        kind: BlockKind::Video,
        id: "video",
        label: "Video",
        icon: "🎥",
        description: "Add a video",
    },
    SlashCommand {
        kind: BlockKind::Details,
        id: "details",
        label: "Collapsible",
        icon: "↕️",
        description: "Add a collapsible section",
    },
    SlashCommand {
        kind: BlockKind::Callout,
        id: "callout",
        label: "Callout",
        icon: "💡",
        description: "Add a callout box",
    },
];

/// Case-insensitive substring filter over label, id and description.
pub(crate) fn filter_commands(query: &str) -> Vec<SlashCommand> {
    if query.is_empty() {
        return COMMANDS.to_vec();
    }
    let q = query.to_lowercase();
    COMMANDS
        .iter()
        .copied()
        .filter(|cmd| {
            cmd.label.to_lowercase().contains(&q)
                || cmd.id.contains(&q)
                || cmd.description.to_lowercase().contains(&q)
        })
        .collect()
}

/// How the menu was opened; both carry the block index the insertion targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlashTrigger {
    /// `/` typed at the start of a line inside block `index`'s text surface.
    Typed { index: usize },
    /// Explicit add-block affordance; insert after `index`.
    Button { index: usize },
}

/// Anchor rectangle in viewport coordinates, captured when the menu opens.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct AnchorRect {
    pub left: f64,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SlashMenuState {
    pub trigger: Option<SlashTrigger>,
    pub query: String,
    pub selected: usize,
    pub anchor: AnchorRect,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SlashKeyAction {
    /// Key was consumed by the menu; the host surface must not react.
    Handled,
    /// Enter/Tab on the highlighted entry.
    Execute(SlashCommand),
    /// Menu is inactive; let the host handle the key.
    Ignored,
}

impl SlashMenuState {
    pub fn is_active(&self) -> bool {
        self.trigger.is_some()
    }

    pub fn show(&mut self, trigger: SlashTrigger, anchor: AnchorRect) {
        self.trigger = Some(trigger);
        self.query = String::new();
        self.selected = 0;
        self.anchor = anchor;
    }

    pub fn hide(&mut self) {
        self.trigger = None;
        self.query = String::new();
        self.selected = 0;
    }

    pub fn filtered(&self) -> Vec<SlashCommand> {
        filter_commands(&self.query)
    }

    /// Keyboard contract while active: arrows cycle with wraparound over the
    /// filtered list, Enter/Tab execute, Escape hides. All four are consumed.
    pub fn handle_key(&mut self, key: &str) -> SlashKeyAction {
        if !self.is_active() {
            return SlashKeyAction::Ignored;
        }

        let filtered = self.filtered();
        match key {
            "ArrowDown" => {
                if !filtered.is_empty() {
                    self.selected = (self.selected + 1) % filtered.len();
                }
                SlashKeyAction::Handled
            }
            "ArrowUp" => {
                if !filtered.is_empty() {
                    self.selected = (self.selected + filtered.len() - 1) % filtered.len();
                }
                SlashKeyAction::Handled
            }
            "Enter" | "Tab" => match filtered.get(self.selected) {
                Some(cmd) => SlashKeyAction::Execute(*cmd),
                None => SlashKeyAction::Handled,
            },
            "Escape" => {
                self.hide();
                SlashKeyAction::Handled
            }
            _ => SlashKeyAction::Ignored,
        }
    }

    /// Track typing in the host text surface. Opens on a lone `/` at the
    /// start of the current line, keeps the query in sync while the `/`
    /// stays at line start, and hides once the trigger is broken or the
    /// filtered set empties.
    pub fn track_input(&mut self, before_cursor: &str, index: usize, anchor: AnchorRect) {
        let line_before_cursor = before_cursor
            .rsplit_once('\n')
            .map(|(_, line)| line)
            .unwrap_or(before_cursor);

        if line_before_cursor == "/" {
            self.show(SlashTrigger::Typed { index }, anchor);
            return;
        }

        if !self.is_active() {
            return;
        }

        match before_cursor.rfind('/') {
            Some(slash_idx) => {
                let at_line_start = before_cursor[..slash_idx]
                    .chars()
                    .next_back()
                    .map(|c| c == '\n')
                    .unwrap_or(true);
                let query = &before_cursor[slash_idx + 1..];
                if at_line_start && !query.contains('\n') {
                    self.query = query.to_string();
                    self.selected = 0;
                    if self.filtered().is_empty() {
                        self.hide();
                    }
                } else {
                    self.hide();
                }
            }
            None => self.hide(),
        }
    }
}

/// Remove the triggering `/` and any filter text after it from the host
/// buffer. Returns the edited buffer and the cursor position to restore.
pub(crate) fn strip_trigger(buffer: &str, cursor: usize) -> Option<(String, usize)> {
    let cursor = cursor.min(buffer.len());
    let slash_idx = buffer[..cursor].rfind('/')?;
    let mut out = String::with_capacity(buffer.len());
    out.push_str(&buffer[..slash_idx]);
    out.push_str(&buffer[cursor..]);
    Some((out, slash_idx))
}

/// Where the menu should go relative to its anchor: below by default, above
/// when the space below is too tight, clamped into the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MenuPlacement {
    pub left: f64,
    /// Offset from the top edge (`None` when anchored above via `bottom`).
    pub top: Option<f64>,
    /// Offset from the viewport bottom edge when flipped above.
    pub bottom: Option<f64>,
    pub max_height: f64,
}

pub(crate) fn place_menu(
    anchor: AnchorRect,
    menu_height: f64,
    viewport_width: f64,
    viewport_height: f64,
) -> MenuPlacement {
    let left = anchor
        .left
        .min(viewport_width - MENU_WIDTH - 2.0 * MENU_MARGIN);

    let space_below = viewport_height - anchor.bottom - MENU_MARGIN;
    let space_above = anchor.top - MENU_MARGIN;

    if space_below < menu_height && space_above > space_below {
        MenuPlacement {
            left,
            top: None,
            bottom: Some(viewport_height - anchor.top + MENU_GAP),
            max_height: MENU_MAX_HEIGHT.min(space_above),
        }
    } else {
        MenuPlacement {
            left,
            top: Some(anchor.bottom + MENU_GAP),
            bottom: None,
            max_height: MENU_MAX_HEIGHT.min(space_below),
        }
    }
}

#[component]
pub fn SlashMenu(
    state: RwSignal<SlashMenuState>,
    #[prop(into)] on_execute: Callback<SlashCommand>,
) -> impl IntoView {
    let placement = move || {
        let anchor = state.get().anchor;
        let window = web_sys::window().expect("browser window");
        let vw = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1024.0);
        let vh = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(768.0);
        // Estimated height; the real menu clamps itself via max-height.
        place_menu(anchor, 200.0, vw, vh)
    };

    let style = move || {
        let p = placement();
        let vertical = match (p.top, p.bottom) {
            (Some(top), _) => format!("top: {top}px; bottom: auto"),
            (_, Some(bottom)) => format!("top: auto; bottom: {bottom}px"),
            _ => String::new(),
        };
        format!(
            "position: fixed; width: {MENU_WIDTH}px; left: {}px; {vertical}; max-height: {}px; z-index: 60",
            p.left, p.max_height
        )
    };

    view! {
        <Show when=move || state.get().is_active() fallback=|| ().into_view()>
            <div
                class="overflow-y-auto rounded-md border bg-background shadow-lg"
                style=style
            >
                {move || {
                    let s = state.get();
                    s.filtered()
                        .into_iter()
                        .enumerate()
                        .map(|(i, cmd)| {
                            let row_class = if i == s.selected {
                                "flex w-full items-center gap-2 px-3 py-2 text-left text-sm bg-accent text-accent-foreground"
                            } else {
                                "flex w-full items-center gap-2 px-3 py-2 text-left text-sm hover:bg-accent/50"
                            };
                            view! {
                                <button
                                    class=row_class
                                    // mousedown beats the textarea blur that a click would cause
                                    on:mousedown=move |ev: web_sys::MouseEvent| {
                                        ev.prevent_default();
                                        ev.stop_propagation();
                                        on_execute.run(cmd);
                                    }
                                >
                                    <span>{cmd.icon}</span>
                                    <span class="font-medium">{cmd.label}</span>
                                    <span class="ml-auto text-xs text-muted-foreground">{cmd.description}</span>
                                </button>
                            }
                        })
                        .collect_view()
                }}
            </div>
        </Show>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed_state() -> SlashMenuState {
        let mut state = SlashMenuState::default();
        state.show(SlashTrigger::Typed { index: 0 }, AnchorRect::default());
        state
    }

    #[test]
    fn test_filter_matches_label_id_and_description() {
        assert_eq!(filter_commands("").len(), COMMANDS.len());
        assert_eq!(filter_commands("vid").len(), 1);
        assert_eq!(filter_commands("vid")[0].id, "video");
        // "Collapsible" only matches via label/description, not id.
        assert_eq!(filter_commands("collaps")[0].id, "details");
        // Description match: "box" only appears in the callout description.
        assert_eq!(filter_commands("box")[0].id, "callout");
        assert!(filter_commands("zzz").is_empty());
    }

    #[test]
    fn test_arrow_keys_wrap_over_filtered_list() {
        let mut state = typed_state();
        assert_eq!(state.handle_key("ArrowUp"), SlashKeyAction::Handled);
        assert_eq!(state.selected, COMMANDS.len() - 1);
        assert_eq!(state.handle_key("ArrowDown"), SlashKeyAction::Handled);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_enter_executes_selected_filtered_command() {
        let mut state = typed_state();
        state.query = "vid".to_string();
        match state.handle_key("Enter") {
            SlashKeyAction::Execute(cmd) => assert_eq!(cmd.id, "video"),
            other => panic!("expected execute, got {other:?}"),
        }
    }

    #[test]
    fn test_escape_hides_and_other_keys_pass_through() {
        let mut state = typed_state();
        assert_eq!(state.handle_key("Escape"), SlashKeyAction::Handled);
        assert!(!state.is_active());
        assert_eq!(state.handle_key("ArrowDown"), SlashKeyAction::Ignored);
        let mut state = typed_state();
        assert_eq!(state.handle_key("a"), SlashKeyAction::Ignored);
    }

    #[test]
    fn test_track_input_opens_on_line_start_slash() {
        let mut state = SlashMenuState::default();
        state.track_input("/", 2, AnchorRect::default());
        assert_eq!(state.trigger, Some(SlashTrigger::Typed { index: 2 }));

        let mut state = SlashMenuState::default();
        state.track_input("first line\n/", 0, AnchorRect::default());
        assert!(state.is_active());

        // Mid-line slash never triggers.
        let mut state = SlashMenuState::default();
        state.track_input("a/", 0, AnchorRect::default());
        assert!(!state.is_active());
    }

    #[test]
    fn test_track_input_updates_query_and_autohides() {
        let mut state = typed_state();
        state.track_input("/vi", 0, AnchorRect::default());
        assert_eq!(state.query, "vi");
        assert!(state.is_active());

        state.track_input("/xyzzy", 0, AnchorRect::default());
        assert!(!state.is_active(), "empty filter set hides the menu");
    }

    #[test]
    fn test_track_input_hides_once_trigger_is_broken() {
        // Slash deleted.
        let mut state = typed_state();
        state.track_input("vi", 0, AnchorRect::default());
        assert!(!state.is_active());

        // Text inserted before the slash pushes it off line start.
        let mut state = typed_state();
        state.track_input("x/vi", 0, AnchorRect::default());
        assert!(!state.is_active());

        // Newline typed after the trigger.
        let mut state = typed_state();
        state.track_input("/te\nxt", 0, AnchorRect::default());
        assert!(!state.is_active());
    }

    #[test]
    fn test_typed_slash_then_vid_then_enter_executes_video() {
        let mut state = SlashMenuState::default();
        state.track_input("/", 0, AnchorRect::default());
        state.track_input("/v", 0, AnchorRect::default());
        state.track_input("/vi", 0, AnchorRect::default());
        state.track_input("/vid", 0, AnchorRect::default());
        match state.handle_key("Enter") {
            SlashKeyAction::Execute(cmd) => assert_eq!(cmd.id, "video"),
            other => panic!("expected execute, got {other:?}"),
        }
    }

    #[test]
    fn test_strip_trigger_removes_slash_and_query() {
        let (buffer, cursor) = strip_trigger("intro\n/vid", 10).expect("slash present");
        assert_eq!(buffer, "intro\n");
        assert_eq!(cursor, 6);

        // Text after the cursor is preserved.
        let (buffer, cursor) = strip_trigger("/te rest", 3).expect("slash present");
        assert_eq!(buffer, " rest");
        assert_eq!(cursor, 0);

        assert!(strip_trigger("no trigger", 5).is_none());
    }

    #[test]
    fn test_place_menu_below_then_flips_above() {
        let anchor = AnchorRect {
            left: 50.0,
            top: 100.0,
            bottom: 120.0,
        };
        let p = place_menu(anchor, 200.0, 1024.0, 768.0);
        assert_eq!(p.top, Some(125.0));
        assert!(p.bottom.is_none());

        // Anchor near the bottom edge: flip above.
        let anchor = AnchorRect {
            left: 50.0,
            top: 700.0,
            bottom: 720.0,
        };
        let p = place_menu(anchor, 200.0, 1024.0, 768.0);
        assert!(p.top.is_none());
        assert_eq!(p.bottom, Some(768.0 - 700.0 + 5.0));
        assert!(p.max_height <= 700.0 - 10.0);
    }

    #[test]
    fn test_place_menu_clamps_to_right_edge() {
        let anchor = AnchorRect {
            left: 1000.0,
            top: 100.0,
            bottom: 120.0,
        };
        let p = place_menu(anchor, 200.0, 1024.0, 768.0);
        assert_eq!(p.left, 1024.0 - MENU_WIDTH - 20.0);
    }
}
