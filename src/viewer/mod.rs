//! The card deck: fetches a session document, splits it into cards and
//! drives navigation. In dev mode each card gains an edit affordance that
//! swaps the rendered card for the block editor.

use crate::components::ui::{
    Alert, AlertDescription, AlertTitle, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardHeader, CardTitle, Input, Label, Spinner,
};
use crate::dialect::split_into_cards;
use crate::editor::CardEditor;
use crate::render::markdown_to_html;
use crate::state::{detect_dev_mode, query_flag, AppContext};
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use leptos_router::hooks::{use_navigate, use_params, use_query_map};
use leptos_router::params::Params;
use wasm_bindgen::JsCast;

#[derive(Params, PartialEq, Clone, Debug)]
pub struct DeckRouteParams {
    pub session: Option<String>,
}

/// Mirror the viewer state into the query string so reloads and shared
/// links land on the same card. The `edit=true` opt-in survives rewrites.
fn replace_url_state(card: usize, editing: bool) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let keeps_edit_flag = window
        .location()
        .search()
        .ok()
        .map(|s| query_flag(&s, "edit"))
        .unwrap_or(false);

    let mut query = format!("?card={card}");
    if keeps_edit_flag {
        query.push_str("&edit=true");
    }
    if editing {
        query.push_str("&editing=true");
    }

    if let Ok(history) = window.history() {
        let _ = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&query));
    }
}

#[component]
pub fn DeckPage() -> impl IntoView {
    let app = expect_context::<AppContext>();
    let params = use_params::<DeckRouteParams>();
    let query = use_query_map();

    let session = move || {
        params
            .get()
            .ok()
            .and_then(|p| p.session)
            .unwrap_or_default()
    };

    let cards: RwSignal<Vec<String>> = RwSignal::new(vec![]);
    let current: RwSignal<usize> = RwSignal::new(0);
    let editing: RwSignal<Option<usize>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let load_error: RwSignal<Option<String>> = RwSignal::new(None);
    let loaded_session: RwSignal<Option<String>> = RwSignal::new(None);

    let dev_mode = detect_dev_mode();

    // Fetch the session document once per session param.
    Effect::new(move |_| {
        let id = session();
        if id.trim().is_empty() {
            return;
        }
        if loaded_session.get().as_deref() == Some(id.as_str()) {
            return;
        }
        loaded_session.set(Some(id.clone()));
        loading.set(true);
        load_error.set(None);

        let initial_card = query
            .get_untracked()
            .get("card")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        let auto_edit = dev_mode
            && web_sys::window()
                .and_then(|w| w.location().search().ok())
                .map(|s| query_flag(&s, "editing"))
                .unwrap_or(false);

        let api = app.0.api_client.get_untracked();
        spawn_local(async move {
            match api.fetch_session(&id).await {
                Ok(text) => {
                    let split = split_into_cards(&text);
                    let start = initial_card.min(split.len().saturating_sub(1));
                    cards.set(split);
                    current.set(start);
                    if auto_edit {
                        editing.set(Some(start));
                    }
                }
                Err(e) => load_error.set(Some(e.to_string())),
            }
            loading.set(false);
        });
    });

    let go_to = move |target: usize| {
        let count = cards.get_untracked().len();
        if count == 0 {
            return;
        }
        let clamped = target.min(count - 1);
        current.set(clamped);
        replace_url_state(clamped, editing.get_untracked().is_some());
    };

    let next_card = move || {
        let i = current.get_untracked();
        if i + 1 < cards.get_untracked().len() {
            go_to(i + 1);
        }
    };
    let prev_card = move || {
        let i = current.get_untracked();
        if i > 0 {
            go_to(i - 1);
        }
    };

    let enter_edit = move |index: usize| {
        if !dev_mode {
            return;
        }
        if editing.get_untracked().is_some() {
            app.0
                .notify_error("Please save or cancel current edits first");
            return;
        }
        editing.set(Some(index));
        replace_url_state(current.get_untracked(), true);
    };

    // Deck navigation and the edit-mode entry shortcut. Everything else is
    // the editor's business while a card is open.
    let _key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        let in_text_field = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            .map(|el| {
                let tag = el.tag_name().to_lowercase();
                tag == "input" || tag == "textarea"
            })
            .unwrap_or(false);

        if (ev.meta_key() || ev.ctrl_key()) && ev.key() == "e" {
            ev.prevent_default();
            if editing.get_untracked().is_none() {
                enter_edit(current.get_untracked());
            }
            return;
        }

        if editing.get_untracked().is_some() || in_text_field {
            return;
        }
        match ev.key().as_str() {
            "ArrowRight" => next_card(),
            "ArrowLeft" => prev_card(),
            _ => {}
        }
    });

    let progress_percent = move || {
        let count = cards.get().len();
        if count <= 1 {
            100.0
        } else {
            current.get() as f64 / (count - 1) as f64 * 100.0
        }
    };

    let on_saved = Callback::new(move |content: String| {
        if let Some(index) = editing.get_untracked() {
            cards.update(|cards| {
                if let Some(card) = cards.get_mut(index) {
                    *card = content;
                }
            });
        }
        editing.set(None);
        replace_url_state(current.get_untracked(), false);
    });

    let on_cancelled = Callback::new(move |_: ()| {
        editing.set(None);
        replace_url_state(current.get_untracked(), false);
    });

    let on_deleted = Callback::new(move |_: ()| {
        let Some(index) = editing.get_untracked() else {
            return;
        };
        editing.set(None);
        cards.update(|cards| {
            if index < cards.len() {
                cards.remove(index);
            }
        });
        let count = cards.get_untracked().len();
        let new_current = current.get_untracked().min(count.saturating_sub(1));
        current.set(new_current);
        replace_url_state(new_current, false);
    });

    view! {
        <div class="mx-auto w-full max-w-3xl px-4 py-8">
            <Show when=move || loading.get() fallback=|| ().into_view()>
                <div class="flex justify-center py-16">
                    <Spinner class="size-6" />
                </div>
            </Show>

            <Show when=move || load_error.get().is_some() fallback=|| ().into_view()>
                <Alert class="border-destructive/40">
                    <AlertTitle>"Could not load session"</AlertTitle>
                    <AlertDescription>
                        {move || load_error.get().unwrap_or_default()}
                    </AlertDescription>
                </Alert>
            </Show>

            <Show
                when=move || !loading.get() && load_error.get().is_none() && !cards.get().is_empty()
                fallback=|| ().into_view()
            >
                <div class="relative">
                    {move || {
                        let count = cards.get().len();
                        cards
                            .get()
                            .into_iter()
                            .enumerate()
                            .map(|(index, card)| {
                                let offset = index as i64 - current.get() as i64;
                                let style = match offset {
                                    0 => "opacity: 1; transform: none; pointer-events: auto; position: relative".to_string(),
                                    o if o > 0 && o < 4 => format!(
                                        "opacity: {}; transform: scale({}) translateY({}px); pointer-events: none; position: absolute; inset: 0; z-index: -{o}",
                                        1.0 - o as f64 * 0.3,
                                        1.0 - o as f64 * 0.05,
                                        -o * 12,
                                    ),
                                    _ => "opacity: 0; transform: scale(0.8) translateY(-40px); pointer-events: none; position: absolute; inset: 0; z-index: -10".to_string(),
                                };
                                let is_current = offset == 0;
                                let is_editing_this = move || editing.get() == Some(index);
                                let card_for_editor = card;

                                view! {
                                    <article
                                        class="min-h-[16rem] rounded-xl border bg-background p-6 shadow-sm transition-all"
                                        style=style
                                    >
                                        <Show
                                            when=is_editing_this
                                            fallback=move || {
                                                let html = markdown_to_html(&cards.get().get(index).cloned().unwrap_or_default());
                                                view! {
                                                    <div class="relative">
                                                        <Show when=move || dev_mode && is_current fallback=|| ().into_view()>
                                                            <div class="absolute right-0 top-0">
                                                                <Button
                                                                    variant=ButtonVariant::Outline
                                                                    size=ButtonSize::Sm
                                                                    on:click=move |_| enter_edit(index)
                                                                >
                                                                    "✎ Edit"
                                                                </Button>
                                                            </div>
                                                        </Show>
                                                        <div inner_html=html></div>
                                                    </div>
                                                }
                                            }
                                        >
                                            <CardEditor
                                                session_file=session()
                                                card_index=index
                                                card_count=count
                                                initial_content=card_for_editor.clone()
                                                on_saved=on_saved
                                                on_cancelled=on_cancelled
                                                on_deleted=on_deleted
                                            />
                                        </Show>
                                    </article>
                                }
                            })
                            .collect_view()
                    }}
                </div>

                <div class="mt-6 flex items-center gap-4">
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || current.get() == 0 || editing.get().is_some()
                        on:click=move |_| prev_card()
                    >
                        "← Prev"
                    </Button>

                    <div class="h-2 flex-1 overflow-hidden rounded-full bg-border">
                        <div
                            class="h-full rounded-full bg-primary transition-all"
                            style=move || format!("width: {}%", progress_percent())
                        ></div>
                    </div>

                    <span class="shrink-0 text-xs text-muted-foreground">
                        {move || format!("{} / {}", current.get() + 1, cards.get().len())}
                    </span>

                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || {
                            current.get() + 1 >= cards.get().len() || editing.get().is_some()
                        }
                        on:click=move |_| next_card()
                    >
                        "Next →"
                    </Button>
                </div>
            </Show>
        </div>
    }
}

/// Fallback route: pick a session by name.
#[component]
pub fn LandingPage() -> impl IntoView {
    let navigate = StoredValue::new(use_navigate());
    let session_name: RwSignal<String> = RwSignal::new(String::new());

    let open_session = move || {
        let name = session_name.get_untracked().trim().to_string();
        if name.is_empty() {
            return;
        }
        let url = format!("/s/{}", urlencoding::encode(&name));
        navigate.with_value(|nav| nav(&url, Default::default()));
    };

    view! {
        <div class="flex min-h-screen items-center justify-center px-4">
            <Card class="w-full max-w-sm">
                <CardHeader>
                    <CardTitle>"Open a session"</CardTitle>
                </CardHeader>
                <CardContent class="space-y-3">
                    <Label html_for="session-name">"Session name"</Label>
                    <Input
                        id="session-name"
                        placeholder="session-01"
                        bind_value=session_name
                    />
                    <Button
                        class="w-full"
                        on:click=move |_| open_session()
                    >
                        "Open deck"
                    </Button>
                </CardContent>
            </Card>
        </div>
    }
}
