use crate::api::{ApiClient, ImageEntry};
use leptos::prelude::*;
use wasm_bindgen::JsCast;

/// How long a toast stays up before dismissing itself.
const NOTIFICATION_DISPLAY_MS: i32 = 3000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NotifyKind {
    Success,
    Warning,
    Error,
}

impl NotifyKind {
    pub fn class(self) -> &'static str {
        match self {
            NotifyKind::Success => "border-border bg-background text-foreground",
            NotifyKind::Warning => "border-warning/40 bg-warning/10 text-warning-foreground",
            NotifyKind::Error => "border-destructive/40 bg-destructive/10 text-destructive",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotifyKind,
}

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// Transient toasts, newest last; each removes itself after a delay.
    pub notifications: RwSignal<Vec<Notification>>,
    notification_seq: RwSignal<u64>,

    /// Image library, filled once per session on first open. Staleness within
    /// a session is an accepted trade-off; uploads made in-session are
    /// inserted directly and never go through this cache.
    pub image_library: RwSignal<Option<Vec<ImageEntry>>>,
    pub image_library_loading: RwSignal<bool>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            api_client: RwSignal::new(ApiClient::from_env()),
            notifications: RwSignal::new(vec![]),
            notification_seq: RwSignal::new(0),
            image_library: RwSignal::new(None),
            image_library_loading: RwSignal::new(false),
        }
    }

    /// Show a toast and schedule its removal.
    pub fn notify(&self, message: impl Into<String>, kind: NotifyKind) {
        let id = self.notification_seq.get_untracked().wrapping_add(1);
        self.notification_seq.set(id);

        self.notifications.update(|list| {
            list.push(Notification {
                id,
                message: message.into(),
                kind,
            });
        });

        let notifications = self.notifications;
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                wasm_bindgen::closure::Closure::once_into_js(move || {
                    notifications.update(|list| list.retain(|n| n.id != id));
                })
                .as_ref()
                .unchecked_ref(),
                NOTIFICATION_DISPLAY_MS,
            );
        }
    }

    pub fn notify_success(&self, message: impl Into<String>) {
        self.notify(message, NotifyKind::Success);
    }

    pub fn notify_warning(&self, message: impl Into<String>) {
        self.notify(message, NotifyKind::Warning);
    }

    pub fn notify_error(&self, message: impl Into<String>) {
        self.notify(message, NotifyKind::Error);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);

/// Dev mode unlocks editing: local hosts always qualify, and `?edit=true`
/// opts in anywhere else. A client-side convenience flag, not auth.
pub(crate) fn detect_dev_mode() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let location = window.location();

    if let Ok(hostname) = location.hostname() {
        if hostname == "localhost" || hostname == "127.0.0.1" {
            return true;
        }
    }

    location
        .search()
        .ok()
        .map(|s| query_flag(&s, "edit"))
        .unwrap_or(false)
}

/// True when `?name=true` appears in a raw query string.
pub(crate) fn query_flag(search: &str, name: &str) -> bool {
    let needle = format!("{name}=true");
    search
        .trim_start_matches('?')
        .split('&')
        .any(|pair| pair == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_flag_matches_exact_pairs() {
        assert!(query_flag("?edit=true", "edit"));
        assert!(query_flag("?card=2&edit=true", "edit"));
        assert!(!query_flag("?edit=false", "edit"));
        assert!(!query_flag("?editing=true", "edit"));
        assert!(!query_flag("", "edit"));
    }
}
