use crate::state::{AppContext, AppState};
use crate::viewer::{DeckPage, LandingPage};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // IMPORTANT:
    // - Leptos CSR requires the `csr` feature on `leptos`.
    // - router hooks require a <Router> context.
    view! {
        <Router>
            <NotificationStack />
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("s/:session") view=DeckPage />
                <Route path=path!("") view=LandingPage />
            </Routes>
        </Router>
    }
}

/// Transient toasts, stacked top-center; each entry removes itself.
#[component]
fn NotificationStack() -> impl IntoView {
    let app = expect_context::<AppContext>();

    view! {
        <div class="pointer-events-none fixed inset-x-0 top-6 z-[100] flex flex-col items-center gap-2">
            {move || {
                app.0
                    .notifications
                    .get()
                    .into_iter()
                    .map(|n| {
                        let class = format!(
                            "pointer-events-auto rounded-md border px-4 py-2 text-sm shadow-md {}",
                            n.kind.class()
                        );
                        view! { <div class=class>{n.message}</div> }
                    })
                    .collect_view()
            }}
        </div>
    }
}
