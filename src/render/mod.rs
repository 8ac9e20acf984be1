//! Boundary to the markdown renderer collaborator.
//!
//! The page is expected to expose a sanitizing `window.renderMarkdown(text)`
//! hook (third-party markdown + sanitizer, out of scope here). When the hook
//! is absent the content degrades to escaped preformatted text rather than
//! raw HTML injection.

use wasm_bindgen::{JsCast, JsValue};

const RENDER_HOOK: &str = "renderMarkdown";

pub(crate) fn markdown_to_html(markdown: &str) -> String {
    if let Some(window) = web_sys::window() {
        if let Some(hook) = window.get(RENDER_HOOK) {
            if let Ok(render) = hook.dyn_into::<js_sys::Function>() {
                if let Ok(html) = render.call1(&JsValue::NULL, &JsValue::from_str(markdown)) {
                    if let Some(html) = html.as_string() {
                        return html;
                    }
                }
            }
        }
    }

    format!("<pre>{}</pre>", escape_html(markdown))
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html("<script>alert('x & y')</script>"),
            "&lt;script&gt;alert(&#39;x &amp; y&#39;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
        assert_eq!(escape_html("a \"b\" c"), "a &quot;b&quot; c");
    }
}
