//! Typed client for the session/image collaborators.
//!
//! The core only knows these endpoints by their request/response contracts;
//! storage, dedup and cleanup policy all live server-side.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        // Failure bodies are `{"error": "..."}`; fall back to the raw body.
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {detail}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:8000".to_string();

        // We support BOTH `window.ENV.API_URL` (documented in README) and
        // `window.ENV.api_url` (legacy/implementation detail) for compatibility.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    // 1) Prefer README style: API_URL
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"API_URL".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }

                    // 2) Fallback: api_url
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"api_url".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UpdateCardRequest {
    #[serde(rename = "sessionFile")]
    pub session_file: String,
    #[serde(rename = "cardIndex")]
    pub card_index: usize,
    pub content: String,
    #[serde(rename = "uploadedImages")]
    pub uploaded_images: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UpdateCardResponse {
    #[serde(default)]
    pub success: bool,
    /// How many now-unreferenced images the server removed, if any.
    #[serde(rename = "deletedImages", default)]
    pub deleted_images: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct DeleteCardRequest {
    #[serde(rename = "sessionFile")]
    pub session_file: String,
    #[serde(rename = "cardIndex")]
    pub card_index: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct DeleteCardResponse {
    #[serde(default)]
    pub success: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UploadImageResponse {
    pub path: String,
    /// True when the server already had this exact file and reused it.
    #[serde(default)]
    pub duplicate: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CleanupImagesRequest {
    pub images: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct ImageEntry {
    pub path: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct ListImagesResponse {
    #[serde(default)]
    pub images: HashMap<String, Vec<ImageEntry>>,
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }

    pub fn from_env() -> Self {
        Self::new(EnvConfig::new().api_url)
    }

    /// Raw markdown for a session document, served by the static file host.
    pub async fn fetch_session(&self, session_id: &str) -> ApiResult<String> {
        let url = format!(
            "{}/sessions/{}.md",
            self.base_url,
            urlencoding::encode(session_id)
        );
        let res = reqwest::Client::new()
            .get(url)
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            res.text().await.map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Could not load session"))
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
        ctx: &str,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let res = reqwest::Client::new()
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, ctx))
        }
    }

    pub async fn update_card(
        &self,
        session_file: &str,
        card_index: usize,
        content: &str,
        uploaded_images: &[String],
    ) -> ApiResult<UpdateCardResponse> {
        self.post_json(
            "/api/update-card",
            &UpdateCardRequest {
                session_file: session_file.to_string(),
                card_index,
                content: content.to_string(),
                uploaded_images: uploaded_images.to_vec(),
            },
            "Failed to save",
        )
        .await
    }

    pub async fn delete_card(
        &self,
        session_file: &str,
        card_index: usize,
    ) -> ApiResult<DeleteCardResponse> {
        self.post_json(
            "/api/delete-card",
            &DeleteCardRequest {
                session_file: session_file.to_string(),
                card_index,
            },
            "Failed to delete",
        )
        .await
    }

    /// Multipart upload: `image` file part plus the owning `sessionId`.
    pub async fn upload_image(
        &self,
        session_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<UploadImageResponse> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("image", part)
            .text("sessionId", session_id.to_string());

        let url = format!("{}/api/upload-image", self.base_url);
        let res = reqwest::Client::new()
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Upload failed"))
        }
    }

    /// Best-effort deletion of abandoned uploads. The caller has already
    /// discarded the edit, so failures are logged, never surfaced.
    pub async fn cleanup_images(&self, images: &[String]) {
        if images.is_empty() {
            return;
        }

        let result: ApiResult<serde_json::Value> = self
            .post_json(
                "/api/cleanup-images",
                &CleanupImagesRequest {
                    images: images.to_vec(),
                },
                "Cleanup failed",
            )
            .await;

        if let Err(e) = result {
            web_sys::console::warn_1(&format!("Cleanup failed: {e}").into());
        }
    }

    pub async fn list_images(&self) -> ApiResult<ListImagesResponse> {
        let url = format!("{}/api/list-images", self.base_url);
        let res = reqwest::Client::new()
            .get(url)
            .send()
            .await
            .map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Failed to list images"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_card_request_wire_names() {
        let req = UpdateCardRequest {
            session_file: "session-01".to_string(),
            card_index: 3,
            content: "# Hello".to_string(),
            uploaded_images: vec!["images/session-01/a.png".to_string()],
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["sessionFile"], "session-01");
        assert_eq!(v["cardIndex"], 3);
        assert_eq!(v["content"], "# Hello");
        assert_eq!(v["uploadedImages"][0], "images/session-01/a.png");
    }

    #[test]
    fn test_update_card_response_with_cleanup_count() {
        let parsed: UpdateCardResponse =
            serde_json::from_str(r#"{"success": true, "deletedImages": 2}"#)
                .expect("response should parse");
        assert!(parsed.success);
        assert_eq!(parsed.deleted_images, 2);

        // deletedImages is optional; the server omits it when nothing was removed.
        let parsed: UpdateCardResponse =
            serde_json::from_str(r#"{"success": true}"#).expect("response should parse");
        assert_eq!(parsed.deleted_images, 0);
    }

    #[test]
    fn test_upload_image_response_duplicate_flag_optional() {
        let parsed: UploadImageResponse =
            serde_json::from_str(r#"{"path": "images/s/pic.png"}"#).expect("should parse");
        assert_eq!(parsed.path, "images/s/pic.png");
        assert!(!parsed.duplicate);

        let parsed: UploadImageResponse =
            serde_json::from_str(r#"{"path": "images/s/pic.png", "duplicate": true}"#)
                .expect("should parse");
        assert!(parsed.duplicate);
    }

    #[test]
    fn test_list_images_response_grouped_by_session() {
        let json = r#"{
            "images": {
                "session-01": [
                    {"path": "images/session-01/a.png", "date": "2024-05-01"},
                    {"path": "images/session-01/b.png", "date": "2024-05-02"}
                ],
                "session-02": []
            }
        }"#;
        let parsed: ListImagesResponse = serde_json::from_str(json).expect("should parse");
        assert_eq!(parsed.images["session-01"].len(), 2);
        assert_eq!(parsed.images["session-01"][0].path, "images/session-01/a.png");
        assert!(parsed.images["session-02"].is_empty());
    }

    #[test]
    fn test_http_error_extracts_error_body() {
        let err = ApiError::http(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error": "Invalid card index"}"#.to_string(),
            "Failed to save",
        );
        assert_eq!(err.kind, ApiErrorKind::Http);
        assert!(err.message.contains("Invalid card index"));
        assert!(!err.message.contains('{'));

        // Non-JSON bodies pass through untouched.
        let err = ApiError::http(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "boom".to_string(),
            "Failed to save",
        );
        assert!(err.message.contains("boom"));
    }

    #[test]
    fn test_delete_card_request_wire_names() {
        let v = serde_json::to_value(DeleteCardRequest {
            session_file: "s".to_string(),
            card_index: 0,
        })
        .expect("should serialize");
        assert_eq!(v["sessionFile"], "s");
        assert_eq!(v["cardIndex"], 0);
    }
}
