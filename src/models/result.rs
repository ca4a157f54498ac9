//! Backend response normalization
//!
//! Chat models, text "responses" models and image models reached through the
//! same API surface return structurally different payloads. This module is
//! the only place that knows those shapes; everything above it deals in
//! [`ModelResult`].

use serde_json::Value;

/// Text returned when a mixed-output model produced neither text nor an image
pub const NO_DISPLAYABLE_OUTPUT: &str = "The model did not return any displayable output.";

/// MIME prefix for inline base64 images
const INLINE_IMAGE_PREFIX: &str = "data:image/png;base64,";

/// Normalized model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelResult {
    /// Text reply; may be empty when the model produced no content
    Text(String),
    /// Image reply, as a URL or a `data:` URI
    Image { url: String },
}

impl ModelResult {
    /// Reply text; empty for images
    pub fn text(&self) -> &str {
        match self {
            ModelResult::Text(text) => text,
            ModelResult::Image { .. } => "",
        }
    }

    /// Image URL, if this is an image
    pub fn image_url(&self) -> Option<&str> {
        match self {
            ModelResult::Text(_) => None,
            ModelResult::Image { url } => Some(url),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ModelResult::Image { .. })
    }
}

/// Text of the first choice of a chat completion, `""` when absent
pub fn chat_completion_text(body: &Value) -> String {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Consolidated output text of a responses payload, `""` when absent
///
/// Prefers the top-level `output_text`; otherwise concatenates every
/// `output_text` content item across the output blocks.
pub fn consolidated_output_text(body: &Value) -> String {
    if let Some(text) = body.get("output_text").and_then(Value::as_str) {
        return text.to_string();
    }

    output_items(body)
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|item| item.get("text").and_then(Value::as_str))
        .collect()
}

/// Normalize a responses payload that may carry text or an image
///
/// Non-empty text wins. Otherwise the first image artifact found scanning
/// output blocks in order wins. Otherwise a fixed notice is returned as text.
pub fn mixed_output(body: &Value) -> ModelResult {
    let text = consolidated_output_text(body);
    if !text.is_empty() {
        return ModelResult::Text(text);
    }

    output_items(body)
        .find_map(image_artifact)
        .map(|url| ModelResult::Image { url })
        .unwrap_or_else(|| ModelResult::Text(NO_DISPLAYABLE_OUTPUT.to_string()))
}

/// Content items of every output block, in order
fn output_items(body: &Value) -> impl Iterator<Item = &Value> {
    body.get("output")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|block| block.get("content").and_then(Value::as_array))
        .flatten()
}

/// Image URL carried by a single content item
fn image_artifact(item: &Value) -> Option<String> {
    let non_empty = |v: &Value| v.as_str().filter(|s| !s.trim().is_empty()).map(str::to_string);

    if let Some(image_url) = item.get("image_url") {
        // Either a bare string or `{ "url": ... }`
        if let Some(url) = non_empty(image_url).or_else(|| image_url.get("url").and_then(non_empty)) {
            return Some(url);
        }
    }

    for key in ["b64_json", "image_base64"] {
        if let Some(b64) = item.get(key).and_then(non_empty) {
            return Some(format!("{INLINE_IMAGE_PREFIX}{b64}"));
        }
    }

    if item.get("type").and_then(Value::as_str) == Some("image") {
        return item.get("url").and_then(non_empty);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_completion_text() {
        let body = json!({ "choices": [{ "message": { "role": "assistant", "content": "hi" } }] });
        assert_eq!(chat_completion_text(&body), "hi");
    }

    #[test]
    fn test_chat_completion_null_content_is_empty() {
        let body = json!({ "choices": [{ "message": { "role": "assistant", "content": null } }] });
        assert_eq!(chat_completion_text(&body), "");
        assert_eq!(chat_completion_text(&json!({ "choices": [] })), "");
    }

    #[test]
    fn test_consolidated_prefers_top_level() {
        let body = json!({
            "output_text": "top",
            "output": [{ "content": [{ "type": "output_text", "text": "nested" }] }]
        });
        assert_eq!(consolidated_output_text(&body), "top");
    }

    #[test]
    fn test_consolidated_concatenates_blocks() {
        let body = json!({
            "output": [
                { "type": "reasoning", "content": [] },
                { "type": "message", "content": [
                    { "type": "output_text", "text": "Hello, " },
                    { "type": "refusal", "refusal": "no" }
                ]},
                { "type": "message", "content": [{ "type": "output_text", "text": "world" }] }
            ]
        });
        assert_eq!(consolidated_output_text(&body), "Hello, world");
    }

    #[test]
    fn test_consolidated_missing_is_empty() {
        assert_eq!(consolidated_output_text(&json!({})), "");
        assert_eq!(consolidated_output_text(&json!({ "output": "weird" })), "");
    }

    #[test]
    fn test_mixed_text_beats_image() {
        let body = json!({
            "output_text": "a caption",
            "output": [{ "content": [{ "image_url": "https://img.example/1.png" }] }]
        });
        assert_eq!(mixed_output(&body), ModelResult::Text("a caption".into()));
    }

    #[test]
    fn test_mixed_image_url_string() {
        let body = json!({ "output": [{ "content": [{ "image_url": "https://img.example/1.png" }] }] });
        assert_eq!(
            mixed_output(&body),
            ModelResult::Image { url: "https://img.example/1.png".into() }
        );
    }

    #[test]
    fn test_mixed_image_url_object() {
        let body = json!({ "output": [{ "content": [{ "image_url": { "url": "https://img.example/2.png" } }] }] });
        assert_eq!(mixed_output(&body).image_url(), Some("https://img.example/2.png"));
    }

    #[test]
    fn test_mixed_inline_base64() {
        let body = json!({ "output": [{ "content": [{ "b64_json": "iVBORw0KGgo=" }] }] });
        assert_eq!(
            mixed_output(&body).image_url(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );
    }

    #[test]
    fn test_mixed_typed_image() {
        let body = json!({ "output": [{ "content": [
            { "type": "output_text", "text": "" },
            { "type": "image", "url": "https://img.example/3.png" }
        ] }] });
        assert_eq!(mixed_output(&body).image_url(), Some("https://img.example/3.png"));
    }

    #[test]
    fn test_mixed_first_artifact_wins() {
        let body = json!({ "output": [
            { "content": [{ "type": "note" }] },
            { "content": [{ "image_base64": "Zmlyc3Q=" }, { "image_url": "https://img.example/second.png" }] },
            { "content": [{ "image_url": "https://img.example/third.png" }] }
        ] });
        assert_eq!(mixed_output(&body).image_url(), Some("data:image/png;base64,Zmlyc3Q="));
    }

    #[test]
    fn test_mixed_nothing_displayable() {
        let body = json!({ "output": [{ "content": [{ "type": "image" }] }] });
        assert_eq!(mixed_output(&body), ModelResult::Text(NO_DISPLAYABLE_OUTPUT.into()));
        assert_eq!(mixed_output(&json!({})), ModelResult::Text(NO_DISPLAYABLE_OUTPUT.into()));
    }

    #[test]
    fn test_accessors() {
        let text = ModelResult::Text("x".into());
        assert_eq!(text.text(), "x");
        assert_eq!(text.image_url(), None);
        assert!(!text.is_image());

        let image = ModelResult::Image { url: "u".into() };
        assert_eq!(image.text(), "");
        assert_eq!(image.image_url(), Some("u"));
        assert!(image.is_image());
    }
}
