//! Upload response shapes accepted from the image host.

use serde_json::Value;

/// Extract the hosted path or URL from an upload answer.
///
/// Accepted shapes: `{"src": ..}`, `{"data": [{"src": ..}]}` and
/// `[{"src": ..}]`. Only the first element of an array is considered. A
/// blank `src` is not a usable answer, even when `data` carries another one.
pub fn pick_src(body: &Value) -> Option<&str> {
    let src = match body {
        Value::Array(items) => items.first()?.get("src")?.as_str(),
        Value::Object(map) => match map.get("src").and_then(Value::as_str) {
            Some(src) => Some(src),
            None => map.get("data")?.as_array()?.first()?.get("src")?.as_str(),
        },
        _ => None,
    }?;
    (!src.trim().is_empty()).then_some(src)
}

/// Absolute URLs pass through; relative paths are joined onto `base_url`.
pub fn join_url(base_url: &str, src: &str) -> String {
    if has_http_scheme(src) {
        return src.to_string();
    }
    if src.starts_with('/') {
        format!("{base_url}{src}")
    } else {
        format!("{base_url}/{src}")
    }
}

fn has_http_scheme(src: &str) -> bool {
    let lower = src.get(..8).unwrap_or(src).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
