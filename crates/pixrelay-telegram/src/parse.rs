//! Extraction of a [`PhotoEvent`] from a raw webhook update.
//!
//! The update is kept as an untyped `serde_json::Value` and walked through an
//! explicit guard chain. Anything that fails a guard yields `None`, which the
//! webhook answers with `200 {ok:true, ignored:true}`; a malformed update is
//! never an error.

use serde_json::{Map, Value};

use pixrelay_core::types::PhotoEvent;

use crate::allow::ChatAllowList;

/// Parse a channel photo out of `update`.
///
/// Accepted when, in order:
/// 1. the update is an object with a `channel_post` (or, failing that, an
///    `edited_channel_post`) object
/// 2. the post has an integer `message_id`
/// 3. the post has a `chat.id` that is a number or a string
/// 4. that chat id is on the allowlist
/// 5. a file reference exists: the last entry of a non-empty `photo` array
///    (highest resolution), else a `document` with an `image/*` MIME type
pub fn parse_update(update: &Value, allowed: &ChatAllowList) -> Option<PhotoEvent> {
    let update = update.as_object()?;
    let (post, is_edited) = pick_channel_post(update)?;

    let message_id = post.get("message_id")?.as_i64()?;
    let chat_id = chat_id_string(post.get("chat")?.get("id")?)?;

    if !allowed.is_allowed(&chat_id) {
        return None;
    }

    let file = pick_photo(post).or_else(|| pick_image_document(post))?;
    let file_id = file.get("file_id")?.as_str()?.to_string();
    let file_unique_id = file
        .get("file_unique_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(PhotoEvent {
        chat_id,
        message_id,
        file_id,
        file_unique_id,
        is_edited,
    })
}

/// `update_id` of the update, for log correlation only.
pub fn update_id(update: &Value) -> Option<i64> {
    update.get("update_id").and_then(Value::as_i64)
}

fn pick_channel_post(update: &Map<String, Value>) -> Option<(&Map<String, Value>, bool)> {
    if let Some(post) = update.get("channel_post").and_then(Value::as_object) {
        return Some((post, false));
    }
    update
        .get("edited_channel_post")
        .and_then(Value::as_object)
        .map(|post| (post, true))
}

fn chat_id_string(id: &Value) -> Option<String> {
    match id {
        Value::Number(n) => Some(number_string(n)),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Integral floats render without a fraction, so `-100123.0` matches the
/// allowlist entry `-100123`.
fn number_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

/// Telegram lists photo sizes smallest first. Only the last entry is
/// considered; a last entry without a string `file_id` falls through to the
/// document check.
fn pick_photo(post: &Map<String, Value>) -> Option<&Map<String, Value>> {
    let largest = post.get("photo")?.as_array()?.last()?.as_object()?;
    largest.get("file_id")?.as_str()?;
    Some(largest)
}

fn pick_image_document(post: &Map<String, Value>) -> Option<&Map<String, Value>> {
    let document = post.get("document")?.as_object()?;
    let mime_type = document.get("mime_type")?.as_str()?;
    if !mime_type.starts_with("image/") {
        return None;
    }
    document.get("file_id")?.as_str()?;
    Some(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn allowed() -> ChatAllowList {
        ChatAllowList::new(["-100123"])
    }

    #[test]
    fn accepts_channel_post_photo_and_picks_largest() {
        let update = json!({
            "update_id": 1,
            "channel_post": {
                "message_id": 42,
                "chat": {"id": -100123},
                "photo": [
                    {"file_id": "small", "file_unique_id": "u1"},
                    {"file_id": "large", "file_unique_id": "u2"}
                ]
            }
        });

        let parsed = parse_update(&update, &allowed()).unwrap();
        assert_eq!(
            parsed,
            PhotoEvent {
                chat_id: "-100123".into(),
                message_id: 42,
                file_id: "large".into(),
                file_unique_id: "u2".into(),
                is_edited: false,
            }
        );
    }

    #[test]
    fn accepts_edited_channel_post_with_string_chat_id() {
        let update = json!({
            "edited_channel_post": {
                "message_id": 5,
                "chat": {"id": "-100123"},
                "photo": [{"file_id": "f1", "file_unique_id": "ux"}]
            }
        });

        let parsed = parse_update(&update, &allowed()).unwrap();
        assert!(parsed.is_edited);
        assert_eq!(parsed.file_id, "f1");
        assert_eq!(parsed.chat_id, "-100123");
    }

    #[test]
    fn integral_float_chat_id_matches_allowlist() {
        let update = json!({
            "channel_post": {
                "message_id": 3,
                "chat": {"id": -100123.0},
                "photo": [{"file_id": "f1"}]
            }
        });

        let parsed = parse_update(&update, &allowed()).unwrap();
        assert_eq!(parsed.chat_id, "-100123");
    }

    #[test]
    fn fractional_chat_id_is_not_allowed() {
        let update = json!({
            "channel_post": {
                "message_id": 3,
                "chat": {"id": -100123.5},
                "photo": [{"file_id": "f1"}]
            }
        });

        assert_eq!(parse_update(&update, &allowed()), None);
    }

    #[test]
    fn channel_post_wins_over_edited_post() {
        let update = json!({
            "channel_post": {
                "message_id": 1,
                "chat": {"id": -100123},
                "photo": [{"file_id": "fresh"}]
            },
            "edited_channel_post": {
                "message_id": 1,
                "chat": {"id": -100123},
                "photo": [{"file_id": "edited"}]
            }
        });

        let parsed = parse_update(&update, &allowed()).unwrap();
        assert!(!parsed.is_edited);
        assert_eq!(parsed.file_id, "fresh");
    }

    #[test]
    fn accepts_image_document() {
        let update = json!({
            "channel_post": {
                "message_id": 8,
                "chat": {"id": -100123},
                "document": {
                    "file_id": "doc-1",
                    "file_unique_id": "du",
                    "mime_type": "image/png",
                    "file_name": "shot.png"
                }
            }
        });

        let parsed = parse_update(&update, &allowed()).unwrap();
        assert_eq!(parsed.file_id, "doc-1");
        assert_eq!(parsed.file_unique_id, "du");
    }

    #[test]
    fn photo_is_tried_before_document() {
        let update = json!({
            "channel_post": {
                "message_id": 8,
                "chat": {"id": -100123},
                "photo": [{"file_id": "photo-1"}],
                "document": {"file_id": "doc-1", "mime_type": "image/png"}
            }
        });

        assert_eq!(parse_update(&update, &allowed()).unwrap().file_id, "photo-1");
    }

    #[test]
    fn falls_back_to_document_when_photo_unusable() {
        let update = json!({
            "channel_post": {
                "message_id": 8,
                "chat": {"id": -100123},
                "photo": [{"file_id": "ok"}, {}],
                "document": {"file_id": "doc-1", "mime_type": "image/jpeg"}
            }
        });

        assert_eq!(parse_update(&update, &allowed()).unwrap().file_id, "doc-1");
    }

    #[test]
    fn ignores_non_image_document() {
        let update = json!({
            "channel_post": {
                "message_id": 8,
                "chat": {"id": -100123},
                "document": {"file_id": "doc-1", "mime_type": "application/pdf"}
            }
        });

        assert!(parse_update(&update, &allowed()).is_none());
    }

    #[test]
    fn missing_file_unique_id_defaults_to_empty() {
        let update = json!({
            "channel_post": {
                "message_id": 3,
                "chat": {"id": -100123},
                "photo": [{"file_id": "f1"}]
            }
        });

        assert_eq!(parse_update(&update, &allowed()).unwrap().file_unique_id, "");
    }

    #[test]
    fn ignores_chat_outside_allowlist() {
        let update = json!({
            "channel_post": {
                "message_id": 1,
                "chat": {"id": -100999},
                "photo": [{"file_id": "f1"}]
            }
        });

        assert!(parse_update(&update, &allowed()).is_none());
    }

    #[test]
    fn ignores_post_without_photo() {
        let update = json!({
            "channel_post": {
                "message_id": 1,
                "chat": {"id": -100123},
                "text": "hello"
            }
        });

        assert!(parse_update(&update, &allowed()).is_none());
    }

    #[test]
    fn ignores_malformed_shapes() {
        let allowed = allowed();
        assert!(parse_update(&Value::Null, &allowed).is_none());
        assert!(parse_update(&json!([1, 2, 3]), &allowed).is_none());
        assert!(parse_update(&json!("channel_post"), &allowed).is_none());
        assert!(parse_update(&json!({"channel_post": {}}), &allowed).is_none());
        assert!(parse_update(&json!({"channel_post": "text"}), &allowed).is_none());
        assert!(parse_update(
            &json!({"channel_post": {"message_id": 1, "chat": {"id": -100123}, "photo": [{}]}}),
            &allowed
        )
        .is_none());
        assert!(parse_update(
            &json!({"channel_post": {"message_id": 1, "chat": {"id": -100123}, "photo": []}}),
            &allowed
        )
        .is_none());
    }

    #[test]
    fn ignores_non_integer_message_id() {
        let update = json!({
            "channel_post": {
                "message_id": "42",
                "chat": {"id": -100123},
                "photo": [{"file_id": "f1"}]
            }
        });

        assert!(parse_update(&update, &allowed()).is_none());
    }

    #[test]
    fn ignores_chat_id_of_wrong_type() {
        let update = json!({
            "channel_post": {
                "message_id": 1,
                "chat": {"id": true},
                "photo": [{"file_id": "f1"}]
            }
        });

        assert!(parse_update(&update, &allowed()).is_none());
    }

    #[test]
    fn ignores_regular_messages() {
        let update = json!({
            "message": {
                "message_id": 1,
                "chat": {"id": -100123},
                "photo": [{"file_id": "f1"}]
            }
        });

        assert!(parse_update(&update, &allowed()).is_none());
    }

    #[test]
    fn update_id_is_optional() {
        assert_eq!(update_id(&json!({"update_id": 1001})), Some(1001));
        assert_eq!(update_id(&json!({})), None);
        assert_eq!(update_id(&json!(null)), None);
    }
}
