//! Content type and filename for the multipart upload.

use chrono::NaiveDateTime;

const FALLBACK_MIME: &str = "image/jpeg";
const FALLBACK_EXTENSION: &str = "jpg";

const EXTENSION_TO_MIME: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("avif", "image/avif"),
    ("svg", "image/svg+xml"),
];

/// Pick the MIME type declared for the uploaded part.
///
/// An `image/*` content type from the download wins. Otherwise the extension
/// of the provider-side path decides, and anything unknown is sent as JPEG.
pub fn pick_upload_mime_type(content_type: Option<&str>, source_path: Option<&str>) -> String {
    if let Some(mime) = content_type.and_then(normalize_mime_type) {
        if mime.starts_with("image/") {
            return mime;
        }
    }

    source_path
        .and_then(file_extension)
        .and_then(|ext| {
            EXTENSION_TO_MIME
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| (*mime).to_string())
        })
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

/// Filename extension matching an upload MIME type; `jpg` when unknown.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        _ => FALLBACK_EXTENSION,
    }
}

/// `YYYYMMDD_HHMMSS` in local time, without extension.
pub fn build_timestamp_filename(at: NaiveDateTime) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// `image/jpeg; charset=binary` -> `image/jpeg`
fn normalize_mime_type(content_type: &str) -> Option<String> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    (!mime.is_empty()).then_some(mime)
}

fn file_extension(path: &str) -> Option<String> {
    let path = path.split(['?', '#']).next()?;
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}
