/// Text posted back into the channel once an image is hosted.
///
/// Without a template the bare URL is sent. Every `{url}` in the template is
/// substituted; a template without the placeholder gets the URL appended.
pub fn render_reply_text(url: &str, template: Option<&str>) -> String {
    match template {
        None | Some("") => url.to_string(),
        Some(template) if template.contains("{url}") => template.replace("{url}", url),
        Some(template) => format!("{template} {url}").trim().to_string(),
    }
}
