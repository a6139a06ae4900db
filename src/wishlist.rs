use reqwest::Url;

use crate::user_models::UserRecord;

/// Parses `link` as an absolute `http`/`https` URL. Whitespace and control
/// characters are refused outright, since the URL parser would silently drop
/// some of them.
pub fn parse_link(link: &str) -> Option<Url> {
    if link.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return None;
    }

    let url = Url::parse(link).ok()?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Some(url),
        _ => None,
    }
}

/// Sets `link` for `emotion` on `platform`, replacing any previous link.
/// An empty value or a link that is not an http(s) URL makes this a no-op.
/// Returns whether the record changed.
pub fn add_link(record: &mut UserRecord, emotion: &str, platform: &str, link: &str) -> bool {
    if emotion.is_empty() || platform.is_empty() || parse_link(link).is_none() {
        return false;
    }

    record
        .wishlist
        .entry(emotion.to_string())
        .or_default()
        .insert(platform.to_string(), link.to_string());
    true
}

pub fn resolve_link<'a>(record: &'a UserRecord, emotion: &str, platform: &str) -> Option<&'a str> {
    record
        .wishlist
        .get(emotion)
        .and_then(|links| links.get(platform))
        .map(String::as_str)
}
