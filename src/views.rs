//! Plain HTML pages for every endpoint. User-supplied text is always escaped.

use crate::user_models::{HistoryEntry, Wishlist};
use crate::wishlist::parse_link;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// First letter upper-cased, the rest lower-cased.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title} - MoodTune</title></head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape(title),
        body = body,
    )
}

/// Clickable only when the link is an http(s) URL; anything else is shown as
/// plain text.
fn link_cell(link: &str) -> String {
    match parse_link(link) {
        Some(_) => format!("<a href=\"{0}\">{0}</a>", escape(link)),
        None => escape(link),
    }
}

fn error_block(error: Option<&str>) -> String {
    error
        .map(|e| format!("<p class=\"error\">{}</p>\n", escape(e)))
        .unwrap_or_default()
}

pub fn message_page(message: &str) -> String {
    layout("Notice", &format!("<p>{}</p>\n<p><a href=\"/\">Home</a></p>", escape(message)))
}

pub fn index_page() -> String {
    layout(
        "Welcome",
        "<h1>MoodTune</h1>\n<p>Music that matches your mood.</p>\n\
         <p><a href=\"/login\">Log in</a> or <a href=\"/register\">register</a>.</p>",
    )
}

pub fn register_page() -> String {
    layout(
        "Register",
        "<h1>Register</h1>\n<form method=\"post\" action=\"/register\">\n\
         <input name=\"username\" placeholder=\"Username\" required>\n\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\n\
         <button type=\"submit\">Register</button>\n</form>\n\
         <p><a href=\"/login\">Already registered?</a></p>",
    )
}

pub fn login_page(error: Option<&str>) -> String {
    layout(
        "Login",
        &format!(
            "<h1>Login</h1>\n{}<form method=\"post\" action=\"/login\">\n\
             <input name=\"username\" placeholder=\"Username\" required>\n\
             <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\n\
             <button type=\"submit\">Log in</button>\n</form>\n\
             <p><a href=\"/register\">Create an account</a></p>",
            error_block(error)
        ),
    )
}

pub fn dashboard_page(username: &str, wishlist: &Wishlist) -> String {
    let mut rows = String::new();
    for (emotion, links) in wishlist {
        for (platform, link) in links {
            rows.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape(emotion),
                escape(platform),
                link_cell(link),
            ));
        }
    }
    let table = if rows.is_empty() {
        "<p>Your wishlist is empty.</p>\n".to_string()
    } else {
        format!("<table>\n<tr><th>Emotion</th><th>Platform</th><th>Link</th></tr>\n{rows}</table>\n")
    };

    layout(
        "Dashboard",
        &format!(
            "<h1>Welcome, {}</h1>\n<h2>Your wishlist</h2>\n{table}\
             <form method=\"post\" action=\"/dashboard\">\n\
             <input name=\"emotion\" placeholder=\"Emotion (e.g. happy)\" required>\n\
             <select name=\"platform\"><option value=\"youtube\">YouTube</option>\
             <option value=\"spotify\">Spotify</option></select>\n\
             <input name=\"link\" placeholder=\"Link\" required>\n\
             <button type=\"submit\">Save link</button>\n</form>\n\
             <p><a href=\"/detect\">Detect my mood</a> | <a href=\"/history\">History</a> | \
             <a href=\"/change-password\">Change password</a> | <a href=\"/logout\">Log out</a></p>",
            escape(username)
        ),
    )
}

pub fn detect_page() -> String {
    layout(
        "Detect",
        "<h1>Detect your mood</h1>\n\
         <form method=\"post\" action=\"/detect\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"image\" accept=\"image/*\" required>\n\
         <select name=\"platform\"><option value=\"youtube\">YouTube</option>\
         <option value=\"spotify\">Spotify</option></select>\n\
         <button type=\"submit\">Detect</button>\n</form>\n\
         <p><a href=\"/dashboard\">Back</a></p>",
    )
}

pub fn no_link_page(emotion: &str, platform: &str) -> String {
    layout(
        "Detected",
        &format!(
            "<h2>Emotion: {}</h2>\n<p>No {} link found in your wishlist.</p>\n\
             <p><a href=\"/dashboard\">Add one in Dashboard</a></p>",
            escape(&capitalize(emotion)),
            escape(&capitalize(platform)),
        ),
    )
}

pub fn change_password_page() -> String {
    layout(
        "Change password",
        "<h1>Change password</h1>\n<form method=\"post\" action=\"/change-password\">\n\
         <input name=\"current\" type=\"password\" placeholder=\"Current password\" required>\n\
         <input name=\"new\" type=\"password\" placeholder=\"New password\" required>\n\
         <button type=\"submit\">Change</button>\n</form>\n\
         <p><a href=\"/dashboard\">Back</a></p>",
    )
}

pub fn password_changed_page() -> String {
    layout(
        "Password changed",
        "<p>Password changed successfully.</p><a href=\"/dashboard\">Back</a>",
    )
}

pub fn history_page(history: &[HistoryEntry]) -> String {
    let body = if history.is_empty() {
        "<p>No detections yet.</p>\n".to_string()
    } else {
        let rows: String = history
            .iter()
            .map(|entry| {
                let link = if entry.link.is_empty() {
                    "-".to_string()
                } else {
                    link_cell(&entry.link)
                };
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                    escape(&entry.timestamp),
                    escape(&entry.emotion),
                    escape(&entry.platform),
                    link
                )
            })
            .collect();
        format!(
            "<table>\n<tr><th>Time</th><th>Emotion</th><th>Platform</th><th>Link</th></tr>\n{rows}</table>\n"
        )
    };

    layout(
        "History",
        &format!("<h1>History</h1>\n{body}<p><a href=\"/dashboard\">Back</a></p>"),
    )
}
