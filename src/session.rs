use axum::http::HeaderMap;

/// Header carrying the caller's participant name.
pub const USER: &str = "user";

/// The caller's declared name, if the header is present, valid utf-8 and non-empty.
pub fn user(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER)?
        .to_str()
        .ok()
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}
