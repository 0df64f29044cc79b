//! Session cookie plumbing for the edge interceptor.
//!
//! The session cookie is the one piece of mutable shared state crossing
//! the network boundary. Only this module writes it: rotation from the
//! provider is copied onto the in-flight request (so same-request reads
//! observe it) and onto the outgoing response.

use axum::http::{header, HeaderMap, HeaderValue};
use identity::SessionCookie;

/// Read a single cookie value from the request headers.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|part| {
        let mut parts = part.trim().splitn(2, '=');
        if parts.next()? == name {
            Some(parts.next().unwrap_or("").to_string())
        } else {
            None
        }
    })
}

/// HttpOnly session cookie scoped to path / with SameSite=Lax
fn set_cookie_value(cookie: &SessionCookie) -> anyhow::Result<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/",
        cookie.name, cookie.value
    ))
    .map_err(Into::into)
}

/// Rewrite the request's Cookie header with the rotated values so that
/// anything reading the session later in this same request sees the new
/// tokens, not the ones the browser sent.
pub fn apply_rotation_to_request(
    headers: &mut HeaderMap,
    rotated: &[SessionCookie],
) -> anyhow::Result<()> {
    if rotated.is_empty() {
        return Ok(());
    }

    let mut pairs: Vec<(String, String)> = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|raw| {
            raw.split(';')
                .filter_map(|part| {
                    let mut parts = part.trim().splitn(2, '=');
                    let name = parts.next()?.to_string();
                    if name.is_empty() {
                        return None;
                    }
                    Some((name, parts.next().unwrap_or("").to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    for cookie in rotated {
        match pairs.iter_mut().find(|(name, _)| *name == cookie.name) {
            Some(pair) => pair.1 = cookie.value.clone(),
            None => pairs.push((cookie.name.clone(), cookie.value.clone())),
        }
    }

    let joined = pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ");
    headers.insert(header::COOKIE, HeaderValue::from_str(&joined)?);
    Ok(())
}

/// Append Set-Cookie headers for every rotated cookie to the response.
pub fn append_set_cookies(
    headers: &mut HeaderMap,
    rotated: &[SessionCookie],
) -> anyhow::Result<()> {
    for cookie in rotated {
        headers.append(header::SET_COOKIE, set_cookie_value(cookie)?);
    }
    Ok(())
}
