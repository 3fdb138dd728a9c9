//! HTTP response handlers.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::embed::{HotreloadVars, hotreload_tag};
use crate::utils::mime::{self, types};

/// Respond with a static file, injecting the reload client into HTML.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let body = maybe_inject_hotreload(body, content_type);

    send_body(request, 200, content_type, body)
}

/// Respond with 404.
pub fn respond_not_found(request: Request) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 404, types::PLAIN);
    }
    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, types::PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with the reload client from memory.
pub fn respond_hotreload_js(request: Request, vars: &HotreloadVars) -> Result<()> {
    send_body(request, 200, types::JAVASCRIPT, vars.render().into_bytes())
}

/// Inject the reload client tag before `</body>` of HTML documents
pub fn maybe_inject_hotreload(body: Vec<u8>, content_type: &str) -> Vec<u8> {
    if !mime::is_html(content_type) {
        return body;
    }

    let script = hotreload_tag();
    let script_bytes = script.as_bytes();

    // Byte pattern for </body>, matched case-insensitively
    const PATTERN: &[u8] = b"</body>";

    let pos = body
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        // No </body> found, append to end (browsers handle this gracefully)
        .unwrap_or(body.len());

    let mut result = Vec::with_capacity(body.len() + script_bytes.len());
    result.extend_from_slice(&body[..pos]);
    result.extend_from_slice(script_bytes);
    result.extend_from_slice(&body[pos..]);
    result
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?)
        .with_header(make_header("Cache-Control", "no-cache")?);
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?)
        .with_header(make_header("Cache-Control", "no-cache")?);
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header `{key}: {value}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_body_close() {
        let body = b"<html><body><p>x</p></BODY></html>".to_vec();
        let out = String::from_utf8(maybe_inject_hotreload(body, types::HTML)).unwrap();
        assert_eq!(
            out,
            format!("<html><body><p>x</p>{}</BODY></html>", hotreload_tag())
        );
    }

    #[test]
    fn test_inject_appends_without_body() {
        let out = maybe_inject_hotreload(b"<p>x</p>".to_vec(), types::HTML);
        assert!(String::from_utf8(out).unwrap().ends_with(&hotreload_tag()));
    }

    #[test]
    fn test_non_html_untouched() {
        let body = b"body{}</body>".to_vec();
        assert_eq!(maybe_inject_hotreload(body.clone(), types::CSS), body);
    }
}
