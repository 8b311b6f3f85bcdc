// petalcart/src/dev_assets.rs

//! Everything outside `/api`: the frontend bundle.
//!
//! In development, requests are proxied to the bundler's dev server. When that
//! fails, and always in production, `index.html` is served from the static
//! directory with a cache-busting query on the main script so browsers pick
//! up fresh code. Production also serves any other file under that directory.

use crate::errors::{AppError, Result};
use crate::state::AppState;
use actix_web::http::{header, Method, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument, warn};

const MAIN_SCRIPT_PREFIX: &str = "/src/main.";
const MAIN_SCRIPT_EXTENSIONS: [&str; 4] = ["tsx", "ts", "jsx", "js"];

/// Appends `?v=<token>` to every main-script reference, replacing any query
/// already there.
pub fn inject_cache_buster(html: &str, token: &str) -> String {
  let mut out = String::with_capacity(html.len() + 32);
  let mut rest = html;
  while let Some(pos) = rest.find(MAIN_SCRIPT_PREFIX) {
    let ext_start = pos + MAIN_SCRIPT_PREFIX.len();
    let ext_len = rest[ext_start..]
      .find(|c: char| !c.is_ascii_alphanumeric())
      .unwrap_or(rest.len() - ext_start);
    let path_end = ext_start + ext_len;
    out.push_str(&rest[..path_end]);

    let ext = &rest[ext_start..path_end];
    let tail = &rest[path_end..];
    if MAIN_SCRIPT_EXTENSIONS.iter().any(|known| *known == ext) {
      let query_len = if tail.starts_with('?') {
        tail
          .find(|c: char| matches!(c, '"' | '\'' | '#' | '>') || c.is_whitespace())
          .unwrap_or(tail.len())
      } else {
        0
      };
      out.push_str("?v=");
      out.push_str(token);
      rest = &tail[query_len..];
    } else {
      rest = tail;
    }
  }
  out.push_str(rest);
  out
}

/// Current Unix time in milliseconds.
pub fn cache_buster_token() -> String {
  chrono::Utc::now().timestamp_millis().to_string()
}

/// Maps a request path onto a file below `root`, refusing anything that
/// would climb out of it.
pub fn resolve_static_path(root: &Path, request_path: &str) -> Option<PathBuf> {
  let relative = Path::new(request_path.trim_start_matches('/'));
  let mut resolved = root.to_path_buf();
  let mut pushed = false;
  for component in relative.components() {
    match component {
      Component::Normal(part) => {
        resolved.push(part);
        pushed = true;
      }
      Component::CurDir => {}
      Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
    }
  }
  pushed.then_some(resolved)
}

#[instrument(name = "dev_assets::serve_index", skip_all, fields(dir = %static_dir.display()))]
pub async fn serve_index(static_dir: &Path) -> Result<HttpResponse> {
  let index_path = static_dir.join("index.html");
  let html = match tokio::fs::read_to_string(&index_path).await {
    Ok(html) => html,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      return Err(AppError::NotFound(format!("{} does not exist", index_path.display())));
    }
    Err(e) => return Err(AppError::Io(e)),
  };
  let body = inject_cache_buster(&html, &cache_buster_token());
  Ok(
    HttpResponse::Ok()
      .content_type("text/html; charset=utf-8")
      .insert_header((header::CACHE_CONTROL, "no-cache"))
      .body(body),
  )
}

async fn serve_static_file(path: &Path) -> Result<Option<HttpResponse>> {
  match tokio::fs::metadata(path).await {
    Ok(meta) if meta.is_file() => {}
    _ => return Ok(None),
  }
  let bytes = tokio::fs::read(path).await?;
  let mime = mime_guess::from_path(path).first_or_octet_stream();
  Ok(Some(HttpResponse::Ok().content_type(mime.essence_str()).body(bytes)))
}

/// Request headers passed through to the dev server.
const FORWARDED_REQUEST_HEADERS: &[&str] = &[
  "accept",
  "accept-language",
  "cache-control",
  "if-modified-since",
  "if-none-match",
  "range",
  "user-agent",
];
/// Dev server response headers copied back to the browser.
const FORWARDED_RESPONSE_HEADERS: &[&str] = &["cache-control", "content-type", "etag", "last-modified"];

fn forwarded_request_headers(req: &HttpRequest) -> reqwest::header::HeaderMap {
  let mut out = reqwest::header::HeaderMap::new();
  for (name, value) in req.headers().iter() {
    if !FORWARDED_REQUEST_HEADERS.iter().any(|known| *known == name.as_str()) {
      continue;
    }
    // actix and reqwest ship different `http` versions; convert via bytes.
    if let (Ok(name), Ok(value)) = (
      reqwest::header::HeaderName::from_bytes(name.as_str().as_bytes()),
      reqwest::header::HeaderValue::from_bytes(value.as_bytes()),
    ) {
      out.append(name, value);
    }
  }
  out
}

#[instrument(name = "dev_assets::proxy", skip_all, fields(target, method = %req.method()))]
async fn proxy_to_dev_server(state: &AppState, req: &HttpRequest) -> Result<HttpResponse> {
  let path_and_query = req.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
  let target = format!("{}{}", state.config.vite_dev_url, path_and_query);
  tracing::Span::current().record("target", target.as_str());

  let outgoing = if req.method() == Method::HEAD {
    state.http.head(&target)
  } else {
    state.http.get(&target)
  };
  let resp = outgoing.headers(forwarded_request_headers(req)).send().await?;
  let status = StatusCode::from_u16(resp.status().as_u16())
    .map_err(|e| AppError::Internal(format!("Dev server returned an invalid status: {}", e)))?;

  let mut builder = HttpResponse::build(status);
  for name in FORWARDED_RESPONSE_HEADERS {
    if let Some(value) = resp.headers().get(*name) {
      if let Ok(value) = header::HeaderValue::from_bytes(value.as_bytes()) {
        builder.insert_header((*name, value));
      }
    }
  }
  let body = resp.bytes().await?;
  debug!(%status, "Proxied dev server response.");
  Ok(builder.body(body))
}

/// Default service for every request no API route matched.
pub async fn frontend_fallback(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
  let path = req.path();
  if path == "/api" || path.starts_with("/api/") {
    return Err(AppError::NotFound(format!("No API route for {} {}", req.method(), path)));
  }
  if req.method() != Method::GET && req.method() != Method::HEAD {
    return Err(AppError::NotFound(format!("No route for {} {}", req.method(), path)));
  }

  let static_dir = state.config.static_dir.clone();
  if state.config.is_development() {
    match proxy_to_dev_server(&state, &req).await {
      Ok(resp) => return Ok(resp),
      Err(e) => warn!(error = %e, "Dev server unreachable; serving index.html."),
    }
  } else if let Some(file) = resolve_static_path(&static_dir, path) {
    if let Some(resp) = serve_static_file(&file).await? {
      return Ok(resp);
    }
  }
  serve_index(&static_dir).await
}
