pub mod account;
pub mod ai;
pub mod auth;
pub mod buy;
pub mod cart;
pub mod catalog;
pub mod market;
pub mod search;
pub mod watch;

use crate::api::ApiClient;
use crate::error::{ErrorKind, TmError};
use crate::format::{self, Column};
use crate::pipeline::Shape;
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

/// Envelope keys that list payloads hide behind, tried in order. The server
/// is not consistent about returning bare arrays versus wrapped ones.
const ENVELOPE_KEYS: &[&str] = &[
    "results",
    "products",
    "items",
    "data",
    "sellers",
    "orders",
    "reviews",
    "models",
    "rules",
    "logs",
    "proposals",
    "vacancies",
    "library",
    "webhooks",
    "aliases",
    "subscriptions",
    "rewards",
    "requests",
    "applications",
];

pub fn try_extract_list(payload: &Value) -> Option<Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items.clone()),
        Value::Object(map) => ENVELOPE_KEYS.iter().find_map(|key| match map.get(*key) {
            Some(Value::Array(items)) => Some(items.clone()),
            _ => None,
        }),
        _ => None,
    }
}

pub fn extract_list(payload: &Value) -> Vec<Value> {
    try_extract_list(payload).unwrap_or_default()
}

/// Apply shaping and print either the row count or the rendered table.
pub fn print_list(items: Vec<Value>, columns: &[Column], shape: &Shape) {
    let shaped = shape.apply(items);
    if shape.count {
        println!("{}", shaped.len());
    } else {
        println!("{}", format::render_table(&shaped, columns));
    }
}

/// Resolve a product reference by id first, then by slug.
pub async fn resolve_product(client: &ApiClient, reference: &str) -> Result<Value, TmError> {
    match client.get(&format!("/products/{reference}")).await {
        Ok(product) => Ok(product),
        Err(err) if worth_slug_lookup(&err) => {
            match client.get(&format!("/products/slug/{reference}")).await {
                Ok(product) => Ok(product),
                Err(slug_err) if worth_slug_lookup(&slug_err) => {
                    Err(TmError::NotFound(format!("Product '{reference}'")))
                }
                Err(slug_err) => Err(slug_err),
            }
        }
        Err(err) => Err(err),
    }
}

// Slugs sent down the id route come back as 404, or 400 when the server
// insists on a numeric id.
fn worth_slug_lookup(err: &TmError) -> bool {
    err.kind() == ErrorKind::NotFound || err.status() == Some(400)
}

/// Resolve a product reference and hand back its path id with the record.
pub async fn resolve_product_id(
    client: &ApiClient,
    reference: &str,
) -> Result<(String, Value), TmError> {
    let product = resolve_product(client, reference).await?;
    match id_of(&product) {
        Some(id) => Ok((id, product)),
        None => Err(TmError::NotFound(format!("Product '{reference}'"))),
    }
}

/// Server-assigned id of a record, as path-segment text.
pub fn id_of(item: &Value) -> Option<String> {
    match item.get("id") {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Append the non-empty query parameters to a path.
pub fn with_query(path: &str, params: &[(&str, Option<String>)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in params {
        if let Some(value) = value {
            serializer.append_pair(key, value);
            any = true;
        }
    }
    if any {
        format!("{path}?{}", serializer.finish())
    } else {
        path.to_string()
    }
}

/// Shorten RFC 3339 timestamp fields in place for table display.
pub fn shorten_timestamps(items: &mut [Value], keys: &[&str]) {
    for item in items {
        for key in keys {
            let shortened = match item.get(*key) {
                Some(Value::String(raw)) => Some(format::fmt_timestamp(raw)),
                _ => None,
            };
            if let Some(text) = shortened {
                item[*key] = Value::String(text);
            }
        }
    }
}

/// First non-empty field among several candidate spellings, rendered as
/// cell text.
pub fn first_field(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let cell = format::value_to_cell(payload.get(*key).unwrap_or(&Value::Null));
        if cell.is_empty() { None } else { Some(cell) }
    })
}

/// First checkout-style URL present on a record.
pub fn checkout_url(payload: &Value) -> Option<String> {
    for key in ["checkoutUrl", "url", "purchaseUrl"] {
        if let Some(url) = payload.get(key).and_then(Value::as_str) {
            if !url.is_empty() {
                return Some(url.to_string());
            }
        }
    }
    None
}

/// Launch the system browser for a checkout page. Suppressed by the
/// command's flag or the TM_NO_BROWSER environment variable; the URL is
/// always printed by the caller, so failing to launch is not an error.
pub fn open_in_browser(url: &str, suppress: bool) {
    if suppress || std::env::var_os("TM_NO_BROWSER").is_some() {
        return;
    }
    if let Err(err) = spawn_browser(url) {
        debug!("could not launch a browser for {url}: {err}");
    }
}

#[cfg(target_os = "macos")]
fn spawn_browser(url: &str) -> std::io::Result<()> {
    use std::process::{Command, Stdio};
    Command::new("open")
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

#[cfg(target_os = "linux")]
fn spawn_browser(url: &str) -> std::io::Result<()> {
    use std::process::{Command, Stdio};
    Command::new("xdg-open")
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

#[cfg(target_os = "windows")]
fn spawn_browser(url: &str) -> std::io::Result<()> {
    use std::process::{Command, Stdio};
    Command::new("cmd")
        .args(["/C", "start", url])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn spawn_browser(_url: &str) -> std::io::Result<()> {
    Ok(())
}
