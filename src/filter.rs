use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::config::LogOptions;
use crate::payload::{header, Filterable};

pub const REDACTED: &str = "[REDACTED]";

const CONTENT_TYPE: &str = "content-type";
const JSON_MIME: &str = "application/json";
const FORM_MIME: &str = "application/x-www-form-urlencoded";

#[derive(Debug, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Opaque,
}

/// Applies the allow/deny policy to one side of an exchange, rewriting its
/// body and headers. A non-empty allowlist always wins over the denylist.
pub fn filter_data<T: Filterable>(data: &mut T, options: &LogOptions) {
    let use_allowlist = !options.allowlist.is_empty();
    let list = if use_allowlist {
        &options.allowlist
    } else {
        &options.denylist
    };
    if list.is_empty() {
        return;
    }

    if let Some(original) = data.body().map(str::to_owned) {
        let kind = classify(header(data.headers(), CONTENT_TYPE), &original);
        match kind {
            BodyKind::Json => match serde_json::from_str::<Value>(&original) {
                Ok(Value::Object(fields)) => {
                    let filtered = if use_allowlist {
                        json_allowlist(fields, list)
                    } else {
                        json_denylist(fields, list)
                    };
                    data.set_body(Some(Value::Object(filtered).to_string()));
                }
                // Top-level arrays and scalars have no named fields to
                // filter; malformed JSON must not fail the host pipeline.
                Ok(_) => {}
                Err(e) => {
                    log::warn!("body labeled as JSON could not be parsed, leaving it untouched: {}", e);
                }
            },
            BodyKind::Form => {
                let filtered = if use_allowlist {
                    form_allowlist(&original, list)
                } else {
                    form_denylist(&original, list)
                };
                data.set_body(Some(filtered));
            }
            BodyKind::Opaque => {}
        }
    }

    filter_headers(data.headers_mut(), list, use_allowlist);
    restamp_content_type(data);
}

/// Headers are matched case-insensitively; `content-type` survives either
/// policy so the body stays interpretable downstream.
fn filter_headers(
    headers: &mut std::collections::HashMap<String, String>,
    list: &HashSet<String>,
    use_allowlist: bool,
) {
    headers.retain(|name, _| {
        let name = name.to_lowercase();
        if name == CONTENT_TYPE {
            return true;
        }
        if use_allowlist {
            list.contains(&name)
        } else {
            !list.contains(&name)
        }
    });
}

fn classify(content_type: Option<&str>, body: &str) -> BodyKind {
    match content_type {
        Some(label) => {
            // Parameters after ';' are not part of the media type.
            let mime = label.split(';').next().unwrap_or_default().trim().to_lowercase();
            if mime == JSON_MIME {
                BodyKind::Json
            } else if mime == FORM_MIME {
                BodyKind::Form
            } else {
                BodyKind::Opaque
            }
        }
        None => sniff(body),
    }
}

fn sniff(body: &str) -> BodyKind {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return BodyKind::Json;
    }
    if !body.is_empty() && body.split('&').all(|pair| pair.contains('=')) {
        return BodyKind::Form;
    }
    BodyKind::Opaque
}

fn json_allowlist(fields: Map<String, Value>, allowlist: &HashSet<String>) -> Map<String, Value> {
    fields
        .into_iter()
        .filter(|(name, _)| allowlist.contains(name))
        .collect()
}

fn json_denylist(mut fields: Map<String, Value>, denylist: &HashSet<String>) -> Map<String, Value> {
    for (name, value) in fields.iter_mut() {
        if denylist.contains(name) {
            *value = Value::String(REDACTED.to_string());
        }
    }
    fields
}

fn form_allowlist(body: &str, allowlist: &HashSet<String>) -> String {
    body.split('&')
        .filter(|pair| match pair.split_once('=') {
            Some((key, _)) => allowlist.contains(key),
            None => false,
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn form_denylist(body: &str, denylist: &HashSet<String>) -> String {
    body.split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if denylist.contains(key) => format!("{}={}", key, REDACTED),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Re-labels the body if filtering (or the capture layer) left it without a
/// content type but its shape is still recognizable.
fn restamp_content_type<T: Filterable>(data: &mut T) {
    if header(data.headers(), CONTENT_TYPE).is_some() {
        return;
    }
    let mime = match data.body() {
        Some(body) => match sniff(body) {
            BodyKind::Json if serde_json::from_str::<Value>(body).is_ok() => JSON_MIME,
            BodyKind::Form => FORM_MIME,
            _ => return,
        },
        None => return,
    };
    data.headers_mut().insert(CONTENT_TYPE.to_string(), mime.to_string());
}
