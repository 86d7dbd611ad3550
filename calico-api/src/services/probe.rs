//! Metadata endpoint probe
//!
//! Diagnostic used by `calico-api probe <url>` to check whether a candidate
//! URL serves usable track metadata before wiring it into the config.

use serde_json::Value;
use std::time::Duration;

use super::metadata_client::MetadataError;

/// Field-name fragments worth reporting, per category
pub const PROBE_CATEGORIES: [(&str, &[&str]); 4] = [
    ("title", &["title", "song", "track"]),
    ("artist", &["artist", "performer"]),
    ("album", &["album"]),
    ("art", &["art", "artwork", "cover", "image", "img"]),
];

/// What came back from a probed endpoint
#[derive(Debug)]
pub struct ProbeReport {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: ProbeBody,
}

#[derive(Debug)]
pub enum ProbeBody {
    Json(Value),
    /// Non-JSON body, truncated
    Text(String),
}

impl ProbeReport {
    /// Matches per category as (json path, value) pairs; empty unless the body is JSON
    pub fn findings(&self) -> Vec<(&'static str, Vec<(String, Value)>)> {
        let ProbeBody::Json(value) = &self.body else {
            return Vec::new();
        };

        PROBE_CATEGORIES
            .iter()
            .map(|(category, needles)| (*category, find_keys(value, needles)))
            .filter(|(_, matches)| !matches.is_empty())
            .collect()
    }
}

/// Fetch `url` once and capture status, content type and body
pub async fn probe_endpoint(url: &str, timeout: Duration) -> Result<ProbeReport, MetadataError> {
    let response = reqwest::Client::new()
        .get(url)
        .timeout(timeout)
        .send()
        .await?;

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let text = response.text().await?;

    let body = match serde_json::from_str::<Value>(&text) {
        Ok(value) => ProbeBody::Json(value),
        Err(_) => ProbeBody::Text(text.chars().take(500).collect()),
    };

    Ok(ProbeReport {
        status,
        content_type,
        body,
    })
}

/// Recursively collect entries whose key contains any needle (case-insensitive)
pub fn find_keys(value: &Value, needles: &[&str]) -> Vec<(String, Value)> {
    let mut found = Vec::new();
    walk(value, needles, String::new(), &mut found);
    found
}

fn walk(value: &Value, needles: &[&str], path: String, found: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(object) => {
            for (key, child) in object {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                let lowered = key.to_lowercase();
                if needles.iter().any(|n| lowered.contains(&n.to_lowercase())) {
                    found.push((child_path.clone(), child.clone()));
                }
                if child.is_object() || child.is_array() {
                    walk(child, needles, child_path, found);
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk(item, needles, format!("{}[{}]", path, i), found);
            }
        }
        _ => {}
    }
}
