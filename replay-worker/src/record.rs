use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::ParseError;

/// HTTP header fields the sensor exports on each transaction record. Only
/// these are carried onto the replayed request; anything else in the record
/// is ignored.
pub const RECOGNIZED_HEADERS: [&str; 11] = [
    "Content-Type",
    "Accept-Encoding",
    "Referer",
    "Cookie",
    "Origin",
    "Host",
    "Accept-Language",
    "Accept",
    "Accept-Charset",
    "Connection",
    "User-Agent",
];

/// The sensor's "field not applicable/observed" placeholder.
pub const SENTINEL: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Str,
    Num,
}

// Fields every record must carry, with the JSON type we expect for each.
const REQUIRED_FIELDS: [(&str, FieldKind); 6] = [
    ("host", FieldKind::Str),
    ("agentId", FieldKind::Str),
    ("t", FieldKind::Num),
    ("method", FieldKind::Str),
    ("resp_p", FieldKind::Str),
    ("uri", FieldKind::Str),
];

/// The outbound request reconstructed from one sensor record.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub method: String,
    pub host: String,
    pub agent_id: String,
    pub timestamp: i64,
    pub post_data: Option<String>,
}

/// Outcome of decoding one sensor record.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRecord {
    /// A replayable request was reconstructed.
    Request(RequestDescriptor),
    /// The responder port was the sentinel: the sensor observed no real
    /// connection and no URL can be derived. Not an error, but the record
    /// must never reach dedup or dispatch.
    NoConnection,
}

impl RequestDescriptor {
    /// Dedup identity: host + path of the reconstructed URL, dropping scheme,
    /// port and query string. Coarse on purpose, so each logical endpoint is
    /// replayed once rather than once per observed transaction.
    pub fn target_key(&self) -> Result<String, url::ParseError> {
        let parsed = url::Url::parse(&self.url)?;
        Ok(format!(
            "{}{}",
            parsed.host_str().unwrap_or(""),
            parsed.path()
        ))
    }
}

/// Decode one raw record from the sensor into a [`ParsedRecord`].
///
/// Every missing required field is collected before failing, so one error
/// names everything wrong with the record. Recognized headers are included
/// only when present and not the sentinel; the URL is rebuilt from the
/// responder port (scheme), the Host header (authority) and the request path.
pub fn parse_record(payload: &[u8]) -> Result<ParsedRecord, ParseError> {
    let data: Value = serde_json::from_slice(payload)?;
    let Some(data) = data.as_object() else {
        return Err(ParseError::NotAnObject);
    };

    validate_required_fields(data)?;

    let headers: HashMap<String, String> = RECOGNIZED_HEADERS
        .iter()
        .filter_map(|name| match data.get(*name).and_then(Value::as_str) {
            Some(value) if value != SENTINEL => Some((name.to_string(), value.to_string())),
            _ => None,
        })
        .collect();

    let scheme = match str_field(data, "resp_p") {
        "443" => "https://",
        SENTINEL => return Ok(ParsedRecord::NoConnection),
        _ => "http://",
    };

    // An absent Host header leaves the authority empty. The URL is malformed
    // then, and target-key derivation rejects it downstream.
    let authority = headers.get("Host").map(String::as_str).unwrap_or_default();
    let url = format!("{}{}{}", scheme, authority, str_field(data, "uri"));

    let post_data = match data.get("post_body").and_then(Value::as_str) {
        Some(body) if body != SENTINEL => Some(body.to_string()),
        _ => None,
    };

    Ok(ParsedRecord::Request(RequestDescriptor {
        url,
        headers,
        method: str_field(data, "method").to_string(),
        host: str_field(data, "host").to_string(),
        agent_id: str_field(data, "agentId").to_string(),
        timestamp: num_field(data, "t") as i64,
        post_data,
    }))
}

/// Check presence and JSON type of every required field, reporting all
/// missing fields at once, then all mismatched ones. Nothing is ever
/// silently defaulted.
fn validate_required_fields(data: &Map<String, Value>) -> Result<(), ParseError> {
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for (name, kind) in REQUIRED_FIELDS {
        match (data.get(name), kind) {
            (None, _) => missing.push(name),
            (Some(Value::String(_)), FieldKind::Str) => {}
            (Some(Value::Number(n)), FieldKind::Num) if n.as_f64().is_some() => {}
            (Some(_), _) => mismatched.push(name),
        }
    }

    if !missing.is_empty() {
        return Err(ParseError::MissingFields(missing));
    }
    if !mismatched.is_empty() {
        return Err(ParseError::TypeMismatch(mismatched));
    }
    Ok(())
}

// Accessors for fields validate_required_fields has already vetted.
fn str_field<'a>(data: &'a Map<String, Value>, name: &str) -> &'a str {
    data.get(name).and_then(Value::as_str).unwrap_or_default()
}

fn num_field(data: &Map<String, Value>, name: &str) -> f64 {
    data.get(name).and_then(Value::as_f64).unwrap_or_default()
}
