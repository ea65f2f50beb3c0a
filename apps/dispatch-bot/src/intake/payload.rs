//! Decoding of relay events posted by the web form.
//!
//! The form submission arrives as `{"body": "<base64>"}`, where the decoded
//! body is an urlencoded query string.

use base64::Engine;
use dispatch_db::models::order::OrderDraft;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Deserialize)]
pub struct RelayEvent {
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawForm {
    #[serde(rename = "Source", default)]
    source: String,
    #[serde(rename = "Destination", default)]
    destination: String,
    #[serde(rename = "Time", default)]
    time: String,
    #[serde(rename = "Phone", default)]
    phone: String,
    #[serde(rename = "Name", default)]
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeRequest {
    Order(OrderDraft),
    DriverApplication { name: String, phone: String },
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("body is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("body is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("body is not a valid query string: {0}")]
    Query(#[from] serde_urlencoded::de::Error),
    #[error("order field `{0}` is empty")]
    MissingField(&'static str),
}

pub fn parse_payload(body: &str) -> Result<IntakeRequest, PayloadError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(body.trim())?;
    let query = String::from_utf8(bytes)?;
    let form: RawForm = serde_urlencoded::from_str(&query)?;

    if !form.name.is_empty() {
        return Ok(IntakeRequest::DriverApplication {
            name: form.name,
            phone: form.phone,
        });
    }

    for (key, value) in [
        ("Source", &form.source),
        ("Destination", &form.destination),
        ("Time", &form.time),
        ("Phone", &form.phone),
    ] {
        if value.trim().is_empty() {
            return Err(PayloadError::MissingField(key));
        }
    }

    Ok(IntakeRequest::Order(OrderDraft {
        source: form.source,
        destination: form.destination,
        time: form.time,
        phone: form.phone,
    }))
}

#[cfg(test)]
pub(crate) fn encode(query: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(query)
}
