//! Outbound proxy response and the JSON envelopes it carries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const CORS_HEADER: &str = "Access-Control-Allow-Origin";

/// Message of the default (unrouted) response.
pub const NOT_SUPPORTED_MESSAGE: &str = "Request not supported";

/// Response returned to the hosting platform.
///
/// `body` is always a serialized JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

impl ProxyResponse {
    fn with_body(status_code: u16, body: &Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CORS_HEADER.to_string(), "*".to_string());

        Self {
            status_code,
            body: body.to_string(),
            headers,
        }
    }

    /// `{status: "success", message: "", data}` with status 200.
    pub fn success(data: Value) -> Self {
        Self::with_body(
            200,
            &json!({
                "status": "success",
                "message": "",
                "data": data,
            }),
        )
    }

    /// `{status: "error", type, message}`.
    pub fn error(status_code: u16, message: &str, error_type: &str) -> Self {
        Self::with_body(
            status_code,
            &json!({
                "status": "error",
                "type": error_type,
                "message": message,
            }),
        )
    }

    /// `{Error, Reference}` with status 500, for failures outside any handler.
    pub fn exception(message: &str, reference: &str) -> Self {
        Self::with_body(
            500,
            &json!({
                "Error": message,
                "Reference": reference,
            }),
        )
    }

    /// Parse the body back into JSON.
    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

impl Default for ProxyResponse {
    fn default() -> Self {
        Self::error(404, NOT_SUPPORTED_MESSAGE, "")
    }
}
