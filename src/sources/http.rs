// sources/http.rs
use crate::sources::{FetchError, RawListing};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Error bodies can be whole HTML pages.
const MAX_ERROR_BODY: usize = 300;

pub fn build_client() -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| FetchError::Network(e.to_string()))
}

/// Headers every RapidAPI-hosted backend expects.
pub fn rapidapi_headers(key: &str, host: &str) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    for (name, value) in [("x-rapidapi-key", key), ("x-rapidapi-host", host)] {
        let value = HeaderValue::from_str(value)
            .map_err(|e| FetchError::Config(format!("{name} is not a valid header value: {e}")))?;
        headers.insert(HeaderName::from_static(name), value);
    }
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// GET returning the body as text; non-2xx becomes `FetchError::Status`.
pub fn get_text(
    client: &Client,
    url: &str,
    headers: &HeaderMap,
    query: &[(&str, String)],
) -> Result<String, FetchError> {
    let resp = client
        .get(url)
        .headers(headers.clone())
        .query(query)
        .send()?;

    let status = resp.status();
    debug!(url, status = status.as_u16(), "HTTP response");

    let body = resp.text()?;
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            body: error_detail(&body),
        });
    }
    Ok(body)
}

pub fn get_json(
    client: &Client,
    url: &str,
    headers: &HeaderMap,
    query: &[(&str, String)],
) -> Result<Value, FetchError> {
    let body = get_text(client, url, headers, query)?;
    serde_json::from_str(&body).map_err(|e| FetchError::JsonParse(e.to_string()))
}

/// Pulls the listing array out of a response body.
/// A missing or null collection means there is nothing (more) to read.
pub fn results_at(body: &Value, pointer: &str) -> Result<Vec<RawListing>, FetchError> {
    match body.pointer(pointer) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().cloned().map(RawListing::from).collect()),
        Some(other) => Err(FetchError::UnexpectedShape(format!(
            "expected an array at {pointer}, found {}",
            kind_of(other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// RapidAPI gateway rejections ("You are not subscribed to this API.").
#[derive(Debug, Deserialize)]
struct GatewayMessage {
    message: String,
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<GatewayMessage>(body) {
        Ok(gateway) => truncate(&gateway.message),
        Err(_) => truncate(body),
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
