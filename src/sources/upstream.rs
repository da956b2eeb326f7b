//! Shared response handling for outbound HTTP calls.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{snippet, UpstreamError};

/// Read a response body and decode it as JSON.
///
/// Non-2xx statuses become [`UpstreamError::Status`] with the upstream's own
/// error message when one can be found. Bodies that do not decode become
/// [`UpstreamError::Malformed`] carrying the status and a body snippet.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T, UpstreamError> {
    let (status, body) = read_body(service, response).await?;
    parse_body(service, status, &body)
}

pub(crate) async fn read_body(
    service: &'static str,
    response: Response,
) -> Result<(StatusCode, String), UpstreamError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| UpstreamError::Transport {
            service,
            source: source.without_url(),
        })?;
    Ok((status, body))
}

pub(crate) fn parse_body<T: DeserializeOwned>(
    service: &'static str,
    status: StatusCode,
    body: &str,
) -> Result<T, UpstreamError> {
    if !status.is_success() {
        return Err(UpstreamError::Status {
            service,
            status: status.as_u16(),
            message: error_message(body),
        });
    }
    serde_json::from_str(body).map_err(|_| UpstreamError::Malformed {
        service,
        status: status.as_u16(),
        snippet: snippet(body),
    })
}

/// Fail on non-2xx without decoding the body. Used for writes.
pub(crate) async fn expect_success(
    service: &'static str,
    response: Response,
) -> Result<(), UpstreamError> {
    let (status, body) = read_body(service, response).await?;
    if status.is_success() {
        Ok(())
    } else {
        Err(UpstreamError::Status {
            service,
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

/// Pull a readable message out of the error shapes used by Google, Meta and
/// PostgREST; fall back to a snippet of the raw body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return snippet(body);
    };
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .or_else(|| value.get("error").filter(|e| e.is_string()))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| snippet(body))
}

/// Serde helpers for numeric fields that upstreams send either as JSON
/// numbers or as numeric strings (Graph API counters, int64 fields in the
/// Google Ads JSON mapping, PostgREST `numeric` columns).
pub(crate) mod flexible {
    use serde::de::{self, Deserializer};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    fn parse<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(0.0),
            Some(Raw::Number(v)) => Ok(v),
            Some(Raw::Text(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    Ok(0.0)
                } else {
                    s.parse::<f64>().map_err(de::Error::custom)
                }
            }
        }
    }

    pub fn f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        parse(deserializer)
    }

    pub fn u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        parse(deserializer).map(|v| v.max(0.0).round() as u64)
    }

    pub fn i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        parse(deserializer).map(|v| v.round() as i64)
    }

    /// Ids arrive as integers (serial keys) or strings (uuids).
    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(v) => v.to_string(),
            RawId::Text(s) => s,
        })
    }
}
