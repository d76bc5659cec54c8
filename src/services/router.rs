//! Request envelope routing for the line-oriented driver.
//!
//! Each request names a method and path the way an HTTP front end would;
//! the router maps it onto a [`LoyaltyService`] call and wraps the outcome
//! in a response envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, warn};

use super::loyalty::{LoyaltyService, CUSTOMERS_PATH, EARN_PATH, REDEEM_PATH};
use crate::error::{ErrorBody, ErrorKind, LoyaltyError};

const WALLET_PREFIX: &str = "/wallet/";
const TRANSACTIONS_PREFIX: &str = "/transactions/";

pub const ROUTE_NOT_FOUND: &str = "ROUTE_NOT_FOUND";
pub const MALFORMED_REQUEST: &str = "INVALID_REQUEST";

/// One inbound request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub idempotency_key: Option<String>,
    #[serde(default)]
    pub body: Value,
}

/// One outbound response: `{"ok": ..}` or `{"error": .., "message": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ok { ok: Value },
    Err(ErrorBody),
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }

    fn error(code: &'static str, message: impl Into<String>) -> Self {
        Response::Err(ErrorBody {
            error: code,
            message: message.into(),
        })
    }
}

impl From<LoyaltyError> for Response {
    fn from(e: LoyaltyError) -> Self {
        if e.kind() == ErrorKind::Internal {
            error!(error = %e, "Request failed");
        }
        Response::Err(e.to_body())
    }
}

fn respond<T: Serialize>(result: crate::error::Result<T>) -> Response {
    match result.and_then(|v| {
        serde_json::to_value(&v).map_err(|e| LoyaltyError::Internal(e.to_string()))
    }) {
        Ok(ok) => Response::Ok { ok },
        Err(e) => e.into(),
    }
}

/// Extract `<id>` from `<prefix><id>`, rejecting nested segments.
fn path_id<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    path.strip_prefix(prefix)
        .filter(|id| !id.is_empty() && !id.contains('/'))
}

/// Route one request to the service.
pub async fn dispatch(service: &LoyaltyService, request: &Request) -> Response {
    let method = request.method.to_ascii_uppercase();
    let path = request.path.as_str();
    let key = request.idempotency_key.as_deref();
    debug!(method = %method, path = %path, "Dispatching request");

    match (method.as_str(), path) {
        ("POST", CUSTOMERS_PATH) => return respond(service.create_customer(&request.body).await),
        ("POST", EARN_PATH) => return respond(service.earn(key, &request.body).await),
        ("POST", REDEEM_PATH) => return respond(service.redeem(key, &request.body).await),
        ("GET", _) => {
            if let Some(id) = path_id(path, WALLET_PREFIX) {
                return respond(service.wallet_summary(id).await);
            }
            if let Some(id) = path_id(path, TRANSACTIONS_PREFIX) {
                return respond(service.transactions(id).await);
            }
        }
        _ => {}
    }

    Response::error(ROUTE_NOT_FOUND, format!("No route for {} {}", method, path))
}

/// Parse and route one input line.
pub async fn dispatch_line(service: &LoyaltyService, line: &str) -> Response {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => dispatch(service, &request).await,
        Err(e) => Response::error(MALFORMED_REQUEST, format!("Malformed request: {}", e)),
    }
}

/// Serve newline-delimited requests from `reader`, one response line each.
///
/// Lines that are not UTF-8 or not a request envelope get an error
/// response and the loop moves on. Blank lines are skipped. Returns when
/// the input ends or on an I/O error.
pub async fn serve<R, W>(service: &LoyaltyService, mut reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => dispatch_line(service, line.trim()).await,
            Err(e) => {
                warn!(error = %e, "Request line is not valid UTF-8");
                Response::error(MALFORMED_REQUEST, format!("Malformed request: {}", e))
            }
        };

        writer.write_all(encode(&response).as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
}

/// Serialize a response as a single line.
pub fn encode(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        json!({"error": "INTERNAL_ERROR", "message": e.to_string()}).to_string()
    })
}
