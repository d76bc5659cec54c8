//! Request fingerprints for idempotency-key reuse detection.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Canonical identity of a mutating request: (method, path, body).
///
/// Two requests are "the same" iff their fingerprints are equal. The body is
/// canonicalized so object key order never produces a false conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    method: String,
    path: String,
    body: String,
}

impl Fingerprint {
    pub fn new(method: &str, path: &str, body: &Value) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            body: canonical_json(body),
        }
    }

    /// Rebuild a fingerprint from a stored record's fields.
    pub fn from_parts(method: &str, path: &str, canonical_body: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            body: canonical_body.to_string(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Canonical JSON of the body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// SHA-256 hex digest of the fingerprint, safe to log.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.path.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.body.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Serialize `value` with object keys sorted at every depth.
///
/// Array order is significant and kept. Numbers and strings use serde_json's
/// own rendering.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
