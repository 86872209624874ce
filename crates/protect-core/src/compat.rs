//! Client payload normalization applied before JSON-RPC parsing.
//!
//! Some wallets send requests that strict JSON-RPC 2.0 parsing rejects: a
//! leading byte-order mark, no `jsonrpc` member, or `params: null`. The fixer
//! rewrites those into well-formed requests and leaves everything else alone.

use bytes::Bytes;
use serde_json::Value;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Stateless body rewriter.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatFixer;

impl CompatFixer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns a normalized copy of `raw`, or `raw` itself when nothing needs fixing.
    #[must_use]
    pub fn fix(&self, raw: Bytes) -> Bytes {
        let trimmed = trim(&raw);

        let Ok(Value::Object(mut object)) = serde_json::from_slice::<Value>(trimmed) else {
            return if trimmed.len() == raw.len() { raw } else { raw.slice_ref(trimmed) };
        };

        let mut changed = false;

        if !object.contains_key("jsonrpc") {
            object.insert("jsonrpc".to_string(), Value::String("2.0".to_string()));
            changed = true;
        }

        if object.get("params").map_or(true, Value::is_null) {
            object.insert("params".to_string(), Value::Array(Vec::new()));
            changed = true;
        }

        if !changed {
            return if trimmed.len() == raw.len() { raw } else { raw.slice_ref(trimmed) };
        }

        match serde_json::to_vec(&Value::Object(object)) {
            Ok(fixed) => Bytes::from(fixed),
            Err(_) => raw,
        }
    }
}

fn trim(raw: &[u8]) -> &[u8] {
    let without_bom = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    without_bom.trim_ascii()
}
