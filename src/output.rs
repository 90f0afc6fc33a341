use crate::client::ClientError;
use crate::types::QuoteResult;
use serde_json::{json, Value};

/// Success document: `{ num_quotes, rates, rate_limit }`.
pub fn success(result: &QuoteResult) -> Value {
    serde_json::to_value(result).unwrap_or_else(|e| json!({ "errors": [e.to_string()] }))
}

/// Failure document: `{ errors, error, rate_limit }`. Every failure carries
/// the quota so callers can always see what remains.
pub fn failure(err: &ClientError) -> Value {
    json!({
        "errors": err.messages(),
        "error": err.info(),
        "rate_limit": err.rate_limit(),
    })
}
