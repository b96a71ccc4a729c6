//! Remote procedure call capability consumed by the benchmark core.
//!
//! The core only ever needs "invoke named procedure with these arguments":
//! [`RpcTransport::call`]. The session token, when there is one, is passed by
//! the caller as the leading argument, so the transport stays stateless and a
//! single instance can serve one orchestrator for its whole lifetime.
mod client;
#[cfg(test)]
pub(crate) mod mock;
pub(crate) mod xmlrpc;

use async_trait::async_trait;

use crate::error::RpcError;

pub use client::XmlRpcClient;
pub use serde_json::Value;

/// Procedure exchanging credentials for a session key.
pub const AUTH_LOGIN: &str = "auth.login";
/// Procedure invalidating a session key.
pub const AUTH_LOGOUT: &str = "auth.logout";

#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Invokes `method` with positional `params` and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Transport`] when the remote end cannot be reached
    /// and [`RpcError::Fault`] / [`RpcError::Malformed`] when it answers with
    /// a fault or an unreadable response.
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, RpcError>;
}

/// Size of a call result as recorded in action logs.
///
/// Collections report their length, strings their character count, nil is
/// empty, and any other scalar counts as one item.
#[must_use]
pub fn output_size(value: &Value) -> u64 {
    let len = match value {
        Value::Null => 0,
        Value::Array(items) => items.len(),
        Value::Object(members) => members.len(),
        Value::String(text) => text.chars().count(),
        Value::Bool(_) | Value::Number(_) => 1,
    };
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Unwraps a list-style result.
///
/// # Errors
///
/// Returns [`RpcError::Malformed`] when `value` is not an array.
pub fn into_list(method: &str, value: Value) -> Result<Vec<Value>, RpcError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Object(_) => {
            Err(RpcError::malformed(format!(
                "{} returned {} instead of a list",
                method,
                kind_name(&value)
            )))
        }
    }
}

/// Looks up a required member of a struct-style record.
///
/// # Errors
///
/// Returns [`RpcError::Malformed`] when the member is absent.
pub fn member<'value>(
    method: &str,
    record: &'value Value,
    key: &str,
) -> Result<&'value Value, RpcError> {
    record.get(key).ok_or_else(|| {
        RpcError::malformed(format!("{} returned a record without '{}'", method, key))
    })
}

/// Reads a required non-negative integer member.
///
/// # Errors
///
/// Returns [`RpcError::Malformed`] when the member is absent or not a
/// non-negative integer.
pub fn member_u64(method: &str, record: &Value, key: &str) -> Result<u64, RpcError> {
    member(method, record, key)?.as_u64().ok_or_else(|| {
        RpcError::malformed(format!(
            "{} returned a non-integer '{}' member",
            method, key
        ))
    })
}

/// Reads a required integer member, such as an entity id.
///
/// # Errors
///
/// Returns [`RpcError::Malformed`] when the member is absent or not an
/// integer.
pub fn member_i64(method: &str, record: &Value, key: &str) -> Result<i64, RpcError> {
    member(method, record, key)?.as_i64().ok_or_else(|| {
        RpcError::malformed(format!(
            "{} returned a non-integer '{}' member",
            method, key
        ))
    })
}

const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a struct",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn output_size_follows_result_shape() -> Result<(), String> {
        let cases = [
            (json!(null), 0),
            (json!([1, 2, 3]), 3),
            (json!({"id": 1, "name": "x"}), 2),
            (json!("0123abcd"), 8),
            (json!(1), 1),
            (json!(true), 1),
        ];
        for (value, expected) in cases {
            let size = output_size(&value);
            if size != expected {
                return Err(format!("size of {} was {}, expected {}", value, size, expected));
            }
        }
        Ok(())
    }

    #[test]
    fn into_list_rejects_structs() -> Result<(), String> {
        match into_list("org.getDetails", json!({"id": 1})) {
            Err(RpcError::Malformed { message }) if message.contains("org.getDetails") => Ok(()),
            other => Err(format!("unexpected result: {:?}", other)),
        }
    }

    #[test]
    fn member_u64_reads_counts() -> Result<(), String> {
        let record = json!({"label": "enterprise_entitled", "used": 0, "free": 120});
        let free = member_u64("org.listSystemEntitlements", &record, "free")
            .map_err(|err| err.to_string())?;
        if free != 120 {
            return Err(format!("unexpected free: {}", free));
        }
        if member_u64("org.listSystemEntitlements", &record, "label").is_ok() {
            return Err("label should not read as an integer".to_owned());
        }
        Ok(())
    }
}
