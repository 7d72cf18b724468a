//! JSON bodies exchanged with the browser client.
//!
//! Requests are read as untyped `serde_json::Value` so that validation
//! order (host state first, then payload shape) stays with the engine.

use serde::{Deserialize, Serialize};

/// Host connection state reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// `GET /health` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server is up.
    pub status: String,
    pub resolve_connection: ConnectionStatus,
}

impl HealthResponse {
    pub fn new(connected: bool) -> Self {
        Self {
            status: "ok".to_string(),
            resolve_connection: if connected {
                ConnectionStatus::Connected
            } else {
                ConnectionStatus::Disconnected
            },
        }
    }
}

/// `POST /apply-grade` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResponse {
    /// Always `"success"`.
    pub status: String,
    /// e.g. `"Applied to Node 2"`.
    pub message: String,
}

impl ApplyResponse {
    pub fn success(message: String) -> Self {
        Self {
            status: "success".to_string(),
            message,
        }
    }
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_health_wire_shape() {
        assert_eq!(
            serde_json::to_value(HealthResponse::new(false)).unwrap(),
            json!({"status": "ok", "resolve_connection": "disconnected"})
        );
        assert_eq!(
            serde_json::to_value(HealthResponse::new(true)).unwrap()["resolve_connection"],
            "connected"
        );
    }

    #[test]
    fn test_apply_wire_shape() {
        assert_eq!(
            serde_json::to_value(ApplyResponse::success("Applied to Node 1".into())).unwrap(),
            json!({"status": "success", "message": "Applied to Node 1"})
        );
    }
}
