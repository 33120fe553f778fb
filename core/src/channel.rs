//! Method channels between the host and the embedded runtime
//!
//! A call is a method name plus JSON arguments. Every call is answered with
//! exactly one of: success (optional JSON payload), a structured error with
//! a machine-readable code, or not-implemented.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
pub const UNAVAILABLE: &str = "UNAVAILABLE";

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Value::Null,
        }
    }

    pub fn with_arguments(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// Build a call from the FFI form: arguments arrive as optional JSON text
    pub fn from_json(method: &str, arguments_json: Option<&str>) -> Result<Self, serde_json::Error> {
        let arguments = match arguments_json {
            Some(json) if !json.trim().is_empty() => serde_json::from_str(json)?,
            _ => Value::Null,
        };
        Ok(Self::with_arguments(method, arguments))
    }

    /// String argument by key, when arguments are a JSON object
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum MethodResponse {
    Success {
        result_json: Option<String>,
    },
    Error {
        code: String,
        message: String,
        details: Option<String>,
    },
    NotImplemented,
}

impl MethodResponse {
    pub fn success_empty() -> Self {
        MethodResponse::Success { result_json: None }
    }

    pub fn success_bool(value: bool) -> Self {
        MethodResponse::Success {
            result_json: Some(value.to_string()),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        MethodResponse::Error {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MethodResponse::Success { .. })
    }

    /// Error code, if this is a structured error
    pub fn error_code(&self) -> Option<&str> {
        match self {
            MethodResponse::Error { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// JSON form used by the desktop host's line protocol
    pub fn to_json(&self) -> Value {
        match self {
            MethodResponse::Success { result_json } => {
                let result = result_json
                    .as_deref()
                    .and_then(|json| serde_json::from_str::<Value>(json).ok())
                    .unwrap_or(Value::Null);
                serde_json::json!({ "status": "success", "result": result })
            }
            MethodResponse::Error {
                code,
                message,
                details,
            } => serde_json::json!({
                "status": "error",
                "code": code,
                "message": message,
                "details": details,
            }),
            MethodResponse::NotImplemented => serde_json::json!({ "status": "not_implemented" }),
        }
    }
}

/// Inbound handler for one channel.
pub trait MethodHandler: Send + Sync {
    fn handle(&self, call: &MethodCall) -> MethodResponse;
}

/// Maps channel names to handlers. Unknown channels answer not-implemented.
#[derive(Default, Clone)]
pub struct ChannelRouter {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl ChannelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, channel: impl Into<String>, handler: Arc<dyn MethodHandler>) {
        let channel = channel.into();
        tracing::debug!("Registered method channel {}", channel);
        self.handlers.insert(channel, handler);
    }

    pub fn dispatch(&self, channel: &str, call: &MethodCall) -> MethodResponse {
        match self.handlers.get(channel) {
            Some(handler) => handler.handle(call),
            None => {
                tracing::debug!("Call {} on unregistered channel {}", call.method, channel);
                MethodResponse::NotImplemented
            }
        }
    }

    /// Dispatch a call whose arguments are still JSON text
    pub fn dispatch_json(
        &self,
        channel: &str,
        method: &str,
        arguments_json: Option<&str>,
    ) -> MethodResponse {
        if !self.handlers.contains_key(channel) {
            return MethodResponse::NotImplemented;
        }
        match MethodCall::from_json(method, arguments_json) {
            Ok(call) => self.dispatch(channel, &call),
            Err(e) => MethodResponse::error(INVALID_ARGUMENT, format!("Malformed arguments: {}", e)),
        }
    }

    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl MethodHandler for Echo {
        fn handle(&self, call: &MethodCall) -> MethodResponse {
            match call.method.as_str() {
                "echo" => MethodResponse::Success {
                    result_json: Some(call.arguments.to_string()),
                },
                _ => MethodResponse::NotImplemented,
            }
        }
    }

    fn router() -> ChannelRouter {
        let mut router = ChannelRouter::new();
        router.register("test/echo", Arc::new(Echo));
        router
    }

    #[test]
    fn test_arguments_parse_from_json() {
        let call = MethodCall::from_json("openFolder", Some(r#"{"path": "/tmp"}"#)).unwrap();
        assert_eq!(call.arg_str("path"), Some("/tmp"));
        assert_eq!(call.arg_str("missing"), None);
    }

    #[test]
    fn test_absent_or_blank_arguments_are_null() {
        assert_eq!(MethodCall::from_json("m", None).unwrap().arguments, Value::Null);
        assert_eq!(MethodCall::from_json("m", Some("  ")).unwrap().arguments, Value::Null);
    }

    #[test]
    fn test_non_string_argument_is_none() {
        let call = MethodCall::with_arguments("m", serde_json::json!({ "path": 3 }));
        assert_eq!(call.arg_str("path"), None);
    }

    #[test]
    fn test_unknown_channel_not_implemented() {
        assert_eq!(
            router().dispatch("nope", &MethodCall::new("echo")),
            MethodResponse::NotImplemented
        );
        assert_eq!(
            router().dispatch_json("nope", "echo", Some("{broken")),
            MethodResponse::NotImplemented
        );
    }

    #[test]
    fn test_malformed_arguments_are_invalid_argument() {
        let response = router().dispatch_json("test/echo", "echo", Some("{broken"));
        assert_eq!(response.error_code(), Some(INVALID_ARGUMENT));
    }

    #[test]
    fn test_not_implemented_is_distinct() {
        let not_impl = MethodResponse::NotImplemented;
        assert!(!not_impl.is_success());
        assert_eq!(not_impl.error_code(), None);
        assert_eq!(not_impl.to_json()["status"], "not_implemented");
    }

    #[test]
    fn test_response_json_shapes() {
        assert_eq!(
            MethodResponse::success_bool(false).to_json(),
            serde_json::json!({ "status": "success", "result": false })
        );
        assert_eq!(
            MethodResponse::success_empty().to_json()["result"],
            Value::Null
        );
        let err = MethodResponse::error(UNAVAILABLE, "Cannot open folder x").to_json();
        assert_eq!(err["code"], UNAVAILABLE);
        assert_eq!(err["message"], "Cannot open folder x");
    }

    #[test]
    fn test_channels_sorted() {
        let mut router = router();
        router.register("a/first", Arc::new(Echo));
        assert_eq!(router.channels(), vec!["a/first".to_string(), "test/echo".to_string()]);
    }
}
