//! JSON-RPC 2.0 envelopes used by the MCP transports.

// self
use crate::_prelude::*;

/// Malformed JSON.
pub const PARSE_ERROR: i32 = -32700;
/// Valid JSON that is not a JSON-RPC request.
pub const INVALID_REQUEST: i32 = -32600;
/// Unknown method.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Bad parameters, unknown tool, or invalid tool arguments.
pub const INVALID_PARAMS: i32 = -32602;

/// Request ID (string or number).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
	/// String ID.
	String(String),
	/// Numeric ID.
	Number(i64),
}
impl Display for RequestId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::String(s) => f.write_str(s),
			Self::Number(n) => write!(f, "{n}"),
		}
	}
}

/// Inbound request or notification; notifications carry no `id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonRpcRequest {
	/// Protocol version; must be `2.0`.
	pub jsonrpc: String,
	/// Request ID, absent for notifications.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<RequestId>,
	/// Method name.
	pub method: String,
	/// Parameters.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
}
impl JsonRpcRequest {
	/// Parses one message, answering with the JSON-RPC error to send back when it is unusable.
	pub fn parse(raw: &str) -> Result<Self, JsonRpcResponse> {
		let value: Value = serde_json::from_str(raw)
			.map_err(|e| JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {e}.")))?;

		Self::from_value(value)
	}

	/// Interprets an already decoded JSON value.
	pub fn from_value(value: Value) -> Result<Self, JsonRpcResponse> {
		let id = value.get("id").cloned().and_then(|id| serde_json::from_value(id).ok());
		let request: Self = serde_json::from_value(value).map_err(|e| {
			JsonRpcResponse::error(id.clone(), INVALID_REQUEST, format!("Invalid request: {e}."))
		})?;

		if request.jsonrpc != "2.0" {
			return Err(JsonRpcResponse::error(
				id,
				INVALID_REQUEST,
				"Invalid request: `jsonrpc` must be \"2.0\".",
			));
		}

		Ok(request)
	}

	/// Returns `true` for notifications, which never get a response.
	pub fn is_notification(&self) -> bool {
		self.id.is_none()
	}
}

/// Outbound response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
	/// Protocol version (always `2.0`).
	pub jsonrpc: String,
	/// Request ID; `null` when the request could not be read.
	pub id: Option<RequestId>,
	/// Result on success.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Error on failure.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<JsonRpcError>,
}
impl JsonRpcResponse {
	/// Creates a success response.
	pub fn success(id: RequestId, result: Value) -> Self {
		Self { jsonrpc: "2.0".into(), id: Some(id), result: Some(result), error: None }
	}

	/// Creates an error response.
	pub fn error(id: Option<RequestId>, code: i32, message: impl Into<String>) -> Self {
		Self {
			jsonrpc: "2.0".into(),
			id,
			result: None,
			error: Some(JsonRpcError { code, message: message.into(), data: None }),
		}
	}
}

/// JSON-RPC error object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
	/// Error code.
	pub code: i32,
	/// Error message.
	pub message: String,
	/// Optional structured detail.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// `tools/call` parameters.
#[derive(Clone, Debug, Deserialize)]
pub struct ToolCallParams {
	/// Tool name.
	pub name: String,
	/// Tool arguments; validated against the tool's schema.
	#[serde(default)]
	pub arguments: Option<Value>,
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn parses_requests_and_notifications() {
		let request = JsonRpcRequest::parse(r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#)
			.expect("Request should parse.");

		assert_eq!(request.id, Some(RequestId::Number(7)));
		assert!(!request.is_notification());

		let note = JsonRpcRequest::parse(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
			.expect("Notification should parse.");

		assert!(note.is_notification());
	}

	#[test]
	fn unusable_messages_map_to_json_rpc_errors() {
		let parse = JsonRpcRequest::parse("{not json").expect_err("Garbage should fail.");

		assert_eq!(parse.error.map(|e| e.code), Some(PARSE_ERROR));
		assert_eq!(parse.id, None);

		let invalid = JsonRpcRequest::parse(r#"{"jsonrpc":"1.0","id":"a","method":"ping"}"#)
			.expect_err("Wrong version should fail.");

		assert_eq!(invalid.error.map(|e| e.code), Some(INVALID_REQUEST));
		assert_eq!(invalid.id, Some(RequestId::String("a".into())));
	}

	#[test]
	fn responses_serialize_without_empty_members() {
		let ok = serde_json::to_value(JsonRpcResponse::success(RequestId::Number(1), json!({})))
			.expect("Response should serialize.");

		assert_eq!(ok, json!({ "jsonrpc": "2.0", "id": 1, "result": {} }));

		let err = serde_json::to_value(JsonRpcResponse::error(None, METHOD_NOT_FOUND, "nope"))
			.expect("Response should serialize.");

		assert_eq!(
			err,
			json!({ "jsonrpc": "2.0", "id": null, "error": { "code": -32601, "message": "nope" } })
		);
	}
}
