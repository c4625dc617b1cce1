//! MCP method dispatch shared by the HTTP and stdio transports.
//!
//! Protected tools never fail with "unauthorized": a session without tokens receives a normal
//! tool result whose text carries the sign-in link, so the assistant can relay it verbatim.

pub mod messages;
pub mod stdio;

pub use messages::*;

// crates.io
use serde_json::json;
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::SessionId,
	flows::AuthorizationPrompt,
	gateway::{Gateway, ToolOutcome},
	tools::ToolError,
};

/// MCP protocol revision announced on `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-06-18";
/// Server name announced on `initialize`.
pub const SERVER_NAME: &str = "design-mcp-gateway";

/// Answers MCP requests on behalf of one [`Gateway`].
#[derive(Clone, Debug)]
pub struct McpHandler {
	gateway: Arc<Gateway>,
}
impl McpHandler {
	/// Wraps a gateway.
	pub fn new(gateway: Arc<Gateway>) -> Self {
		Self { gateway }
	}

	/// Underlying gateway.
	pub fn gateway(&self) -> &Arc<Gateway> {
		&self.gateway
	}

	/// Handles one request for `session`; notifications yield `None`.
	pub async fn handle(
		&self,
		session: &SessionId,
		request: JsonRpcRequest,
	) -> Option<JsonRpcResponse> {
		let Some(id) = request.id else {
			tracing::debug!(method = %request.method, "Ignoring MCP notification.");

			return None;
		};
		let response = match request.method.as_str() {
			"initialize" => JsonRpcResponse::success(id, initialize_result()),
			"ping" => JsonRpcResponse::success(id, json!({})),
			"tools/list" => {
				let tools = self.gateway.tools().iter().map(|spec| spec.descriptor());

				JsonRpcResponse::success(id, json!({ "tools": tools.collect::<Vec<_>>() }))
			},
			"tools/call" => self.call_tool(session, id, request.params).await,
			other => JsonRpcResponse::error(
				Some(id),
				METHOD_NOT_FOUND,
				format!("Method not found: {other}."),
			),
		};

		Some(response)
	}

	async fn call_tool(
		&self,
		session: &SessionId,
		id: RequestId,
		params: Option<Value>,
	) -> JsonRpcResponse {
		let params = match params.map(serde_json::from_value::<ToolCallParams>) {
			Some(Ok(params)) => params,
			Some(Err(e)) =>
				return JsonRpcResponse::error(
					Some(id),
					INVALID_PARAMS,
					format!("Invalid tools/call params: {e}."),
				),
			None =>
				return JsonRpcResponse::error(
					Some(id),
					INVALID_PARAMS,
					"Missing tools/call params.",
				),
		};

		tracing::info!(session = %session, tool = %params.name, "Tool call received.");

		match self.gateway.call_tool(session, &params.name, params.arguments).await {
			Ok(ToolOutcome::Data(value)) => JsonRpcResponse::success(id, data_result(value)),
			Ok(ToolOutcome::AuthorizationRequired(prompt)) =>
				JsonRpcResponse::success(id, authorization_result(&prompt)),
			Err(e @ (ToolError::UnknownTool { .. } | ToolError::InvalidArguments { .. })) =>
				JsonRpcResponse::error(Some(id), INVALID_PARAMS, e.to_string()),
			Err(ToolError::Gateway(e)) => {
				tracing::warn!(%session, tool = %params.name, error = %e, "Tool call failed.");

				JsonRpcResponse::success(id, error_result(&e))
			},
		}
	}
}

fn initialize_result() -> Value {
	json!({
		"protocolVersion": PROTOCOL_VERSION,
		"capabilities": { "tools": { "listChanged": false } },
		"serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
		"instructions": concat!(
			"Design tools require signing in once per session. When a tool returns an ",
			"authorization link, show it to the user and retry after they finish."
		),
	})
}

fn data_result(value: Value) -> Value {
	let text = match &value {
		Value::Null => "Done.".to_owned(),
		Value::String(text) => text.clone(),
		other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
	};
	let mut result = json!({ "content": [{ "type": "text", "text": text }], "isError": false });

	if value.is_object() {
		result["structuredContent"] = value;
	}

	result
}

fn authorization_result(prompt: &AuthorizationPrompt) -> Value {
	json!({
		"content": [{ "type": "text", "text": prompt.message() }],
		"structuredContent": {
			"authorization_required": true,
			"authorize_url": prompt.authorize_url.as_str(),
			"expires_at": prompt.expires_at.format(&Rfc3339).ok(),
		},
		"isError": false,
	})
}

fn error_result(error: &Error) -> Value {
	json!({ "content": [{ "type": "text", "text": error.to_string() }], "isError": true })
}
