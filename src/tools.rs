//! Tool catalogue exposed over MCP and the translation of tool arguments into API requests.

pub mod args;
pub mod catalog;

pub use args::*;
pub use catalog::*;

// self
use crate::{_prelude::*, api::ApiMethod};

/// Where a tool parameter is placed on the outgoing request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamLocation {
	/// Substituted into a `{name}` placeholder of the path template.
	Path,
	/// Appended as a query parameter.
	Query,
	/// Set as a top-level key of the JSON body.
	Body,
}

/// JSON type accepted for a tool parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
	/// JSON string.
	String,
	/// JSON integer.
	Integer,
	/// JSON boolean.
	Boolean,
	/// JSON object, forwarded as-is.
	Object,
}
impl ParamKind {
	/// JSON Schema `type` keyword.
	pub fn as_str(self) -> &'static str {
		match self {
			ParamKind::String => "string",
			ParamKind::Integer => "integer",
			ParamKind::Boolean => "boolean",
			ParamKind::Object => "object",
		}
	}

	/// Returns `true` if `value` has this JSON type.
	pub fn accepts(self, value: &Value) -> bool {
		match self {
			ParamKind::String => value.is_string(),
			ParamKind::Integer => value.is_i64() || value.is_u64(),
			ParamKind::Boolean => value.is_boolean(),
			ParamKind::Object => value.is_object(),
		}
	}
}

/// Declaration of one tool parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamSpec {
	/// Argument name as seen by MCP clients.
	pub name: &'static str,
	/// Placement on the request.
	pub location: ParamLocation,
	/// Accepted JSON type.
	pub kind: ParamKind,
	/// Whether the argument must be supplied.
	pub required: bool,
	/// Human-readable description surfaced in the input schema.
	pub description: &'static str,
}

/// What a tool call does once its arguments validate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolTarget {
	/// Proxies to the design API.
	Api {
		/// HTTP verb.
		method: ApiMethod,
		/// `/`-separated path template relative to the API base, with `{param}` placeholders.
		path: &'static str,
	},
	/// Reports the calling session's authorization state without contacting the provider.
	AuthStatus,
}

/// Declaration of one MCP tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolSpec {
	/// Unique tool name.
	pub name: &'static str,
	/// Description surfaced in `tools/list`.
	pub description: &'static str,
	/// Behavior behind the tool.
	pub target: ToolTarget,
	/// Accepted arguments.
	pub params: &'static [ParamSpec],
}
impl ToolSpec {
	/// Returns `true` if the tool needs an authorized session.
	pub fn is_protected(&self) -> bool {
		matches!(self.target, ToolTarget::Api { .. })
	}

	/// JSON Schema describing the tool's arguments.
	pub fn input_schema(&self) -> Value {
		let mut properties = serde_json::Map::new();
		let mut required = Vec::new();

		for param in self.params {
			properties.insert(
				param.name.to_owned(),
				serde_json::json!({ "type": param.kind.as_str(), "description": param.description }),
			);

			if param.required {
				required.push(Value::String(param.name.to_owned()));
			}
		}

		serde_json::json!({
			"type": "object",
			"properties": properties,
			"required": required,
			"additionalProperties": false,
		})
	}

	/// MCP `tools/list` entry.
	pub fn descriptor(&self) -> Value {
		serde_json::json!({
			"name": self.name,
			"description": self.description,
			"inputSchema": self.input_schema(),
		})
	}
}

/// Failures raised while dispatching a tool call.
#[derive(Debug, ThisError)]
pub enum ToolError {
	/// No tool with the requested name exists.
	#[error("Unknown tool `{name}`.")]
	UnknownTool {
		/// Requested name.
		name: String,
	},
	/// The arguments do not satisfy the tool's schema.
	#[error("Invalid arguments for `{tool}`: {reason}")]
	InvalidArguments {
		/// Tool whose arguments failed validation.
		tool: &'static str,
		/// What was wrong.
		reason: String,
	},
	/// The gate or the downstream API failed.
	#[error(transparent)]
	Gateway(#[from] Error),
}
