//! Argument validation and request construction for catalogue tools.

// crates.io
use serde_json::Map;
// self
use crate::{
	_prelude::*,
	api::ApiRequest,
	tools::{ParamLocation, ToolError, ToolSpec, ToolTarget},
};

/// Tool arguments that passed validation against a [`ToolSpec`].
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedArguments {
	spec: &'static ToolSpec,
	values: Map<String, Value>,
}
impl ValidatedArguments {
	/// Checks `arguments` against `spec`.
	///
	/// `None` and `null` are treated as an empty object. Unknown keys, missing required keys,
	/// wrongly typed values, and blank path parameters are rejected.
	pub fn validate(spec: &'static ToolSpec, arguments: Option<Value>) -> Result<Self, ToolError> {
		let values: Map<String, Value> = match arguments {
			None | Some(Value::Null) => Map::new(),
			Some(value) => serde_path_to_error::deserialize(value).map_err(|e| {
				invalid(spec, format!("{} (at `{}`)", e.inner(), e.path()))
			})?,
		};

		if let Some(unknown) = values.keys().find(|key| !spec.params.iter().any(|p| p.name == *key))
		{
			return Err(invalid(spec, format!("unknown argument `{unknown}`")));
		}

		for param in spec.params {
			match values.get(param.name) {
				None | Some(Value::Null) if param.required =>
					return Err(invalid(spec, format!("missing required argument `{}`", param.name))),
				None | Some(Value::Null) => {},
				Some(value) if !param.kind.accepts(value) =>
					return Err(invalid(
						spec,
						format!("argument `{}` must be of type {}", param.name, param.kind.as_str()),
					)),
				Some(Value::String(value))
					if param.location == ParamLocation::Path && value.trim().is_empty() =>
					return Err(invalid(spec, format!("argument `{}` cannot be blank", param.name))),
				Some(_) => {},
			}
		}

		Ok(Self { spec, values })
	}

	/// Tool the arguments were validated for.
	pub fn spec(&self) -> &'static ToolSpec {
		self.spec
	}

	/// Returns the raw value of an argument, if supplied.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.values.get(name).filter(|value| !value.is_null())
	}

	/// Builds the downstream request, or `None` for tools that do not call the API.
	pub fn to_request(&self) -> Option<ApiRequest> {
		let ToolTarget::Api { method, path } = self.spec.target else {
			return None;
		};
		let segments = path
			.split('/')
			.filter(|segment| !segment.is_empty())
			.map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
				Some(name) => self.get(name).map(scalar_text).unwrap_or_default(),
				None => segment.to_owned(),
			})
			.collect::<Vec<_>>();
		let mut request = ApiRequest::new(method, segments);
		let mut body = Map::new();

		for param in self.spec.params {
			let Some(value) = self.get(param.name) else { continue };

			match param.location {
				ParamLocation::Path => {},
				ParamLocation::Query => request = request.with_query(param.name, scalar_text(value)),
				ParamLocation::Body => {
					body.insert(param.name.to_owned(), value.clone());
				},
			}
		}

		if !body.is_empty() || self.spec.params.iter().any(|p| p.location == ParamLocation::Body)
		{
			request = request.with_body(Value::Object(body));
		}

		Some(request)
	}
}

fn scalar_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

fn invalid(spec: &ToolSpec, reason: String) -> ToolError {
	ToolError::InvalidArguments { tool: spec.name, reason }
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{api::ApiMethod, tools::catalog};

	fn spec(name: &str) -> &'static ToolSpec {
		catalog::find(name).expect("Catalogue fixture should exist.")
	}

	fn reason(result: Result<ValidatedArguments, ToolError>) -> String {
		match result {
			Err(ToolError::InvalidArguments { reason, .. }) => reason,
			other => panic!("Expected invalid arguments, got {other:?}."),
		}
	}

	#[test]
	fn rejects_missing_unknown_and_mistyped_arguments() {
		assert!(
			reason(ValidatedArguments::validate(spec("get_design"), None))
				.contains("missing required argument `design_id`")
		);
		assert!(
			reason(ValidatedArguments::validate(
				spec("get_design"),
				Some(json!({ "design_id": "D1", "extra": 1 }))
			))
			.contains("unknown argument `extra`")
		);
		assert!(
			reason(ValidatedArguments::validate(
				spec("list_design_pages"),
				Some(json!({ "design_id": "D1", "limit": "ten" }))
			))
			.contains("must be of type integer")
		);
		assert!(
			reason(ValidatedArguments::validate(spec("get_design"), Some(json!({ "design_id": " " }))))
				.contains("cannot be blank")
		);
	}

	#[test]
	fn non_object_arguments_report_their_path() {
		let reason = reason(ValidatedArguments::validate(spec("get_design"), Some(json!([1, 2]))));

		assert!(reason.contains("invalid type"), "{reason}");
	}

	#[test]
	fn builds_path_query_and_body() {
		let pages = ValidatedArguments::validate(
			spec("list_design_pages"),
			Some(json!({ "design_id": "D/1", "limit": 5 })),
		)
		.expect("Arguments should validate.")
		.to_request()
		.expect("API tool should build a request.");

		assert_eq!(pages.method, ApiMethod::Get);
		assert_eq!(pages.segments, ["designs", "D/1", "pages"]);
		assert_eq!(pages.query, [("limit".to_owned(), "5".to_owned())]);
		assert_eq!(pages.body, None);

		let folder = ValidatedArguments::validate(
			spec("create_folder"),
			Some(json!({ "name": "Brand", "parent_folder_id": "root" })),
		)
		.expect("Arguments should validate.")
		.to_request()
		.expect("API tool should build a request.");

		assert_eq!(folder.body, Some(json!({ "name": "Brand", "parent_folder_id": "root" })));
	}

	#[test]
	fn local_tools_build_no_request() {
		let args = ValidatedArguments::validate(spec("auth_status"), Some(Value::Null))
			.expect("Empty arguments should validate.");

		assert!(args.to_request().is_none());
	}
}
