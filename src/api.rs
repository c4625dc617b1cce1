//! Authenticated client for the design platform's REST API.

// crates.io
use reqwest::{
	Method, StatusCode,
	header::{ACCEPT, AUTHORIZATION},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, DownstreamError, preview},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Default ceiling for a single downstream API round trip.
pub const DEFAULT_API_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// HTTP verbs used by catalogue operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl ApiMethod {
	/// Upper-case verb as sent on the wire.
	pub fn as_str(self) -> &'static str {
		match self {
			ApiMethod::Get => "GET",
			ApiMethod::Post => "POST",
			ApiMethod::Put => "PUT",
			ApiMethod::Patch => "PATCH",
			ApiMethod::Delete => "DELETE",
		}
	}
}
impl From<ApiMethod> for Method {
	fn from(value: ApiMethod) -> Self {
		match value {
			ApiMethod::Get => Method::GET,
			ApiMethod::Post => Method::POST,
			ApiMethod::Put => Method::PUT,
			ApiMethod::Patch => Method::PATCH,
			ApiMethod::Delete => Method::DELETE,
		}
	}
}
impl Display for ApiMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One REST call relative to the API base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: ApiMethod,
	/// Raw path segments; each is percent-encoded when the URL is built.
	pub segments: Vec<String>,
	/// Query parameters in insertion order.
	pub query: Vec<(String, String)>,
	/// JSON body, if any.
	pub body: Option<Value>,
}
impl ApiRequest {
	/// Creates a request with no query or body.
	pub fn new<I, S>(method: ApiMethod, segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			method,
			segments: segments.into_iter().map(Into::into).collect(),
			query: Vec::new(),
			body: None,
		}
	}

	/// Appends a query parameter.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Sets the JSON body.
	pub fn with_body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}

	/// `/`-joined path used in logs and error messages.
	pub fn display_path(&self) -> String {
		format!("/{}", self.segments.join("/"))
	}
}

/// Successful downstream response.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResponse {
	/// 2xx with a JSON body.
	Json(Value),
	/// 2xx with a non-JSON body.
	Text(String),
	/// 2xx without a body (typically 204).
	NoContent,
}
impl ApiResponse {
	/// Collapses the response into a JSON value (`null` for no content).
	pub fn into_value(self) -> Value {
		match self {
			ApiResponse::Json(value) => value,
			ApiResponse::Text(text) => Value::String(text),
			ApiResponse::NoContent => Value::Null,
		}
	}
}

/// REST client that attaches a session's bearer token to each request.
#[derive(Clone)]
pub struct DesignApiClient {
	client: ReqwestClient,
	base: Url,
}
impl DesignApiClient {
	/// Builds a client with its own connection pool and request timeout.
	pub fn new(base: Url, timeout: std::time::Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self::with_client(client, base))
	}

	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient, base: Url) -> Self {
		Self { client, base }
	}

	/// Resolves the absolute URL for `request`.
	pub fn url_for(&self, request: &ApiRequest) -> Result<Url, DownstreamError> {
		let mut url = self.base.clone();

		url.path_segments_mut()
			.map_err(|_| downstream_error(request, None, "API base URL cannot carry a path."))?
			.pop_if_empty()
			.extend(&request.segments);

		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&request.query);
		}

		Ok(url)
	}

	/// Sends `request` with `Authorization: Bearer <token>`.
	///
	/// Any non-2xx status, and any transport failure, becomes a [`DownstreamError`]. The token
	/// never appears in the error.
	pub async fn send(
		&self,
		request: &ApiRequest,
		bearer: &TokenSecret,
	) -> Result<ApiResponse, DownstreamError> {
		const KIND: FlowKind = FlowKind::Downstream;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send_inner(request, bearer)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(e) => {
				tracing::warn!(status = ?e.status, path = %e.path, "Design API request failed.");
				obs::record_downstream_status(e.status);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn send_inner(
		&self,
		request: &ApiRequest,
		bearer: &TokenSecret,
	) -> Result<ApiResponse, DownstreamError> {
		let url = self.url_for(request)?;
		let mut builder = self
			.client
			.request(request.method.into(), url)
			.header(AUTHORIZATION, bearer.bearer_header())
			.header(ACCEPT, "application/json");

		if let Some(body) = &request.body {
			builder = builder.json(body);
		}

		let response = builder
			.send()
			.await
			.map_err(|e| downstream_error(request, None, transport_message(&e)))?;
		let status = response.status();
		let text = response
			.text()
			.await
			.map_err(|e| downstream_error(request, Some(status.as_u16()), transport_message(&e)))?;

		tracing::debug!(
			method = %request.method,
			path = %request.display_path(),
			%status,
			"Design API responded."
		);

		if !status.is_success() {
			return Err(downstream_error(request, Some(status.as_u16()), preview(&text)));
		}

		obs::record_downstream_status(Some(status.as_u16()));

		if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
			return Ok(ApiResponse::NoContent);
		}

		Ok(match serde_json::from_str(&text) {
			Ok(value) => ApiResponse::Json(value),
			Err(_) => ApiResponse::Text(text),
		})
	}
}
impl Debug for DesignApiClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DesignApiClient").field("base", &self.base.as_str()).finish()
	}
}

fn downstream_error(
	request: &ApiRequest,
	status: Option<u16>,
	body: impl Into<String>,
) -> DownstreamError {
	DownstreamError {
		method: request.method.as_str().to_owned(),
		path: request.display_path(),
		status,
		body: body.into(),
	}
}

fn transport_message(err: &ReqwestError) -> String {
	if err.is_timeout() {
		"Request timed out.".into()
	} else if err.is_connect() {
		"Could not connect to the design API.".into()
	} else {
		format!("Transport error: {err}.")
	}
}
