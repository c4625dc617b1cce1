//! Facade binding the tool catalogue, the gate, and the design API client.

// crates.io
use serde_json::json;
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	api::DesignApiClient,
	auth::SessionId,
	authorize::AuthorizationTemplate,
	config::GatewayConfig,
	error::ConfigError,
	flows::{AuthorizationPrompt, Gate, GateOutcome, SessionState},
	http::ReqwestHttpClient,
	oauth::TokenExchangeClient,
	store::MemoryStore,
	tools::{self, ToolError, ToolSpec, ValidatedArguments},
};

/// Result of a tool call that did not fail.
#[derive(Clone, Debug)]
pub enum ToolOutcome {
	/// Tool ran; carries the response payload (`null` for empty responses).
	Data(Value),
	/// The session must authorize before the tool can run; the call was not executed.
	AuthorizationRequired(AuthorizationPrompt),
}

/// Everything a transport needs to serve tools.
#[derive(Clone, Debug)]
pub struct Gateway {
	/// Session gate shared by every transport.
	pub gate: Arc<Gate>,
	/// Downstream REST client.
	pub api: DesignApiClient,
}
impl Gateway {
	/// Creates a gateway from pre-built parts.
	pub fn new(gate: Arc<Gate>, api: DesignApiClient) -> Self {
		Self { gate, api }
	}

	/// Wires the in-memory store, token client, and API client described by `config`.
	pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::with_timeout(config.token_timeout)?;
		let exchange = <TokenExchangeClient>::new(
			&config.descriptor,
			&config.client_id,
			&config.client_secret,
			&config.redirect_uri,
			http_client,
		)?;
		let template = AuthorizationTemplate::new(
			config.descriptor.endpoints.authorization.clone(),
			config.client_id.clone(),
			config.redirect_uri.clone(),
			config.scopes.clone(),
		)?;
		let gate = Gate::new(Arc::new(MemoryStore::default()), Arc::new(exchange), template);
		let api =
			DesignApiClient::new(config.descriptor.endpoints.api_base.clone(), config.api_timeout)?;

		Ok(Self::new(Arc::new(gate), api))
	}

	/// Tools advertised over MCP.
	pub fn tools(&self) -> &'static [ToolSpec] {
		tools::CATALOG
	}

	/// Validates and runs a tool for `session`.
	///
	/// Arguments are checked before the gate is consulted, so invalid calls never start an
	/// authorization or reach the API.
	pub async fn call_tool(
		&self,
		session: &SessionId,
		name: &str,
		arguments: Option<Value>,
	) -> Result<ToolOutcome, ToolError> {
		let spec =
			tools::find(name).ok_or_else(|| ToolError::UnknownTool { name: name.to_owned() })?;
		let arguments = ValidatedArguments::validate(spec, arguments)?;
		let Some(request) = arguments.to_request() else {
			return Ok(ToolOutcome::Data(self.auth_status(session).await?));
		};

		match self.gate.access(session).await? {
			GateOutcome::AuthorizationRequired(prompt) =>
				Ok(ToolOutcome::AuthorizationRequired(prompt)),
			GateOutcome::Authorized(grant) => {
				let response =
					self.api.send(&request, &grant.access_token).await.map_err(Error::from)?;

				Ok(ToolOutcome::Data(response.into_value()))
			},
		}
	}

	/// Session status report without token material.
	pub async fn auth_status(&self, session: &SessionId) -> Result<Value> {
		let state = self.gate.state(session).await?;
		let mut report = json!({ "session": session.as_str(), "state": state.as_str() });

		match state {
			SessionState::Authenticated { expires_at } => {
				let remaining = (expires_at - OffsetDateTime::now_utc()).whole_seconds().max(0);

				report["expires_at"] = expires_at
					.format(&Rfc3339)
					.map(Value::String)
					.unwrap_or(Value::Null);
				report["expires_in_seconds"] = json!(remaining);
			},
			SessionState::AwaitingCallback => {
				report["hint"] = json!("Finish signing in with the link issued earlier.");
			},
			SessionState::Unauthenticated => {
				report["hint"] = json!("Call any design tool to receive a sign-in link.");
			},
			SessionState::Refreshing => {},
		}

		Ok(report)
	}
}
