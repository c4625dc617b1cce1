//! Validated runtime configuration assembled from the command line and environment.

// std
use std::net::SocketAddr;
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	cli::{Cli, Transport},
	error::ConfigError,
	provider::{ProviderDescriptor, validate_endpoint},
};

/// Everything the gateway needs at startup, already validated.
#[derive(Clone)]
pub struct GatewayConfig {
	/// Provider endpoints and token endpoint authentication.
	pub descriptor: ProviderDescriptor,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
	/// Redirect URI sent on authorization and code exchange requests.
	pub redirect_uri: Url,
	/// Scopes requested for every session.
	pub scopes: ScopeSet,
	/// Address the HTTP server binds to.
	pub listen: SocketAddr,
	/// MCP transport.
	pub transport: Transport,
	/// Token endpoint timeout.
	pub token_timeout: std::time::Duration,
	/// Design API timeout.
	pub api_timeout: std::time::Duration,
}
impl GatewayConfig {
	/// Validates parsed arguments.
	pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
		let client_id = required(cli.client_id.as_deref(), "client-id")?;
		let client_secret = required(cli.client_secret.as_deref(), "client-secret")?;
		let redirect_uri = parse_url("redirect", &cli.redirect_uri)?;

		validate_endpoint("redirect", &redirect_uri)?;

		let descriptor = ProviderDescriptor::builder()
			.authorization_endpoint(parse_url(
				"authorization",
				required(cli.authorization_endpoint.as_deref(), "authorization-endpoint")?,
			)?)
			.token_endpoint(parse_url(
				"token",
				required(cli.token_endpoint.as_deref(), "token-endpoint")?,
			)?)
			.api_base_url(parse_url(
				"API base",
				required(cli.api_base_url.as_deref(), "api-base-url")?,
			)?)
			.client_auth_method(cli.client_auth)
			.build()?;
		let scopes = cli.scopes.parse::<ScopeSet>()?;

		if scopes.is_empty() {
			return Err(ConfigError::EmptyScopes);
		}

		Ok(Self {
			descriptor,
			client_id: client_id.to_owned(),
			client_secret: client_secret.to_owned(),
			redirect_uri,
			scopes,
			listen: cli.listen,
			transport: cli.transport,
			token_timeout: std::time::Duration::from_secs(cli.token_timeout_secs.max(1)),
			api_timeout: std::time::Duration::from_secs(cli.api_timeout_secs.max(1)),
		})
	}

	/// Path the callback route is mounted on, taken from the redirect URI.
	pub fn callback_path(&self) -> &str {
		self.redirect_uri.path()
	}
}
impl Debug for GatewayConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GatewayConfig")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("scopes", &self.scopes)
			.field("listen", &self.listen)
			.field("transport", &self.transport)
			.finish_non_exhaustive()
	}
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ConfigError> {
	value.map(str::trim).filter(|v| !v.is_empty()).ok_or(ConfigError::Missing { name })
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { name, source })
}
