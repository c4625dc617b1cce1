//! Command-line interface; every flag also reads a `DESIGN_GATEWAY_*` environment variable.

// std
use std::net::SocketAddr;
// crates.io
use clap::{Parser, ValueEnum};
// self
use crate::{
	api::DEFAULT_API_TIMEOUT, http::DEFAULT_TOKEN_TIMEOUT, obs::LogFormat,
	provider::ClientAuthMethod,
};

const DEFAULT_SCOPES: &str = concat!(
	"profile:read design:meta:read design:content:read design:content:write ",
	"folder:read folder:write asset:read"
);

/// Transport the MCP endpoint is served on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Transport {
	/// Streamable HTTP at `/mcp`.
	#[default]
	Http,
	/// Newline-delimited JSON-RPC on stdin/stdout.
	Stdio,
}

/// MCP gateway for the design platform with OAuth 2.0 + PKCE session handling.
#[derive(Debug, Parser)]
#[command(name = "design-mcp-gateway", version, about, long_about = None)]
pub struct Cli {
	/// OAuth client identifier.
	#[arg(long, env = "DESIGN_GATEWAY_CLIENT_ID")]
	pub client_id: Option<String>,

	/// OAuth client secret.
	#[arg(long, env = "DESIGN_GATEWAY_CLIENT_SECRET", hide_env_values = true)]
	pub client_secret: Option<String>,

	/// Redirect URI registered with the provider; its path is served by the callback route.
	#[arg(
		long,
		env = "DESIGN_GATEWAY_REDIRECT_URI",
		default_value = "http://127.0.0.1:3001/oauth/callback"
	)]
	pub redirect_uri: String,

	/// Provider authorization endpoint.
	#[arg(long, env = "DESIGN_GATEWAY_AUTHORIZATION_ENDPOINT")]
	pub authorization_endpoint: Option<String>,

	/// Provider token endpoint.
	#[arg(
		long,
		env = "DESIGN_GATEWAY_TOKEN_ENDPOINT")]
	pub token_endpoint: Option<String>,

	/// Base URL of the design REST API.
	#[arg(long, env = "DESIGN_GATEWAY_API_BASE_URL")]
	pub api_base_url: Option<String>,

	/// Space- or comma-separated scopes requested on every authorization.
	#[arg(
		long,
		env = "DESIGN_GATEWAY_SCOPES",
		default_value = DEFAULT_SCOPES
	)]
	pub scopes: String,

	/// Client authentication method at the token endpoint.
	#[arg(long, env = "DESIGN_GATEWAY_CLIENT_AUTH", default_value = "client_secret_basic")]
	pub client_auth: ClientAuthMethod,

	/// Address the HTTP server (MCP and OAuth callback) binds to.
	#[arg(long, env = "DESIGN_GATEWAY_LISTEN", default_value = "127.0.0.1:3001")]
	pub listen: SocketAddr,

	/// MCP transport.
	#[arg(long, env = "DESIGN_GATEWAY_TRANSPORT", value_enum, default_value_t = Transport::Http)]
	pub transport: Transport,

	/// Token endpoint timeout in seconds.
	#[arg(
		long,
		env = "DESIGN_GATEWAY_TOKEN_TIMEOUT_SECS",
		default_value_t = DEFAULT_TOKEN_TIMEOUT.as_secs()
	)]
	pub token_timeout_secs: u64,

	/// Design API timeout in seconds.
	#[arg(
		long,
		env = "DESIGN_GATEWAY_API_TIMEOUT_SECS",
		default_value_t = DEFAULT_API_TIMEOUT.as_secs()
	)]
	pub api_timeout_secs: u64,

	/// Log level or filter directive; `RUST_LOG` wins when set.
	#[arg(long, env = "DESIGN_GATEWAY_LOG_LEVEL", default_value = "info")]
	pub log_level: String,

	/// Log format (text, json).
	#[arg(long, env = "DESIGN_GATEWAY_LOG_FORMAT", default_value = "text")]
	pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_apply_when_only_required_flags_are_given() {
		let cli = Cli::try_parse_from([
			"design-mcp-gateway",
			"--client-id",
			"cid",
			"--transport",
			"stdio",
			"--client-auth",
			"client_secret_post",
		])
		.expect("Arguments should parse.");

		assert_eq!(cli.client_id.as_deref(), Some("cid"));
		assert_eq!(cli.transport, Transport::Stdio);
		assert_eq!(cli.client_auth, ClientAuthMethod::ClientSecretPost);
		assert_eq!(cli.token_timeout_secs, 10);
		assert_eq!(cli.log_format, LogFormat::Text);
	}

	#[test]
	fn clap_definition_is_consistent() {
		use clap::CommandFactory;

		Cli::command().debug_assert();
	}
}
