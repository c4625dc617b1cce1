// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::{ClientAuthMethod, ProviderDescriptor, ProviderEndpoints},
};

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug, Default)]
pub struct ProviderDescriptorBuilder {
	/// Authorization endpoint users are sent to.
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint used for exchanges and refreshes.
	pub token_endpoint: Option<Url>,
	/// Base URL of the proxied REST API.
	pub api_base_url: Option<Url>,
	/// Client authentication method for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
}
impl ProviderDescriptorBuilder {
	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the REST API base URL.
	pub fn api_base_url(mut self, url: Url) -> Self {
		self.api_base_url = Some(url);

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ConfigError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ConfigError::Missing { name: "authorization-endpoint" })?;
		let token = self.token_endpoint.ok_or(ConfigError::Missing { name: "token-endpoint" })?;
		let api_base = self.api_base_url.ok_or(ConfigError::Missing { name: "api-base-url" })?;

		validate_endpoint("authorization", &authorization)?;
		validate_endpoint("token", &token)?;
		validate_endpoint("API base", &api_base)?;

		if api_base.cannot_be_a_base() {
			return Err(ConfigError::CannotBeBase { name: "API base", url: api_base.to_string() });
		}

		Ok(ProviderDescriptor {
			endpoints: ProviderEndpoints { authorization, token, api_base },
			client_auth_method: self.client_auth_method,
		})
	}
}

/// Requires HTTPS, allowing plain HTTP only for loopback hosts.
pub fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ConfigError::InsecureUrl { name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("URL fixture should parse.")
	}

	#[test]
	fn build_requires_every_endpoint() {
		let err = ProviderDescriptor::builder()
			.authorization_endpoint(url("https://design.example/authorize"))
			.api_base_url(url("https://api.design.example/rest/"))
			.build()
			.expect_err("Missing token endpoint should fail.");

		assert!(matches!(err, ConfigError::Missing { name: "token-endpoint" }));
	}

	#[test]
	fn plain_http_is_limited_to_loopback() {
		assert!(validate_endpoint("token", &url("http://127.0.0.1:8080/token")).is_ok());
		assert!(validate_endpoint("token", &url("http://localhost/token")).is_ok());
		assert!(validate_endpoint("token", &url("http://[::1]/token")).is_ok());
		assert!(matches!(
			validate_endpoint("token", &url("http://design.example/token")),
			Err(ConfigError::InsecureUrl { .. })
		));
	}

	#[test]
	fn builds_valid_descriptor() {
		let descriptor = ProviderDescriptor::builder()
			.authorization_endpoint(url("https://design.example/authorize"))
			.token_endpoint(url("https://api.design.example/oauth/token"))
			.api_base_url(url("https://api.design.example/rest/"))
			.client_auth_method(ClientAuthMethod::ClientSecretPost)
			.build()
			.expect("Descriptor should build.");

		assert_eq!(descriptor.client_auth_method.as_str(), "client_secret_post");
		assert_eq!(descriptor.endpoints.api_base.path(), "/rest/");
	}
}
