//! Authorization URL construction for the Authorization Code + PKCE grant.

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	error::ConfigError,
	pkce::PkceCodeChallengeMethod,
};

/// Builds the provider authorization URL a user must visit.
///
/// Existing query parameters on `endpoint` are preserved; the OAuth parameters are appended in
/// a fixed order. Scopes are sent joined by a single space in their configured order.
pub fn build_authorization_url(
	endpoint: &Url,
	client_id: &str,
	redirect_uri: &Url,
	scopes: &ScopeSet,
	state: &str,
	code_challenge: &str,
) -> Result<Url, ConfigError> {
	if client_id.is_empty() {
		return Err(ConfigError::Missing { name: "client-id" });
	}
	if scopes.is_empty() {
		return Err(ConfigError::EmptyScopes);
	}

	let mut url = endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());
	pairs.append_pair("scope", &scopes.joined());
	pairs.append_pair("state", state);
	pairs.append_pair("code_challenge", code_challenge);
	pairs.append_pair("code_challenge_method", PkceCodeChallengeMethod::S256.as_str());

	drop(pairs);

	Ok(url)
}

/// Static half of an authorization request, validated once at startup.
#[derive(Clone, Debug)]
pub struct AuthorizationTemplate {
	endpoint: Url,
	client_id: String,
	redirect_uri: Url,
	scopes: ScopeSet,
}
impl AuthorizationTemplate {
	/// Validates the static parameters so per-request rendering cannot fail.
	pub fn new(
		endpoint: Url,
		client_id: impl Into<String>,
		redirect_uri: Url,
		scopes: ScopeSet,
	) -> Result<Self, ConfigError> {
		let client_id = client_id.into();

		build_authorization_url(&endpoint, &client_id, &redirect_uri, &scopes, "", "")?;

		Ok(Self { endpoint, client_id, redirect_uri, scopes })
	}

	/// Renders the URL for one attempt.
	pub fn render(&self, state: &str, code_challenge: &str) -> Result<Url, ConfigError> {
		build_authorization_url(
			&self.endpoint,
			&self.client_id,
			&self.redirect_uri,
			&self.scopes,
			state,
			code_challenge,
		)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn endpoint() -> Url {
		Url::parse("https://www.design.example/api/oauth/authorize")
			.expect("Authorization endpoint fixture should parse.")
	}

	fn redirect() -> Url {
		Url::parse("http://127.0.0.1:3001/oauth/callback").expect("Redirect fixture should parse.")
	}

	#[test]
	fn parameters_are_emitted_in_order() {
		let scopes = ScopeSet::new(["design:content:read", "profile:read", "design:content:read"])
			.expect("Scope fixture should be valid.");
		let url = build_authorization_url(
			&endpoint(),
			"client-123",
			&redirect(),
			&scopes,
			"state-abc",
			"challenge-xyz",
		)
		.expect("Authorization URL should build.");
		let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
		let keys = pairs.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();

		assert_eq!(
			keys,
			[
				"response_type",
				"client_id",
				"redirect_uri",
				"scope",
				"state",
				"code_challenge",
				"code_challenge_method"
			]
		);
		assert_eq!(pairs[3].1, "design:content:read profile:read");
		assert_eq!(pairs[2].1, "http://127.0.0.1:3001/oauth/callback");
		assert_eq!(pairs[6].1, "S256");
	}

	#[test]
	fn rejects_missing_client_or_scopes() {
		let scopes = ScopeSet::new(["asset:read"]).expect("Scope fixture should be valid.");

		assert!(matches!(
			build_authorization_url(&endpoint(), "", &redirect(), &scopes, "s", "c"),
			Err(ConfigError::Missing { .. })
		));
		assert!(matches!(
			AuthorizationTemplate::new(endpoint(), "client", redirect(), ScopeSet::default()),
			Err(ConfigError::EmptyScopes)
		));
	}

	#[test]
	fn template_preserves_existing_query() {
		let endpoint = Url::parse("https://www.design.example/authorize?prompt=consent")
			.expect("Endpoint with query should parse.");
		let scopes = ScopeSet::new(["asset:read"]).expect("Scope fixture should be valid.");
		let template = AuthorizationTemplate::new(endpoint, "client", redirect(), scopes)
			.expect("Template should validate.");
		let url = template.render("st", "ch").expect("Template should render.");

		assert!(url.as_str().starts_with("https://www.design.example/authorize?prompt=consent&"));
		assert!(url.query_pairs().any(|(k, v)| k == "state" && v == "st"));
	}
}
