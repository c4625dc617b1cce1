//! Shared fixtures: an httpmock provider/API and a gateway wired against it.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use reqwest::{Client as ReqwestClient, redirect::Policy};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use design_mcp_gateway::{
	api::DesignApiClient,
	auth::{ScopeSet, SessionId, SessionTokenRecord, TokenSecret},
	authorize::AuthorizationTemplate,
	flows::Gate,
	gateway::Gateway,
	http::{DEFAULT_TOKEN_TIMEOUT, ReqwestHttpClient},
	oauth::TokenExchangeClient,
	provider::{ClientAuthMethod, ProviderDescriptor},
	store::{MemoryStore, SessionStore},
};

pub const CLIENT_ID: &str = "client-it";
pub const CLIENT_SECRET: &str = "secret-it";
pub const TOKEN_PATH: &str = "/oauth/token";
pub const AUTHORIZE_PATH: &str = "/oauth/authorize";
pub const API_PREFIX: &str = "/rest/v1";
pub const REDIRECT_URI: &str = "http://127.0.0.1:3001/oauth/callback";
/// `base64("client-it:secret-it")`.
pub const BASIC_AUTH: &str = "Basic Y2xpZW50LWl0OnNlY3JldC1pdA==";

pub struct Harness {
	pub server: MockServer,
	pub store: Arc<MemoryStore>,
	pub gateway: Arc<Gateway>,
}
impl Harness {
	pub async fn start() -> Self {
		Self::with_client_auth(ClientAuthMethod::ClientSecretBasic).await
	}

	pub async fn with_client_auth(method: ClientAuthMethod) -> Self {
		let server = MockServer::start_async().await;
		let descriptor = ProviderDescriptor::builder()
			.authorization_endpoint(url(&server.url(AUTHORIZE_PATH)))
			.token_endpoint(url(&server.url(TOKEN_PATH)))
			.api_base_url(url(&server.url(format!("{API_PREFIX}/"))))
			.client_auth_method(method)
			.build()
			.expect("Mock provider descriptor should build.");
		let redirect = url(REDIRECT_URI);
		let exchange = <TokenExchangeClient>::new(
			&descriptor,
			CLIENT_ID,
			CLIENT_SECRET,
			&redirect,
			ReqwestHttpClient::with_client(test_reqwest_client()),
		)
		.expect("Token exchange client should build.");
		let template = AuthorizationTemplate::new(
			descriptor.endpoints.authorization.clone(),
			CLIENT_ID,
			redirect,
			ScopeSet::new(["design:meta:read", "folder:read"])
				.expect("Scope fixture should be valid."),
		)
		.expect("Authorization template should validate.");
		let store = Arc::new(MemoryStore::default());
		let gate = Gate::new(store.clone(), Arc::new(exchange), template);
		let api =
			DesignApiClient::with_client(test_reqwest_client(), descriptor.endpoints.api_base.clone());
		let gateway = Arc::new(Gateway::new(Arc::new(gate), api));

		Self { server, store, gateway }
	}

	pub fn gate(&self) -> &Gate {
		&self.gateway.gate
	}

	/// Stores a record whose access token expires `remaining` from now.
	pub async fn seed(
		&self,
		session: &SessionId,
		access: &str,
		refresh: Option<&str>,
		remaining: Duration,
	) {
		let issued_at = OffsetDateTime::now_utc() - Duration::minutes(30);
		let record = SessionTokenRecord {
			session: session.clone(),
			access_token: TokenSecret::new(access),
			refresh_token: refresh.map(TokenSecret::new),
			issued_at,
			expires_at: OffsetDateTime::now_utc() + remaining,
		};

		self.store.put(record).await.expect("Seeding the memory store should succeed.");
	}

	pub async fn stored(&self, session: &SessionId) -> Option<SessionTokenRecord> {
		self.store.get(session).await.expect("Reading the memory store should succeed.")
	}

	pub fn api_path(&self, path: &str) -> String {
		format!("{API_PREFIX}/{path}")
	}
}

/// Reqwest client that accepts the self-signed certificates served by `httpmock`.
///
/// Redirects stay disabled, matching the production token client.
pub fn test_reqwest_client() -> ReqwestClient {
	ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(Policy::none())
		.timeout(DEFAULT_TOKEN_TIMEOUT)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.")
}

pub fn url(raw: &str) -> Url {
	Url::parse(raw).expect("URL fixture should parse.")
}

pub fn session(raw: &str) -> SessionId {
	SessionId::new(raw).expect("Session fixture should be valid.")
}

/// Successful token endpoint payload; `oauth2` requires `token_type`.
pub fn token_body(access: &str, refresh: Option<&str>, expires_in: i64) -> String {
	let mut body = json!({ "access_token": access, "token_type": "bearer", "expires_in": expires_in });

	if let Some(refresh) = refresh {
		body["refresh_token"] = json!(refresh);
	}

	body.to_string()
}

/// Value of `name` in the URL's query string.
pub fn query_param(url: &Url, name: &str) -> Option<String> {
	url.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
}
