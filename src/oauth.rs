//! Token endpoint client for code exchanges and refreshes.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError,
	TokenResponse as _, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TokenEndpointError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{ClientAuthMethod, GrantType, ProviderDescriptor},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Boxed future returned by [`TokenExchange`] implementations.
pub type ExchangeFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenResponse>> + 'a + Send>>;

/// Validated token endpoint response.
#[derive(Clone, Debug)]
pub struct TokenResponse {
	/// Newly issued access token.
	pub access_token: TokenSecret,
	/// Refresh token, when the provider issued or rotated one.
	pub refresh_token: Option<TokenSecret>,
	/// Relative lifetime of the access token; always positive.
	pub expires_in: Duration,
}

/// Token endpoint operations the gate depends on.
///
/// Failures are reported as [`Error::ExchangeFailed`] or [`Error::RefreshFailed`]; nothing is
/// retried.
pub trait TokenExchange
where
	Self: Send + Sync,
{
	/// Redeems an authorization code together with its PKCE verifier.
	fn exchange_code<'a>(&'a self, code: &'a str, verifier: &'a str) -> ExchangeFuture<'a>;

	/// Trades a refresh token for a new access token.
	fn refresh<'a>(&'a self, refresh_token: &'a TokenSecret) -> ExchangeFuture<'a>;
}

/// [`TokenExchange`] backed by the `oauth2` crate's basic client.
pub struct TokenExchangeClient<C = ReqwestHttpClient>
where
	C: TokenHttpClient,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	client_id: String,
	token_url: Url,
}
impl<C> TokenExchangeClient<C>
where
	C: TokenHttpClient,
{
	/// Configures the client for the descriptor's endpoints and client authentication method.
	pub fn new(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: &str,
		redirect_uri: &Url,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self, ConfigError> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidUrl { name: "authorization", source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidUrl { name: "token", source })?;
		let redirect_url = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidUrl { name: "redirect", source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url);

		if matches!(descriptor.client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self {
			oauth_client,
			http_client: http_client.into(),
			client_id: client_id.to_owned(),
			token_url: descriptor.endpoints.token.clone(),
		})
	}
}
impl<C> TokenExchange for TokenExchangeClient<C>
where
	C: TokenHttpClient,
{
	fn exchange_code<'a>(&'a self, code: &'a str, verifier: &'a str) -> ExchangeFuture<'a> {
		const GRANT: GrantType = GrantType::AuthorizationCode;

		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let response = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()))
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error::<C>(GRANT, meta.take(), err))?;

			map_token_response(GRANT, meta.take(), response)
		})
	}

	fn refresh<'a>(&'a self, refresh_token: &'a TokenSecret) -> ExchangeFuture<'a> {
		const GRANT: GrantType = GrantType::RefreshToken;

		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
			let response = self
				.oauth_client
				.exchange_refresh_token(&refresh_secret)
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error::<C>(GRANT, meta.take(), err))?;

			map_token_response(GRANT, meta.take(), response)
		})
	}
}
impl<C> Debug for TokenExchangeClient<C>
where
	C: TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenExchangeClient")
			.field("client_id", &self.client_id)
			.field("token_url", &self.token_url.as_str())
			.finish_non_exhaustive()
	}
}

fn map_token_response(
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	response: BasicTokenResponse,
) -> Result<TokenResponse> {
	let status = meta_status(meta.as_ref());
	let malformed = |message: &str| {
		Error::token_endpoint(grant, TokenEndpointError::malformed(status, message))
	};
	let expires_in = response
		.expires_in()
		.ok_or_else(|| malformed("Token response is missing `expires_in`."))?
		.as_secs();
	let expires_in = i64::try_from(expires_in)
		.map_err(|_| malformed("Token response `expires_in` is out of range."))?;

	if expires_in <= 0 {
		return Err(malformed("Token response `expires_in` must be positive."));
	}

	Ok(TokenResponse {
		access_token: TokenSecret::new(response.access_token().secret().to_owned()),
		refresh_token: response
			.refresh_token()
			.map(|token| TokenSecret::new(token.secret().to_owned())),
		expires_in: Duration::seconds(expires_in),
	})
}

fn map_request_error<C>(
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<C::TransportError>>,
) -> Error
where
	C: TokenHttpClient,
{
	let status = meta_status(meta.as_ref());
	let body = meta.and_then(|value| value.body);
	let rejected = status.is_some_and(|code| !(200..300).contains(&code));
	let failure = match err {
		RequestTokenError::ServerResponse(response) => map_server_response(status, response),
		RequestTokenError::Request(error) => map_transport_error::<C>(error),
		RequestTokenError::Parse(error, raw) => {
			let message = format!("Token endpoint returned an unparseable response: {error}.");

			// Success payloads may carry tokens, so only error bodies are kept.
			match (rejected, body.is_some()) {
				(true, false) => TokenEndpointError::rejected(status, message)
					.with_body(String::from_utf8_lossy(&raw)),
				(true, true) => TokenEndpointError::rejected(status, message),
				(false, _) => TokenEndpointError::malformed(status, message),
			}
		},
		RequestTokenError::Other(message) => {
			let message = format!("Token endpoint returned an unexpected response: {message}.");

			if rejected {
				TokenEndpointError::rejected(status, message)
			} else {
				TokenEndpointError::malformed(status, message)
			}
		},
	};
	let failure = match body {
		Some(body) => failure.with_body(body),
		None => failure,
	};

	Error::token_endpoint(grant, failure)
}

fn map_server_response(status: Option<u16>, response: BasicErrorResponse) -> TokenEndpointError {
	let code = response.error().as_ref().to_string();
	let message = match response.error_description() {
		Some(description) => format!("Token endpoint returned an OAuth error: {description}."),
		None => format!("Token endpoint returned an OAuth error: {code}."),
	};

	TokenEndpointError::rejected(status, message).with_oauth_error(code)
}

fn map_transport_error<C>(err: HttpClientError<C::TransportError>) -> TokenEndpointError
where
	C: TokenHttpClient,
{
	match err {
		HttpClientError::Reqwest(inner) if C::is_timeout(&inner) =>
			TokenEndpointError::unreachable("Request timed out while calling the token endpoint."),
		HttpClientError::Reqwest(inner) => TokenEndpointError::unreachable(format!(
			"Token endpoint could not be reached: {inner}."
		)),
		HttpClientError::Http(inner) => TokenEndpointError::unreachable(format!(
			"Token request could not be built: {inner}."
		)),
		HttpClientError::Io(inner) => TokenEndpointError::unreachable(format!(
			"I/O error while calling the token endpoint: {inner}."
		)),
		HttpClientError::Other(message) => TokenEndpointError::unreachable(format!(
			"HTTP client error occurred while calling the token endpoint: {message}."
		)),
		_ => TokenEndpointError::unreachable(
			"HTTP client error occurred while calling the token endpoint.",
		),
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}
