mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use common::*;
use design_mcp_gateway::{
	error::{Error, TokenFailureKind},
	flows::GateOutcome,
	gateway::ToolOutcome,
	pkce,
	provider::ClientAuthMethod,
};

#[tokio::test]
async fn unauthenticated_call_returns_link_without_reaching_the_api() {
	let harness = Harness::start().await;
	let design_path = harness.api_path("designs/D1");
	let api = harness
		.server
		.mock_async(|when, then| {
			when.method(GET).path(design_path);
			then.status(200).body("{}");
		})
		.await;
	let session = session("session-a");
	let outcome = harness
		.gateway
		.call_tool(&session, "get_design", Some(json!({ "design_id": "D1" })))
		.await
		.expect("Unauthenticated tool call should not fail.");
	let ToolOutcome::AuthorizationRequired(prompt) = outcome else {
		panic!("Expected an authorization prompt, got {outcome:?}.");
	};
	let link = &prompt.authorize_url;

	api.assert_calls_async(0).await;

	assert_eq!(link.path(), AUTHORIZE_PATH);
	assert_eq!(query_param(link, "response_type").as_deref(), Some("code"));
	assert_eq!(query_param(link, "client_id").as_deref(), Some(CLIENT_ID));
	assert_eq!(query_param(link, "redirect_uri").as_deref(), Some(REDIRECT_URI));
	assert_eq!(query_param(link, "scope").as_deref(), Some("design:meta:read folder:read"));
	assert_eq!(query_param(link, "code_challenge_method").as_deref(), Some("S256"));
	assert_eq!(query_param(link, "state").map(|s| s.len()), Some(pkce::STATE_LEN));
	assert_eq!(query_param(link, "code_challenge").map(|c| c.len()), Some(43));
	assert!(prompt.message().contains(link.as_str()));
	assert!(harness.gate().pending.awaiting(&session));
}

#[tokio::test]
async fn callback_exchanges_code_and_unlocks_tools() {
	let harness = Harness::start().await;
	let token = harness
		.server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).header("authorization", BASIC_AUTH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("access-1", Some("refresh-1"), 3600));
		})
		.await;
	let profile_path = harness.api_path("users/me/profile");
	let profile = harness
		.server
		.mock_async(|when, then| {
			when.method(GET).path(profile_path).header("authorization", "Bearer access-1");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"profile":{"display_name":"Ada"}}"#);
		})
		.await;
	let session = session("session-b");
	let GateOutcome::AuthorizationRequired(prompt) =
		harness.gate().access(&session).await.expect("Gate should answer.")
	else {
		panic!("A session without tokens should be asked to authorize.");
	};
	let state = query_param(&prompt.authorize_url, "state").expect("Link should carry a state.");
	let authorized = harness
		.gate()
		.complete_authorization("code-1", &state)
		.await
		.expect("Code exchange should succeed.");

	token.assert_async().await;

	assert_eq!(authorized, session);

	let record = harness.stored(&session).await.expect("Record should be stored.");
	let expected = OffsetDateTime::now_utc() + Duration::seconds(3600);

	assert_eq!(record.access_token.expose(), "access-1");
	assert_eq!(record.refresh_token.as_ref().map(|s| s.expose()), Some("refresh-1"));
	assert!((record.expires_at - expected).abs() < Duration::seconds(5));

	let outcome = harness
		.gateway
		.call_tool(&session, "get_current_user", None)
		.await
		.expect("Authorized tool call should succeed.");

	profile.assert_async().await;

	let ToolOutcome::Data(value) = outcome else {
		panic!("Expected data, got {outcome:?}.");
	};

	assert_eq!(value["profile"]["display_name"], "Ada");

	let replay = harness.gate().complete_authorization("code-1", &state).await;

	assert!(matches!(replay, Err(Error::StateMismatch)));
	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn unknown_state_never_contacts_the_token_endpoint() {
	let harness = Harness::start().await;
	let token = harness
		.server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).body(token_body("unused", None, 3600));
		})
		.await;
	let result = harness.gate().complete_authorization("code", "forged-state").await;

	assert!(matches!(result, Err(Error::StateMismatch)));
	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn rejected_exchange_reports_status_and_oauth_error() {
	let harness = Harness::start().await;
	let token = harness
		.server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_grant","error_description":"Code expired"}"#);
		})
		.await;
	let session = session("session-c");
	let prompt = harness.gate().start_authorization(&session).expect("Link should be issued.");
	let state = query_param(&prompt.authorize_url, "state").expect("Link should carry a state.");
	let err = harness
		.gate()
		.complete_authorization("stale-code", &state)
		.await
		.expect_err("Rejected exchange should fail.");

	token.assert_async().await;

	let Error::ExchangeFailed(failure) = err else {
		panic!("Expected an exchange failure, got {err:?}.");
	};

	assert_eq!(failure.kind, TokenFailureKind::Rejected);
	assert_eq!(failure.status, Some(400));
	assert_eq!(failure.oauth_error.as_deref(), Some("invalid_grant"));
	assert!(failure.body.as_deref().is_some_and(|body| body.contains("Code expired")));
	assert!(harness.stored(&session).await.is_none());
}

#[tokio::test]
async fn success_without_expires_in_is_malformed() {
	let harness = Harness::start().await;

	harness
		.server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"a","token_type":"bearer"}"#);
		})
		.await;

	let session = session("session-d");
	let prompt = harness.gate().start_authorization(&session).expect("Link should be issued.");
	let state = query_param(&prompt.authorize_url, "state").expect("Link should carry a state.");
	let err = harness
		.gate()
		.complete_authorization("code", &state)
		.await
		.expect_err("A response without a lifetime should fail.");

	assert!(matches!(
		err,
		Error::ExchangeFailed(ref failure) if failure.kind == TokenFailureKind::Malformed
	));
	assert!(!err.to_string().contains("\"a\""));
	assert!(harness.stored(&session).await.is_none());
}

#[tokio::test]
async fn denied_authorization_discards_the_pending_entry() {
	let harness = Harness::start().await;
	let session = session("session-e");
	let prompt = harness.gate().start_authorization(&session).expect("Link should be issued.");
	let state = query_param(&prompt.authorize_url, "state").expect("Link should carry a state.");
	let denied = harness.gate().deny_authorization(
		Some(&state),
		"access_denied",
		Some("User cancelled".into()),
	);

	assert!(matches!(
		denied,
		Error::AuthorizationDenied { ref error, .. } if error == "access_denied"
	));
	assert!(!harness.gate().pending.awaiting(&session));
	assert!(matches!(
		harness.gate().complete_authorization("code", &state).await,
		Err(Error::StateMismatch)
	));
}

#[tokio::test]
async fn client_secret_post_omits_basic_header() {
	let harness = Harness::with_client_auth(ClientAuthMethod::ClientSecretPost).await;
	let basic = harness
		.server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).header_exists("authorization");
			then.status(500);
		})
		.await;
	let token = harness
		.server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("access-post", None, 600));
		})
		.await;
	let session = session("session-f");
	let prompt = harness.gate().start_authorization(&session).expect("Link should be issued.");
	let state = query_param(&prompt.authorize_url, "state").expect("Link should carry a state.");

	harness
		.gate()
		.complete_authorization("code", &state)
		.await
		.expect("Exchange with form credentials should succeed.");

	basic.assert_calls_async(0).await;
	token.assert_async().await;
}
