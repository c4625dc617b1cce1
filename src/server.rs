//! Inbound HTTP surface: the MCP endpoint, the OAuth redirect target, and a health probe.

// std
use std::{collections::HashSet, io, net::SocketAddr};
// crates.io
use axum::{
	Json, Router,
	body::Bytes,
	extract::{Query, State},
	http::{HeaderMap, HeaderValue, StatusCode},
	response::{Html, IntoResponse, Response},
	routing::{get, post},
};
use serde_json::json;
use tokio::{net::TcpListener, signal};
// self
use crate::{
	_prelude::*,
	auth::SessionId,
	mcp::{INVALID_REQUEST, JsonRpcRequest, JsonRpcResponse, McpHandler, SERVER_NAME},
};

/// Header carrying the MCP session identifier.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Shared state behind every route.
#[derive(Clone, Debug)]
pub struct AppState {
	handler: McpHandler,
	sessions: Arc<Mutex<HashSet<SessionId>>>,
}
impl AppState {
	/// Creates state with no known MCP sessions.
	pub fn new(handler: McpHandler) -> Self {
		Self { handler, sessions: Default::default() }
	}

	/// Registers a session minted outside HTTP, e.g. the stdio session.
	pub fn register_session(&self, session: SessionId) {
		self.sessions.lock().insert(session);
	}

	fn is_known(&self, session: &SessionId) -> bool {
		self.sessions.lock().contains(session)
	}
}

/// OAuth redirect query parameters.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
	/// Authorization code.
	pub code: Option<String>,
	/// Opaque state issued with the sign-in link.
	pub state: Option<String>,
	/// OAuth error code, when the user or provider declined.
	pub error: Option<String>,
	/// Human-readable error detail.
	pub error_description: Option<String>,
}

/// Builds the router; `callback_path` is the path component of the registered redirect URI.
pub fn router(state: AppState, callback_path: &str) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/mcp", post(mcp_post).delete(mcp_delete))
		.route(callback_path, get(oauth_callback))
		.with_state(state)
}

/// Binds `listen` and serves until Ctrl+C or SIGTERM.
pub async fn serve(
	state: AppState,
	listen: SocketAddr,
	callback_path: &str,
) -> Result<(), io::Error> {
	let listener = TcpListener::bind(listen).await?;

	tracing::info!(addr = %listener.local_addr()?, callback_path, "HTTP server listening.");

	axum::serve(listener, router(state, callback_path))
		.with_graceful_shutdown(shutdown_signal())
		.await
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			tracing::warn!(error = %e, "Ctrl+C handler unavailable.");
			std::future::pending::<()>().await;
		}
	};
	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			},
			Err(e) => {
				tracing::warn!(error = %e, "SIGTERM handler unavailable.");
				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}

	tracing::info!("Shutdown signal received.");
}

async fn health() -> Json<Value> {
	Json(json!({ "status": "ok", "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") }))
}

async fn mcp_post(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
	let request = match JsonRpcRequest::parse(&String::from_utf8_lossy(&body)) {
		Ok(request) => request,
		Err(response) => return (StatusCode::BAD_REQUEST, Json(response)).into_response(),
	};
	let session = if request.method == "initialize" {
		let session = SessionId::generate();

		state.register_session(session.clone());
		tracing::info!(%session, "MCP session initialized.");

		session
	} else {
		match session_from_headers(&state, &headers, &request) {
			Ok(session) => session,
			Err(response) => return response,
		}
	};

	match state.handler.handle(&session, request).await {
		Some(response) => with_session_header(Json(response).into_response(), &session),
		None => with_session_header(StatusCode::ACCEPTED.into_response(), &session),
	}
}

async fn mcp_delete(State(state): State<AppState>, headers: HeaderMap) -> Response {
	let Some(session) = header_session(&headers) else {
		return StatusCode::BAD_REQUEST.into_response();
	};

	if !state.sessions.lock().remove(&session) {
		return StatusCode::NOT_FOUND.into_response();
	}

	tracing::info!(%session, "MCP session closed.");

	StatusCode::NO_CONTENT.into_response()
}

async fn oauth_callback(
	State(state): State<AppState>,
	Query(params): Query<CallbackParams>,
) -> Response {
	let gate = &state.handler.gateway().gate;

	if let Some(error) = params.error {
		let denied = gate.deny_authorization(
			params.state.as_deref(),
			error,
			params.error_description.clone(),
		);

		return callback_page(
			StatusCode::BAD_REQUEST,
			"Sign-in was not completed",
			&denied.to_string(),
		);
	}

	let (Some(code), Some(oauth_state)) = (params.code, params.state) else {
		return callback_page(
			StatusCode::BAD_REQUEST,
			"Sign-in failed",
			"The redirect is missing its `code` or `state` parameter.",
		);
	};

	match gate.complete_authorization(&code, &oauth_state).await {
		Ok(_) => callback_page(
			StatusCode::OK,
			"Design account connected",
			"You can close this window and return to your assistant.",
		),
		Err(e) => {
			let status = match &e {
				Error::StateMismatch | Error::AuthorizationDenied { .. } => StatusCode::BAD_REQUEST,
				Error::ExchangeFailed(_) => StatusCode::BAD_GATEWAY,
				_ => StatusCode::INTERNAL_SERVER_ERROR,
			};

			callback_page(status, "Sign-in failed", &e.to_string())
		},
	}
}

fn session_from_headers(
	state: &AppState,
	headers: &HeaderMap,
	request: &JsonRpcRequest,
) -> Result<SessionId, Response> {
	let reject = |status: StatusCode, message: &str| {
		let body = JsonRpcResponse::error(request.id.clone(), INVALID_REQUEST, message);

		(status, Json(body)).into_response()
	};
	let Some(session) = header_session(headers) else {
		return Err(reject(StatusCode::BAD_REQUEST, "Missing or invalid `Mcp-Session-Id` header."));
	};

	if !state.is_known(&session) {
		return Err(reject(StatusCode::NOT_FOUND, "Unknown MCP session; initialize again."));
	}

	Ok(session)
}

fn header_session(headers: &HeaderMap) -> Option<SessionId> {
	headers.get(SESSION_HEADER)?.to_str().ok().and_then(|raw| SessionId::new(raw).ok())
}

fn with_session_header(mut response: Response, session: &SessionId) -> Response {
	if let Ok(value) = HeaderValue::from_str(session.as_str()) {
		response.headers_mut().insert(SESSION_HEADER, value);
	}

	response
}

fn callback_page(status: StatusCode, title: &str, detail: &str) -> Response {
	let page = format!(
		"<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
		 <body><h1>{title}</h1><p>{detail}</p></body></html>\n",
		title = escape_html(title),
		detail = escape_html(detail),
	);

	(status, Html(page)).into_response()
}

fn escape_html(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len());

	for c in raw.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			other => escaped.push(other),
		}
	}

	escaped
}
