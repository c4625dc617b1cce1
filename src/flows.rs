//! Authenticated request gate: the per-session OAuth 2.0 + PKCE lifecycle.
//!
//! A protected call asks [`Gate::access`] for a bearer token. Sessions without a record get an
//! [`AuthorizationPrompt`] instead; sessions whose token expires within [`REFRESH_BUFFER`] are
//! refreshed first under a per-session singleflight guard, so concurrent callers observe a single
//! refresh and the same resulting token.

pub mod authorize;
pub mod common;
pub mod refresh;

pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{SessionId, SessionTokenRecord, TokenFreshness, TokenSecret},
	authorize::AuthorizationTemplate,
	oauth::TokenExchange,
	pending::PendingRegistry,
	store::SessionStore,
};

/// Remaining lifetime below which a token is refreshed before use.
pub const REFRESH_BUFFER: Duration = Duration::minutes(5);

/// Bearer credentials released to a protected call.
#[derive(Clone, Debug)]
pub struct AccessGrant {
	/// Session the token belongs to.
	pub session: SessionId,
	/// Access token to send as `Authorization: Bearer`.
	pub access_token: TokenSecret,
	/// Absolute expiry of `access_token`.
	pub expires_at: OffsetDateTime,
}
impl From<&SessionTokenRecord> for AccessGrant {
	fn from(record: &SessionTokenRecord) -> Self {
		Self {
			session: record.session.clone(),
			access_token: record.access_token.clone(),
			expires_at: record.expires_at,
		}
	}
}

/// Sign-in link returned in place of running a protected call.
#[derive(Clone, Debug)]
pub struct AuthorizationPrompt {
	/// Session the authorization will populate.
	pub session: SessionId,
	/// Provider URL the user must open.
	pub authorize_url: Url,
	/// Instant after which the link's callback is rejected.
	pub expires_at: OffsetDateTime,
}
impl AuthorizationPrompt {
	/// User-facing instructions carrying the authorization URL.
	pub fn message(&self) -> String {
		format!(
			"Authorization required. Open this link to connect your design account, then retry: {}",
			self.authorize_url
		)
	}
}

/// Result of asking the gate for access.
#[derive(Clone, Debug)]
pub enum GateOutcome {
	/// A valid token is available; run the call.
	Authorized(AccessGrant),
	/// The user must authorize first; the call is not run or queued.
	AuthorizationRequired(AuthorizationPrompt),
}

/// Coarse lifecycle state of a session, free of token material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
	/// No record and no pending authorization.
	Unauthenticated,
	/// An authorization URL was issued and the callback has not arrived.
	AwaitingCallback,
	/// A record exists.
	Authenticated {
		/// Expiry of the current access token.
		expires_at: OffsetDateTime,
	},
	/// A refresh is in flight for the session.
	Refreshing,
}
impl SessionState {
	/// Stable label used in status reports.
	pub fn as_str(self) -> &'static str {
		match self {
			SessionState::Unauthenticated => "UNAUTHENTICATED",
			SessionState::AwaitingCallback => "AWAITING_CALLBACK",
			SessionState::Authenticated { .. } => "AUTHENTICATED",
			SessionState::Refreshing => "REFRESHING",
		}
	}
}

/// Gates protected operations behind a valid per-session token.
pub struct Gate {
	/// Token records keyed by session.
	pub store: Arc<dyn SessionStore>,
	/// Outstanding authorizations keyed by `state`.
	pub pending: Arc<PendingRegistry>,
	/// Token endpoint client.
	pub exchange: Arc<dyn TokenExchange>,
	/// Static authorization request parameters.
	pub template: AuthorizationTemplate,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	flow_guards: common::FlowGuards,
}
impl Gate {
	/// Creates a gate with a fresh pending registry.
	pub fn new(
		store: Arc<dyn SessionStore>,
		exchange: Arc<dyn TokenExchange>,
		template: AuthorizationTemplate,
	) -> Self {
		Self {
			store,
			pending: Default::default(),
			exchange,
			template,
			refresh_metrics: Default::default(),
			flow_guards: Default::default(),
		}
	}

	/// Returns a bearer token for `session`, refreshing it first when it is about to lapse.
	///
	/// A session without a record gets a fresh [`AuthorizationPrompt`]. A refresh failure evicts
	/// the record and surfaces [`Error::RefreshFailed`]; the next call starts a new authorization.
	pub async fn access(&self, session: &SessionId) -> Result<GateOutcome> {
		let Some(record) = self.store.get(session).await? else {
			return self.start_authorization(session).map(GateOutcome::AuthorizationRequired);
		};

		match record.freshness_at(OffsetDateTime::now_utc(), REFRESH_BUFFER) {
			TokenFreshness::Fresh => Ok(GateOutcome::Authorized(AccessGrant::from(&record))),
			TokenFreshness::Expiring | TokenFreshness::Expired => self.refresh_session(session).await,
		}
	}

	/// Reports the lifecycle state of `session` without touching the provider.
	pub async fn state(&self, session: &SessionId) -> Result<SessionState> {
		if common::is_locked(&self.flow_guards, session) {
			return Ok(SessionState::Refreshing);
		}
		if let Some(record) = self.store.get(session).await? {
			return Ok(SessionState::Authenticated { expires_at: record.expires_at });
		}
		if self.pending.awaiting(session) {
			return Ok(SessionState::AwaitingCallback);
		}

		Ok(SessionState::Unauthenticated)
	}
}
impl Debug for Gate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gate")
			.field("template", &self.template)
			.field("pending", &self.pending.len())
			.field("refresh_metrics", &self.refresh_metrics)
			.finish_non_exhaustive()
	}
}
