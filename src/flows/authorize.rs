//! Authorization Code + PKCE legs of the gate: issuing sign-in links and redeeming callbacks.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, SessionTokenRecord},
	flows::{AuthorizationPrompt, Gate},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl Gate {
	/// Registers a pending authorization for `session` and renders its sign-in link.
	///
	/// Earlier links for the same session stay valid until they expire or are used.
	pub fn start_authorization(&self, session: &SessionId) -> Result<AuthorizationPrompt> {
		const KIND: FlowKind = FlowKind::Authorization;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let grant = self.pending.begin(session);
		let authorize_url = match self.template.render(&grant.state, &grant.pkce.challenge) {
			Ok(url) => url,
			Err(e) => {
				self.pending.discard(&grant.state);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				return Err(e.into());
			},
		};

		tracing::info!(
			%session,
			expires_at = %grant.expires_at,
			"Authorization required; issued sign-in link."
		);
		obs::record_flow_outcome(KIND, FlowOutcome::Success);

		Ok(AuthorizationPrompt {
			session: session.clone(),
			authorize_url,
			expires_at: grant.expires_at,
		})
	}

	/// Redeems the provider redirect: consumes `state`, exchanges `code`, and stores the record.
	///
	/// Unknown, expired, or replayed states yield [`Error::StateMismatch`] without contacting the
	/// token endpoint. Returns the session that now holds tokens.
	pub async fn complete_authorization(&self, code: &str, state: &str) -> Result<SessionId> {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, "complete_authorization");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let claim = self.pending.consume(state)?;
				let response = self.exchange.exchange_code(code, &claim.verifier).await?;
				let record = SessionTokenRecord::from_response(
					claim.session.clone(),
					response,
					OffsetDateTime::now_utc(),
				);

				tracing::info!(
					session = %claim.session,
					expires_at = %record.expires_at,
					refreshable = record.refresh_token.is_some(),
					"Session authorized."
				);

				self.store.put(record).await?;

				Ok(claim.session)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(e) => {
				tracing::warn!(error = %e, "Authorization callback failed.");
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	/// Handles a redirect that carried `error=` instead of a code.
	///
	/// The matching pending entry is discarded so the link cannot be reused; no exchange happens.
	pub fn deny_authorization(
		&self,
		state: Option<&str>,
		error: impl Into<String>,
		description: Option<String>,
	) -> Error {
		let session = state.and_then(|state| self.pending.discard(state));
		let error = error.into();

		tracing::warn!(session = ?session, %error, "Provider denied the authorization request.");
		obs::record_flow_outcome(FlowKind::Callback, FlowOutcome::Failure);

		Error::AuthorizationDenied { error, description }
	}
}
