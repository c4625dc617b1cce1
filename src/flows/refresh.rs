//! Refresh orchestration with singleflight guards, CAS updates, and eviction on failure.
//!
//! Each refresh acquires the session's guard, re-reads the record (a racer that waited on the
//! guard finds the token already refreshed and reuses it), calls the token endpoint, and applies
//! the result through [`SessionStore::update_in_place`]. A failed refresh evicts the record so
//! the next call starts a new authorization, unless a newer sign-in replaced it meanwhile.

mod metrics;

pub use metrics::{RefreshMetrics, RefreshSnapshot};

// self
use crate::{
	_prelude::*,
	auth::{SessionId, SessionTokenRecord, TokenFreshness, TokenUpdate},
	flows::{AccessGrant, Gate, GateOutcome, REFRESH_BUFFER, common},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{CompareAndSwapOutcome, SessionStore},
};

impl Gate {
	/// Refreshes the session's token if it is still inside the refresh buffer.
	pub(crate) async fn refresh_session(&self, session: &SessionId) -> Result<GateOutcome> {
		let span = FlowSpan::new(FlowKind::Refresh, "refresh_session");
		let guard = common::flow_guard(&self.flow_guards, session);
		let result = span
			.instrument(async {
				let _singleflight = guard.lock().await;

				self.refresh_locked(session).await
			})
			.await;

		common::release_guard(&self.flow_guards, session, guard);

		result
	}

	async fn refresh_locked(&self, session: &SessionId) -> Result<GateOutcome> {
		const KIND: FlowKind = FlowKind::Refresh;

		let now = OffsetDateTime::now_utc();
		let Some(current) = <dyn SessionStore>::get(self.store.as_ref(), session).await? else {
			return self.start_authorization(session).map(GateOutcome::AuthorizationRequired);
		};
		let freshness = current.freshness_at(now, REFRESH_BUFFER);

		if freshness == TokenFreshness::Fresh {
			tracing::debug!(%session, "Token already refreshed by a concurrent call.");

			return Ok(GateOutcome::Authorized(AccessGrant::from(&current)));
		}

		let Some(refresh_token) = current.refresh_token.clone() else {
			if freshness == TokenFreshness::Expiring {
				return Ok(GateOutcome::Authorized(AccessGrant::from(&current)));
			}

			tracing::info!(%session, "Token expired without a refresh token; re-authorizing.");
			self.evict_stale(session, &current).await?;

			return self.start_authorization(session).map(GateOutcome::AuthorizationRequired);
		};

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let response = match self.exchange.refresh(&refresh_token).await {
			Ok(response) => response,
			Err(err) => {
				tracing::warn!(
					%session,
					error = %err,
					"Token refresh failed; evicting session tokens."
				);
				self.refresh_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				self.evict_stale(session, &current).await?;

				return Err(err);
			},
		};
		let update = TokenUpdate::from_response(response, OffsetDateTime::now_utc());
		let mut refreshed = current.clone();

		refreshed.apply(update.clone());

		let outcome = <dyn SessionStore>::update_in_place(
			self.store.as_ref(),
			session,
			refresh_token.expose(),
			update,
		)
		.await
		.inspect_err(|_| self.refresh_metrics.record_failure())?;
		let record = match outcome {
			CompareAndSwapOutcome::Updated => refreshed,
			CompareAndSwapOutcome::Missing => {
				<dyn SessionStore>::put(self.store.as_ref(), refreshed.clone()).await?;

				refreshed
			},
			CompareAndSwapOutcome::RefreshMismatch =>
				match <dyn SessionStore>::get(self.store.as_ref(), session).await? {
					Some(existing) => existing,
					None => {
						<dyn SessionStore>::put(self.store.as_ref(), refreshed.clone()).await?;

						refreshed
					},
				},
		};

		tracing::info!(%session, expires_at = %record.expires_at, "Token refreshed.");
		self.refresh_metrics.record_success();
		obs::record_flow_outcome(KIND, FlowOutcome::Success);

		Ok(GateOutcome::Authorized(AccessGrant::from(&record)))
	}

	/// Evicts `current` unless a newer authorization has already replaced it.
	async fn evict_stale(&self, session: &SessionId, current: &SessionTokenRecord) -> Result<()> {
		let evicted = <dyn SessionStore>::evict_if(
			self.store.as_ref(),
			session,
			current.access_token.expose(),
		)
		.await?;

		if evicted.is_some() {
			self.refresh_metrics.record_eviction();
		} else {
			tracing::debug!(%session, "Session re-authorized during refresh; keeping new tokens.");
		}

		Ok(())
	}
}
