//! Short-lived registry correlating OAuth `state` values with the session and PKCE verifier
//! that started the authorization.

// self
use crate::{
	_prelude::*,
	auth::SessionId,
	pkce::{self, PkcePair},
};

/// Maximum age of a pending authorization before it is treated as unknown.
pub const PENDING_TTL: Duration = Duration::minutes(10);

/// Error returned when a `state` has no live entry.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PendingError {
	/// The state was never issued, already consumed, or expired.
	#[error("No pending authorization matches the provided state.")]
	NotFound,
}
impl From<PendingError> for Error {
	fn from(_: PendingError) -> Self {
		Error::StateMismatch
	}
}

/// State and PKCE material handed back when an authorization begins.
#[derive(Clone, Debug)]
pub struct PendingGrant {
	/// Opaque value that must round-trip through the redirect.
	pub state: String,
	/// Verifier kept in the registry; its challenge goes on the authorization URL.
	pub pkce: PkcePair,
	/// Instant after which the callback will no longer be accepted.
	pub expires_at: OffsetDateTime,
}

/// Session and verifier released by a successful [`PendingRegistry::consume`].
#[derive(Clone)]
pub struct PendingClaim {
	/// Session that started the authorization.
	pub session: SessionId,
	/// PKCE verifier to present at the token endpoint.
	pub verifier: String,
}
impl Debug for PendingClaim {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingClaim")
			.field("session", &self.session)
			.field("verifier", &"<redacted>")
			.finish()
	}
}

#[derive(Clone)]
struct PendingAuthorization {
	session: SessionId,
	verifier: String,
	created_at: OffsetDateTime,
}
impl Debug for PendingAuthorization {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingAuthorization")
			.field("session", &self.session)
			.field("created_at", &self.created_at)
			.finish_non_exhaustive()
	}
}

/// In-process map of `state` to pending authorization.
///
/// Entries are swept lazily on every begin and consume; an entry older than [`PENDING_TTL`] is reported as
/// missing even if the sweep has not removed it yet.
#[derive(Debug, Default)]
pub struct PendingRegistry {
	entries: Mutex<HashMap<String, PendingAuthorization>>,
}
impl PendingRegistry {
	/// Starts an authorization for `session` at the current time.
	pub fn begin(&self, session: &SessionId) -> PendingGrant {
		self.begin_at(session, OffsetDateTime::now_utc())
	}

	/// Sweeps expired entries, then starts an authorization for `session` stamped with `now`.
	pub fn begin_at(&self, session: &SessionId, now: OffsetDateTime) -> PendingGrant {
		let pair = PkcePair::generate();
		let mut entries = self.entries.lock();

		entries.retain(|_, entry| !is_stale(entry, now));

		let mut state = pkce::random_token(pkce::STATE_LEN);

		while entries.contains_key(&state) {
			state = pkce::random_token(pkce::STATE_LEN);
		}

		let entry = PendingAuthorization {
			session: session.clone(),
			verifier: pair.verifier.clone(),
			created_at: now,
		};

		entries.insert(state.clone(), entry);

		PendingGrant { state, pkce: pair, expires_at: now + PENDING_TTL }
	}

	/// Consumes `state` at the current time.
	pub fn consume(&self, state: &str) -> Result<PendingClaim, PendingError> {
		self.consume_at(state, OffsetDateTime::now_utc())
	}

	/// Sweeps expired entries, then removes and returns the entry for `state`.
	pub fn consume_at(&self, state: &str, now: OffsetDateTime) -> Result<PendingClaim, PendingError> {
		let mut entries = self.entries.lock();

		entries.retain(|_, entry| !is_stale(entry, now));

		let entry = entries.remove(state).ok_or(PendingError::NotFound)?;

		Ok(PendingClaim { session: entry.session, verifier: entry.verifier })
	}

	/// Drops the entry for `state` without exchanging it.
	pub fn discard(&self, state: &str) -> Option<SessionId> {
		self.entries.lock().remove(state).map(|entry| entry.session)
	}

	/// Returns `true` if `session` has a live pending authorization.
	pub fn awaiting(&self, session: &SessionId) -> bool {
		self.awaiting_at(session, OffsetDateTime::now_utc())
	}

	/// Like [`Self::awaiting`], evaluated at `now`.
	pub fn awaiting_at(&self, session: &SessionId, now: OffsetDateTime) -> bool {
		self.entries.lock().values().any(|entry| &entry.session == session && !is_stale(entry, now))
	}

	/// Number of entries currently held, including stale ones not yet swept.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Returns `true` when no entries are held.
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

fn is_stale(entry: &PendingAuthorization, now: OffsetDateTime) -> bool {
	now - entry.created_at > PENDING_TTL
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn session(id: &str) -> SessionId {
		SessionId::new(id).expect("Session fixture should be valid.")
	}

	#[test]
	fn consume_is_single_use() {
		let registry = PendingRegistry::default();
		let grant = registry.begin(&session("s1"));
		let claim = registry.consume(&grant.state).expect("Fresh state should be consumable.");

		assert_eq!(claim.session.as_str(), "s1");
		assert_eq!(claim.verifier, grant.pkce.verifier);
		assert_eq!(registry.consume(&grant.state).map(|_| ()), Err(PendingError::NotFound));
	}

	#[test]
	fn entries_expire_after_ttl() {
		let registry = PendingRegistry::default();
		let start = OffsetDateTime::now_utc();
		let grant = registry.begin_at(&session("s1"), start);

		assert!(registry.awaiting_at(&session("s1"), start + Duration::minutes(9)));
		assert!(!registry.awaiting_at(&session("s1"), start + Duration::minutes(11)));
		assert_eq!(
			registry.consume_at(&grant.state, start + Duration::minutes(11)).map(|_| ()),
			Err(PendingError::NotFound)
		);
		assert!(registry.is_empty());
	}

	#[test]
	fn sweep_removes_only_stale_entries() {
		let registry = PendingRegistry::default();
		let start = OffsetDateTime::now_utc();

		registry.begin_at(&session("old"), start);

		let fresh = registry.begin_at(&session("new"), start + Duration::minutes(8));

		assert!(registry.consume_at("unknown", start + Duration::minutes(12)).is_err());
		assert_eq!(registry.len(), 1);
		assert!(registry.consume_at(&fresh.state, start + Duration::minutes(12)).is_ok());
	}

	#[test]
	fn begin_sweeps_abandoned_entries() {
		let registry = PendingRegistry::default();
		let start = OffsetDateTime::now_utc() - Duration::hours(2);

		for _ in 0..100 {
			registry.begin_at(&session("abandoned"), start);
		}

		assert_eq!(registry.len(), 100);

		registry.begin(&session("s1"));

		assert_eq!(registry.len(), 1);
		assert!(!registry.awaiting(&session("abandoned")));
	}

	#[test]
	fn states_are_distinct_per_attempt() {
		let registry = PendingRegistry::default();
		let a = registry.begin(&session("s1"));
		let b = registry.begin(&session("s1"));

		assert_ne!(a.state, b.state);
		assert_ne!(a.pkce.verifier, b.pkce.verifier);
		assert_eq!(a.state.len(), pkce::STATE_LEN);
		assert_eq!(registry.discard(&a.state).map(String::from), Some("s1".to_owned()));
		assert!(registry.awaiting(&session("s1")));
	}

	#[test]
	fn not_found_maps_to_state_mismatch() {
		assert!(matches!(Error::from(PendingError::NotFound), Error::StateMismatch));
	}
}
