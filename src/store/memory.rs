//! Thread-safe in-memory [`SessionStore`]; records live exactly as long as the process.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, SessionTokenRecord, TokenUpdate},
	store::{CompareAndSwapOutcome, SessionStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<SessionId, SessionTokenRecord>>>;

/// Process-local storage backend keyed by MCP session.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of sessions that currently hold a record.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no session holds a record.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn put_now(map: &StoreMap, record: SessionTokenRecord) -> Result<(), StoreError> {
		map.write().insert(record.session.clone(), record);

		Ok(())
	}

	fn cas_now(
		map: &StoreMap,
		session: &SessionId,
		expected_refresh: &str,
		update: TokenUpdate,
	) -> CompareAndSwapOutcome {
		let mut guard = map.write();

		match guard.get_mut(session) {
			Some(existing)
				if existing.refresh_token.as_ref().map(|secret| secret.expose())
					== Some(expected_refresh) =>
			{
				existing.apply(update);

				CompareAndSwapOutcome::Updated
			},
			Some(_) => CompareAndSwapOutcome::RefreshMismatch,
			None => CompareAndSwapOutcome::Missing,
		}
	}

	fn evict_if_now(
		map: &StoreMap,
		session: &SessionId,
		expected_access: &str,
	) -> Option<SessionTokenRecord> {
		let mut guard = map.write();

		if guard.get(session)?.access_token.expose() != expected_access {
			return None;
		}

		guard.remove(session)
	}
}
impl SessionStore for MemoryStore {
	fn get<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, Option<SessionTokenRecord>> {
		Box::pin(async move { Ok(self.0.read().get(session).cloned()) })
	}

	fn put(&self, record: SessionTokenRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move { Self::put_now(&self.0, record) })
	}

	fn update_in_place<'a>(
		&'a self,
		session: &'a SessionId,
		expected_refresh: &'a str,
		update: TokenUpdate,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move { Ok(Self::cas_now(&self.0, session, expected_refresh, update)) })
	}

	fn evict<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, Option<SessionTokenRecord>> {
		Box::pin(async move { Ok(self.0.write().remove(session)) })
	}

	fn evict_if<'a>(
		&'a self,
		session: &'a SessionId,
		expected_access: &'a str,
	) -> StoreFuture<'a, Option<SessionTokenRecord>> {
		Box::pin(async move { Ok(Self::evict_if_now(&self.0, session, expected_access)) })
	}
}
