//! Storage contract and the in-process store for per-session token records.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{SessionId, SessionTokenRecord, TokenUpdate},
};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for session token records.
///
/// Every operation is atomic with respect to the others, so the gate never observes a partially
/// applied refresh.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Fetches the record for `session`, if present.
	fn get<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, Option<SessionTokenRecord>>;

	/// Inserts or replaces the record keyed by its session.
	fn put(&self, record: SessionTokenRecord) -> StoreFuture<'_, ()>;

	/// Applies `update` only if the stored refresh token still equals `expected_refresh`.
	fn update_in_place<'a>(
		&'a self,
		session: &'a SessionId,
		expected_refresh: &'a str,
		update: TokenUpdate,
	) -> StoreFuture<'a, CompareAndSwapOutcome>;

	/// Removes the record for `session`, returning it if one existed.
	fn evict<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, Option<SessionTokenRecord>>;

	/// Removes the record only if its access token still equals `expected_access`.
	///
	/// A record written by a newer authorization is left untouched and `None` is returned.
	fn evict_if<'a>(
		&'a self,
		session: &'a SessionId,
		expected_access: &'a str,
	) -> StoreFuture<'a, Option<SessionTokenRecord>>;
}

/// Result of a refresh-token compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The refresh secret matched the expected value and the record was updated.
	Updated,
	/// The record exists but the expected refresh secret did not match.
	RefreshMismatch,
	/// No record exists for the session.
	Missing,
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
