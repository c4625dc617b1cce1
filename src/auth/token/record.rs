//! Per-session token record and the lifecycle checks the gate runs against it.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, TokenSecret},
	oauth::TokenResponse,
};

/// Where a record sits relative to the refresh buffer at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenFreshness {
	/// More than the buffer remains; use as-is.
	Fresh,
	/// Still valid but inside the buffer; refresh before use.
	Expiring,
	/// Past its expiry instant.
	Expired,
}

/// Fields replaced when a refresh succeeds.
#[derive(Clone, Debug)]
pub struct TokenUpdate {
	/// Newly minted access token.
	pub access_token: TokenSecret,
	/// Rotated refresh token, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the refresh response was received.
	pub issued_at: OffsetDateTime,
	/// New absolute expiry.
	pub expires_at: OffsetDateTime,
}
impl TokenUpdate {
	/// Derives the update from a refresh response received at `issued_at`.
	pub fn from_response(response: TokenResponse, issued_at: OffsetDateTime) -> Self {
		Self {
			expires_at: issued_at + response.expires_in,
			access_token: response.access_token,
			refresh_token: response.refresh_token,
			issued_at,
		}
	}
}

/// Current credentials of one authenticated session.
#[derive(Clone)]
pub struct SessionTokenRecord {
	/// Owning session.
	pub session: SessionId,
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the token response that produced the current access token was received.
	pub issued_at: OffsetDateTime,
	/// Absolute expiry of the current access token.
	pub expires_at: OffsetDateTime,
}
impl SessionTokenRecord {
	/// Builds the record for a code exchange response received at `issued_at`.
	///
	/// `expires_at` is derived exactly once here from the provider's relative lifetime.
	pub fn from_response(
		session: SessionId,
		response: TokenResponse,
		issued_at: OffsetDateTime,
	) -> Self {
		Self {
			session,
			expires_at: issued_at + response.expires_in,
			access_token: response.access_token,
			refresh_token: response.refresh_token,
			issued_at,
		}
	}

	/// Time left before expiry (negative once expired).
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}

	/// Returns `true` if the access token has expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Classifies the record against `buffer` at `instant`.
	pub fn freshness_at(&self, instant: OffsetDateTime, buffer: Duration) -> TokenFreshness {
		if self.is_expired_at(instant) {
			TokenFreshness::Expired
		} else if self.remaining_at(instant) < buffer {
			TokenFreshness::Expiring
		} else {
			TokenFreshness::Fresh
		}
	}

	/// Applies a refresh in place, keeping the previous refresh token when none was rotated.
	pub fn apply(&mut self, update: TokenUpdate) {
		self.access_token = update.access_token;
		self.issued_at = update.issued_at;
		self.expires_at = update.expires_at;

		if let Some(rotated) = update.refresh_token {
			self.refresh_token = Some(rotated);
		}
	}
}
impl Debug for SessionTokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionTokenRecord")
			.field("session", &self.session)
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn response(access: &str, refresh: Option<&str>, expires_in: Duration) -> TokenResponse {
		TokenResponse {
			access_token: TokenSecret::new(access),
			refresh_token: refresh.map(TokenSecret::new),
			expires_in,
		}
	}

	fn session() -> SessionId {
		SessionId::new("s1").expect("Session fixture should be valid.")
	}

	#[test]
	fn expiry_is_issued_at_plus_lifetime() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let record = SessionTokenRecord::from_response(
			session(),
			response("A", Some("R"), Duration::seconds(3600)),
			issued,
		);

		assert_eq!(record.expires_at, macros::datetime!(2025-01-01 01:00 UTC));
		assert_eq!(record.refresh_token.as_ref().map(TokenSecret::expose), Some("R"));
	}

	#[test]
	fn freshness_uses_strict_buffer_comparison() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let record = SessionTokenRecord::from_response(
			session(),
			response("A", Some("R"), Duration::minutes(30)),
			issued,
		);
		let buffer = Duration::minutes(5);

		assert_eq!(
			record.freshness_at(macros::datetime!(2025-01-01 00:20 UTC), buffer),
			TokenFreshness::Fresh
		);
		assert_eq!(
			record.freshness_at(macros::datetime!(2025-01-01 00:25 UTC), buffer),
			TokenFreshness::Fresh
		);
		assert_eq!(
			record.freshness_at(macros::datetime!(2025-01-01 00:26 UTC), buffer),
			TokenFreshness::Expiring
		);
		assert_eq!(
			record.freshness_at(macros::datetime!(2025-01-01 00:30 UTC), buffer),
			TokenFreshness::Expired
		);
	}

	#[test]
	fn apply_keeps_refresh_token_unless_rotated() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let mut record = SessionTokenRecord::from_response(
			session(),
			response("A", Some("R"), Duration::minutes(30)),
			issued,
		);
		let later = macros::datetime!(2025-01-01 00:28 UTC);

		record.apply(TokenUpdate::from_response(response("A2", None, Duration::hours(1)), later));

		assert_eq!(record.access_token.expose(), "A2");
		assert_eq!(record.refresh_token.as_ref().map(TokenSecret::expose), Some("R"));
		assert_eq!(record.expires_at, macros::datetime!(2025-01-01 01:28 UTC));

		record.apply(TokenUpdate::from_response(response("A3", Some("R3"), Duration::hours(1)), later));

		assert_eq!(record.refresh_token.as_ref().map(TokenSecret::expose), Some("R3"));
	}

	#[test]
	fn debug_output_redacts_tokens() {
		let record = SessionTokenRecord::from_response(
			session(),
			response("very-secret-access", Some("very-secret-refresh"), Duration::minutes(1)),
			OffsetDateTime::now_utc(),
		);
		let rendered = format!("{record:?}");

		assert!(!rendered.contains("very-secret"));
	}
}
