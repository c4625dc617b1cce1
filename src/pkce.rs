//! PKCE verifier/challenge generation (RFC 7636) and opaque random tokens.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Length of generated PKCE verifiers (RFC 7636 allows 43..=128).
pub const PKCE_VERIFIER_LEN: usize = 64;
/// Length of generated OAuth `state` values.
pub const STATE_LEN: usize = 32;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}
impl Display for PkceCodeChallengeMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fresh verifier plus its derived challenge. Never reused across attempts.
#[derive(Clone)]
pub struct PkcePair {
	/// Secret verifier sent only to the token endpoint.
	pub verifier: String,
	/// Public challenge sent on the authorization URL.
	pub challenge: String,
	/// Challenge method, always `S256`.
	pub method: PkceCodeChallengeMethod,
}
impl PkcePair {
	/// Generates a new verifier and its `S256` challenge.
	pub fn generate() -> Self {
		let verifier = generate_verifier();
		let challenge = challenge_for(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair")
			.field("verifier", &"<redacted>")
			.field("challenge", &self.challenge)
			.field("method", &self.method)
			.finish()
	}
}

/// Produces a high-entropy verifier using only unreserved URL characters.
pub fn generate_verifier() -> String {
	random_token(PKCE_VERIFIER_LEN)
}

/// Derives `base64url(SHA-256(verifier))` without padding.
pub fn challenge_for(verifier: &str) -> String {
	let digest = Sha256::digest(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(digest)
}

/// Returns `len` alphanumeric characters drawn from the thread-local CSPRNG.
pub fn random_token(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn challenge_matches_rfc7636_appendix_b() {
		assert_eq!(
			challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
			"E9Melhoa2OwvFr-MBFmstJZ4XRTr4Lbvaj6xJ6qUCIc"
		);
	}

	#[test]
	fn verifiers_are_url_safe_and_distinct() {
		let a = generate_verifier();
		let b = generate_verifier();

		assert_eq!(a.len(), PKCE_VERIFIER_LEN);
		assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(a, b);
	}

	#[test]
	fn pair_challenge_is_derived_from_verifier() {
		let pair = PkcePair::generate();

		assert_eq!(pair.challenge, challenge_for(&pair.verifier));
		assert_eq!(pair.challenge.len(), 43);
		assert!(!pair.challenge.contains('='));
		assert!(!format!("{pair:?}").contains(&pair.verifier));
	}
}
