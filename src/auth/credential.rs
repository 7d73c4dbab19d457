//! Cached bearer credentials and the lifetime policy applied to authority-reported expiries.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Seconds shaved off the authority-reported lifetime for long-lived tokens.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

/// Bearer token usable until its expiry instant.
///
/// Instants are kept at whole-second precision so a credential survives a round-trip through the
/// persisted `{token, expires_at, created_at}` layout unchanged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PersistedCredential", try_from = "PersistedCredential")]
pub struct Credential {
	/// Bearer token value; callers must avoid logging it.
	pub token: TokenSecret,
	/// Instant at which the cache stops handing the token out.
	pub expires_at: OffsetDateTime,
	/// Instant at which the token was acquired.
	pub created_at: OffsetDateTime,
}
impl Credential {
	/// Builds a credential acquired at `now` whose authority-reported lifetime is `expires_in`
	/// seconds, applying [`effective_lifetime`].
	///
	/// Returns `None` when the resulting expiry falls outside the representable date range.
	pub fn issue(token: impl Into<String>, expires_in: i64, now: OffsetDateTime) -> Option<Self> {
		let created_at = truncate_to_second(now);
		let expires_at =
			created_at.checked_add(Duration::seconds(effective_lifetime(expires_in)))?;

		Some(Self { token: TokenSecret::new(token), expires_at, created_at })
	}

	/// Returns `true` if the credential may still be attached to calls at `instant`.
	pub fn is_usable_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}

	/// Cached lifetime granted at acquisition.
	pub fn ttl(&self) -> Duration {
		self.expires_at - self.created_at
	}

	/// Time left before the credential expires at `instant` (zero once expired).
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.field("created_at", &self.created_at)
			.finish()
	}
}

/// On-disk layout of a [`Credential`]: unix seconds for both instants.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct PersistedCredential {
	token: String,
	expires_at: i64,
	created_at: i64,
}
impl From<Credential> for PersistedCredential {
	fn from(value: Credential) -> Self {
		Self {
			token: value.token.expose().to_owned(),
			expires_at: value.expires_at.unix_timestamp(),
			created_at: value.created_at.unix_timestamp(),
		}
	}
}
impl TryFrom<PersistedCredential> for Credential {
	type Error = time::error::ComponentRange;

	fn try_from(value: PersistedCredential) -> Result<Self, Self::Error> {
		Ok(Self {
			token: TokenSecret::new(value.token),
			expires_at: OffsetDateTime::from_unix_timestamp(value.expires_at)?,
			created_at: OffsetDateTime::from_unix_timestamp(value.created_at)?,
		})
	}
}

/// Converts an authority-reported lifetime (seconds) into the lifetime the cache honors.
///
/// Lifetimes above [`EXPIRY_BUFFER_SECS`] lose the buffer, shorter ones are halved, and the result
/// is never below one second.
pub fn effective_lifetime(expires_in: i64) -> i64 {
	let lifetime = if expires_in > EXPIRY_BUFFER_SECS {
		expires_in - EXPIRY_BUFFER_SECS
	} else if expires_in > 1 {
		expires_in / 2
	} else {
		1
	};

	lifetime.max(1)
}

fn truncate_to_second(instant: OffsetDateTime) -> OffsetDateTime {
	instant - Duration::nanoseconds(i64::from(instant.nanosecond()))
}
