//! Helpers shared by every payload builder.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use time::{UtcOffset, format_description::BorrowedFormatItem, macros};
// self
use crate::{_prelude::*, error::ConfigError, services::ValidationError};

/// Country code substituted for a leading `0` in local phone numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "254";
/// Minimum length of a phone number before cleaning.
pub const MIN_PHONE_LENGTH: usize = 9;
/// Offset of East Africa Time, the zone the remote API expects timestamps in.
pub const EAT: UtcOffset = macros::offset!(+3);

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
	macros::format_description!("[year][month][day][hour][minute][second]");

/// Renders `now` as `YYYYMMDDHHmmss` in East Africa Time.
pub fn timestamp(now: OffsetDateTime) -> Result<String, ConfigError> {
	Ok(now.to_offset(EAT).format(TIMESTAMP_FORMAT)?)
}

/// Builds the request password: base64 of short code, passkey and timestamp concatenated.
pub fn password(short_code: &str, passkey: &str, timestamp: &str) -> String {
	STANDARD.encode(format!("{short_code}{passkey}{timestamp}"))
}

/// Normalizes a phone number to the international digits-only form.
///
/// `+254 711 223 344` and `0711223344` both become `254711223344`.
pub fn clean_phone_number(phone: &str, country_code: &str) -> Result<String, ValidationError> {
	let phone = phone.trim();

	if phone.is_empty() {
		return Err(ValidationError::EmptyPhone);
	}

	let length = phone.chars().count();

	if length < MIN_PHONE_LENGTH {
		return Err(ValidationError::PhoneTooShort { length, minimum: MIN_PHONE_LENGTH });
	}

	let digits = |s: &str| s.chars().filter(char::is_ascii_digit).collect::<String>();

	Ok(if let Some(rest) = phone.strip_prefix('+') {
		digits(rest)
	} else if let Some(rest) = phone.strip_prefix('0') {
		format!("{country_code}{}", digits(rest))
	} else {
		digits(phone)
	})
}

/// Timestamp/password pair stamped on a payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PasswordStamp {
	pub(crate) timestamp: String,
	pub(crate) password: String,
}
impl PasswordStamp {
	pub(crate) fn at(short_code: &str, passkey: &str, now: OffsetDateTime) -> Result<Self, ConfigError> {
		let timestamp = timestamp(now)?;
		let password = password(short_code, passkey, &timestamp);

		Ok(Self { timestamp, password })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn timestamp_uses_east_africa_time() {
		let now = macros::datetime!(2025-01-31 22:04:05 UTC);

		assert_eq!(timestamp(now).expect("Timestamp should format."), "20250201010405");
	}

	#[test]
	fn password_concatenates_before_encoding() {
		assert_eq!(
			password("174379", "passkey", "20250101000000"),
			STANDARD.encode("174379passkey20250101000000"),
		);
	}

	#[test]
	fn phone_numbers_are_normalized() {
		assert_eq!(clean_phone_number("0711223344", "254").as_deref(), Ok("254711223344"));
		assert_eq!(clean_phone_number("+254 711-223-344", "254").as_deref(), Ok("254711223344"));
		assert_eq!(clean_phone_number(" 254711223344 ", "254").as_deref(), Ok("254711223344"));
		assert_eq!(clean_phone_number("0711 223 344", "255").as_deref(), Ok("255711223344"));
	}

	#[test]
	fn short_or_empty_phone_numbers_are_rejected() {
		assert_eq!(clean_phone_number("   ", "254"), Err(ValidationError::EmptyPhone));
		assert_eq!(
			clean_phone_number("07112233", "254"),
			Err(ValidationError::PhoneTooShort { length: 8, minimum: MIN_PHONE_LENGTH })
		);
	}
}
