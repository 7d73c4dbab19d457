//! Payload builders for Daraja operations.
//!
//! Builders are plain data holders: [`StkPush::payload_at`] and friends are pure functions of the
//! builder state and the supplied instant, and the send helpers take any [`Executor`] so they can
//! be driven by an [`AuthenticatedCaller`] or a scripted fake.
//!
//! [`Executor`]: crate::caller::Executor
//! [`AuthenticatedCaller`]: crate::caller::AuthenticatedCaller

pub mod common;
pub mod stk;

pub use common::*;
pub use stk::*;

// self
use crate::_prelude::*;

/// Builder input errors raised before anything is sent.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Phone number is empty or whitespace only.
	#[error("Phone number cannot be empty.")]
	EmptyPhone,
	/// Phone number has fewer than the minimum number of characters.
	#[error("Phone number is too short: {length} characters, at least {minimum} required.")]
	PhoneTooShort {
		/// Trimmed length of the rejected input.
		length: usize,
		/// Minimum accepted length.
		minimum: usize,
	},
	/// A required builder field was not set.
	#[error("`{field}` is required.")]
	MissingField {
		/// Payload key of the missing field.
		field: &'static str,
	},
	/// A response lacks a field the caller needs.
	#[error("Response does not carry a string `{field}`.")]
	MissingResponseField {
		/// Response key that was absent or not a string.
		field: &'static str,
	},
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() { Err(ValidationError::MissingField { field }) } else { Ok(()) }
}
