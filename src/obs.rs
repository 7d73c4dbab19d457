//! Optional observability helpers for cache lookups and authenticated calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `mpesa_sdk.flow` with the `flow` and `stage` fields, plus
//!   events for cache transitions, re-authentication retries and best-effort store failures.
//! - Enable `metrics` to increment the `mpesa_sdk_flow_total` counter for every
//!   attempt/retry/success/failure, labeled by `flow` + `outcome`, and the
//!   `mpesa_sdk_cache_events_total` counter labeled by `event`.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Units of work observed by the SDK.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Credential lookup (memory, store, or authority).
	Credential,
	/// Authenticated call to a remote operation endpoint.
	Call,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Credential => "credential",
			FlowKind::Call => "call",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each unit of work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an SDK operation.
	Attempt,
	/// Second attempt after the remote API rejected the credential.
	Retry,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Retry => "retry",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Credential cache transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheEvent {
	/// Served from memory.
	Hit,
	/// Promoted from the persistent store.
	Restored,
	/// Issued by the remote authority.
	Acquired,
	/// Discarded from memory and store.
	Invalidated,
}
impl CacheEvent {
	/// Returns a stable label suitable for event or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheEvent::Hit => "hit",
			CacheEvent::Restored => "restored",
			CacheEvent::Acquired => "acquired",
			CacheEvent::Invalidated => "invalidated",
		}
	}
}
impl Display for CacheEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
