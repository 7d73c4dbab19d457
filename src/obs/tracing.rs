// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by the cache and the caller.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("mpesa_sdk.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a warning for a persistence failure the cache chose to tolerate.
pub fn record_store_failure(stage: &'static str, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(stage, error = %error, "credential store failure ignored");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, error);
	}
}

/// Emits an event when a call is retried with a fresh credential after a 401.
pub fn record_reauthentication(route: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(route, "remote API rejected the credential; retrying once with a fresh one");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = route;
	}
}

/// Emits a warning when the authority reported an unusable `expires_in`.
pub fn record_lifetime_fallback(raw: Option<&str>, fallback_secs: i64) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(raw, fallback_secs, "authority sent an unusable expires_in; using fallback");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (raw, fallback_secs);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Call, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn event_helpers_accept_any_display() {
		record_store_failure("test", &"disk full");
		record_reauthentication("/mpesa/stkpush/v1/processrequest");
		record_lifetime_fallback(Some("soon"), 300);
	}
}
