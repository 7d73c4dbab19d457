// self
use crate::obs::{CacheEvent, FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"mpesa_sdk_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a cache transition via the global metrics recorder and a debug event (when enabled).
pub fn record_cache_event(event: CacheEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("mpesa_sdk_cache_events_total", "event" => event.as_str()).increment(1);
	}
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(event = event.as_str(), "credential cache transition");
	}

	#[cfg(not(any(feature = "metrics", feature = "tracing")))]
	{
		let _ = event;
	}
}
