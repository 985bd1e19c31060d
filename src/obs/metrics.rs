// self
use crate::obs::DispatchOutcome;

/// Records a dispatch outcome via the global metrics recorder (when enabled).
pub fn record_dispatch_outcome(outcome: DispatchOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("api_dispatcher_dispatch_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
