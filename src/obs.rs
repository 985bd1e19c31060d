//! Optional observability helpers for the dispatch pipeline.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `api_dispatcher.dispatch` with the `method`
//!   (raw `X-API-Method` value) and `stage` (call site) fields, plus debug/error events for
//!   authentication rejections and internal failures.
//! - Enable `metrics` to increment the `api_dispatcher_dispatch_total` counter for every
//!   finished dispatch, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// crates.io
use http::StatusCode;
// self
use crate::_prelude::*;

/// Outcome labels recorded for each dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
	/// CORS preflight answered without running the pipeline.
	Preflight,
	/// Handler executed and a 2xx response was produced.
	Success,
	/// Request refused with a 4xx status.
	Rejected,
	/// Request failed with a 5xx status.
	Failure,
}
impl DispatchOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DispatchOutcome::Preflight => "preflight",
			DispatchOutcome::Success => "success",
			DispatchOutcome::Rejected => "rejected",
			DispatchOutcome::Failure => "failure",
		}
	}

	/// Classifies a non-preflight response status.
	pub fn from_status(status: StatusCode) -> Self {
		if status.is_server_error() {
			DispatchOutcome::Failure
		} else if status.is_client_error() {
			DispatchOutcome::Rejected
		} else {
			DispatchOutcome::Success
		}
	}
}
impl Display for DispatchOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
