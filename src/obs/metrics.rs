// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counter incremented once per flow stage outcome.
pub const FLOW_COUNTER: &str = "design_gateway_flow_total";
/// Counter of design API responses, labeled by HTTP status class.
pub const DOWNSTREAM_COUNTER: &str = "design_gateway_downstream_responses_total";

/// Counts a flow outcome when the `metrics` feature is enabled.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_COUNTER, "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Counts a design API response by status class (`2xx`, `4xx`, ..., or `none` without a reply).
pub fn record_downstream_status(status: Option<u16>) {
	let class = status_class(status);

	#[cfg(feature = "metrics")]
	metrics::counter!(DOWNSTREAM_COUNTER, "status" => class).increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = class;
}

fn status_class(status: Option<u16>) -> &'static str {
	match status {
		Some(100..=199) => "1xx",
		Some(200..=299) => "2xx",
		Some(300..=399) => "3xx",
		Some(400..=499) => "4xx",
		Some(_) => "5xx",
		None => "none",
	}
}
