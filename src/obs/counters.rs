// self
use crate::{
	error::Rejection,
	obs::{FlowKind, FlowOutcome},
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_guard_flow_total",
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

/// Records a request rejection by its stable code (when enabled).
pub fn record_rejection(rejection: &Rejection) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("bearer_guard_rejection_total", "code" => rejection.code()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = rejection;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_is_a_no_op_without_a_recorder() {
		record_flow_outcome(FlowKind::Authentication, FlowOutcome::Failure);
		record_rejection(&Rejection::Revoked);
	}
}
