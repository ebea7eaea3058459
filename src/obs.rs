//! Observability helpers for guard flows.
//!
//! Flows run inside spans named `bearer_guard.flow` carrying the `flow` and `stage` fields.
//! Enable the `metrics` feature to increment `bearer_guard_flow_total` (labeled by `flow` and
//! `outcome`) and `bearer_guard_rejection_total` (labeled by `code`).

mod counters;
mod span;

pub use counters::*;
pub use span::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Global admission bucket.
	Admission,
	/// Per-request authentication.
	Authentication,
	/// Password sign-in.
	Login,
	/// External credential refresh.
	Refresh,
	/// Authorization-code exchange for an external credential.
	Connect,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Admission => "admission",
			FlowKind::Authentication => "authentication",
			FlowKind::Login => "login",
			FlowKind::Refresh => "refresh",
			FlowKind::Connect => "connect",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
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
