// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The published monitor state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, AggregateStatus};
use crate::run::Run;

/// The full current view of every tracked pipeline.
///
/// Replaced wholesale each refresh cycle; never partially mutated.
/// Observers receive it through a watch channel, so it is cheap-enough to
/// clone and carries errors as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
	/// The raw fetched run set, sorted by start time descending.
	pub runs: Vec<Run>,
	/// Aggregate status derived from the latest-per-workflow view of
	/// `runs`.
	pub status: AggregateStatus,
	pub last_refresh: Option<DateTime<Utc>>,
	/// Last cycle-level error, if any. A failed cycle records its error
	/// here but retains the previous runs and status.
	pub last_error: Option<String>,
}

impl Default for MonitorSnapshot {
	fn default() -> Self {
		Self {
			runs: Vec::new(),
			status: AggregateStatus::NoData,
			last_refresh: None,
			last_error: None,
		}
	}
}

impl MonitorSnapshot {
	/// Build a snapshot from a freshly fetched run set.
	pub fn from_runs(runs: Vec<Run>, refreshed_at: DateTime<Utc>) -> Self {
		let status = aggregate::aggregate_status(&aggregate::latest_per_workflow(&runs));
		Self {
			runs,
			status,
			last_refresh: Some(refreshed_at),
			last_error: None,
		}
	}

	/// The canonical deduplicated view, most recent first.
	pub fn latest_per_workflow(&self) -> Vec<Run> {
		aggregate::latest_per_workflow(&self.runs)
	}

	pub fn failed_runs(&self) -> Vec<Run> {
		aggregate::failed_runs(&self.latest_per_workflow())
	}

	pub fn running_runs(&self) -> Vec<Run> {
		aggregate::running_runs(&self.latest_per_workflow())
	}

	pub fn successful_runs(&self) -> Vec<Run> {
		aggregate::successful_runs(&self.latest_per_workflow())
	}

	pub fn is_empty(&self) -> bool {
		self.runs.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::run::{RunConclusion, RunStatus};
	use crate::testutil::{run_in, started};
	use chrono::TimeZone;

	#[test]
	fn default_snapshot_is_empty_no_data() {
		let snapshot = MonitorSnapshot::default();
		assert!(snapshot.is_empty());
		assert_eq!(snapshot.status, AggregateStatus::NoData);
		assert!(snapshot.last_refresh.is_none());
		assert!(snapshot.last_error.is_none());
	}

	#[test]
	fn from_runs_derives_status_from_deduplicated_view() {
		let t1 = Utc.with_ymd_and_hms(2026, 8, 1, 1, 0, 0).unwrap();
		let t2 = Utc.with_ymd_and_hms(2026, 8, 1, 2, 0, 0).unwrap();

		// Raw set contains a failure, but the newer run of the same
		// workflow succeeded: status must come from the latest view.
		let runs = vec![
			started(
				run_in("acme/api", "42", "old", RunStatus::Completed, Some(RunConclusion::Failure)),
				t1,
			),
			started(
				run_in("acme/api", "42", "new", RunStatus::Completed, Some(RunConclusion::Success)),
				t2,
			),
		];

		let snapshot = MonitorSnapshot::from_runs(runs, t2);
		assert_eq!(snapshot.status, AggregateStatus::AllPassing);
		assert_eq!(snapshot.runs.len(), 2, "raw set is preserved");
		assert_eq!(snapshot.latest_per_workflow().len(), 1);
		assert_eq!(snapshot.last_refresh, Some(t2));
	}

	#[test]
	fn two_aggregations_of_the_same_runs_are_identical() {
		let t = Utc.with_ymd_and_hms(2026, 8, 1, 1, 0, 0).unwrap();
		let runs = vec![
			started(run_in("acme/api", "42", "1", RunStatus::InProgress, None), t),
			started(
				run_in("acme/web", "7", "2", RunStatus::Completed, Some(RunConclusion::Failure)),
				t,
			),
		];

		let a = MonitorSnapshot::from_runs(runs.clone(), t);
		let b = MonitorSnapshot::from_runs(runs, t);
		assert_eq!(a, b);
	}
}
