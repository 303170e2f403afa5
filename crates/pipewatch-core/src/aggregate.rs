// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Run deduplication and aggregate status computation.
//!
//! All status computation and display filtering happens on the
//! latest-per-workflow view, never on the raw run list: a workflow that
//! failed yesterday but passed an hour ago is healthy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;

use crate::run::{Run, WorkflowKey};

/// Single-value summary of all currently tracked workflows' health.
///
/// Derived from a run set, never stored independently of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateStatus {
	AllPassing,
	SomeRunning,
	SomeFailing,
	NoData,
	/// Reserved for orchestrator-level failures; run content never maps
	/// here (fetch failures downgrade to `NoData` when no prior data
	/// exists).
	Error,
}

impl fmt::Display for AggregateStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			AggregateStatus::AllPassing => "all passing",
			AggregateStatus::SomeRunning => "some running",
			AggregateStatus::SomeFailing => "some failing",
			AggregateStatus::NoData => "no data",
			AggregateStatus::Error => "error",
		};
		f.write_str(label)
	}
}

/// Missing start times sort as the earliest possible instant.
fn start_or_min(run: &Run) -> DateTime<Utc> {
	run.started_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Sort runs by start time descending, most recent first.
///
/// Stable, so provider order is preserved among ties.
pub fn sort_by_start_desc(runs: &mut [Run]) {
	runs.sort_by_key(|run| Reverse(start_or_min(run)));
}

/// Reduce a run set to the most recent run per logical workflow.
///
/// For duplicate [`WorkflowKey`]s the run with the strictly larger start
/// time wins; the incumbent survives ties. Grouping goes through an ordered
/// map so the result is deterministic for a given input, independent of
/// input order beyond the tie rule.
pub fn latest_per_workflow(runs: &[Run]) -> Vec<Run> {
	let mut latest: BTreeMap<WorkflowKey, &Run> = BTreeMap::new();

	for run in runs {
		match latest.entry(run.workflow_key()) {
			std::collections::btree_map::Entry::Vacant(entry) => {
				entry.insert(run);
			}
			std::collections::btree_map::Entry::Occupied(mut entry) => {
				if start_or_min(run) > start_or_min(entry.get()) {
					entry.insert(run);
				}
			}
		}
	}

	let mut result: Vec<Run> = latest.into_values().cloned().collect();
	sort_by_start_desc(&mut result);
	result
}

/// Compute the aggregate status over the latest-per-workflow set.
///
/// Strict priority: empty → no data; any failed → failing; any running →
/// running; otherwise all passing.
pub fn aggregate_status(latest: &[Run]) -> AggregateStatus {
	if latest.is_empty() {
		return AggregateStatus::NoData;
	}

	if latest.iter().any(Run::is_failed) {
		AggregateStatus::SomeFailing
	} else if latest.iter().any(Run::is_running) {
		AggregateStatus::SomeRunning
	} else {
		AggregateStatus::AllPassing
	}
}

/// Group runs by repository full name, preserving the input order within
/// each group.
pub fn runs_by_repository(runs: &[Run]) -> BTreeMap<String, Vec<Run>> {
	let mut grouped: BTreeMap<String, Vec<Run>> = BTreeMap::new();
	for run in runs {
		grouped
			.entry(run.repository.full_name.clone())
			.or_default()
			.push(run.clone());
	}
	grouped
}

/// The most recent run of each repository, most recent first.
pub fn latest_run_per_repository(runs: &[Run]) -> Vec<Run> {
	let mut result: Vec<Run> = runs_by_repository(runs)
		.into_values()
		.filter_map(|group| group.into_iter().max_by_key(|run| start_or_min(run)))
		.collect();
	sort_by_start_desc(&mut result);
	result
}

pub fn failed_runs(runs: &[Run]) -> Vec<Run> {
	runs.iter().filter(|r| r.is_failed()).cloned().collect()
}

pub fn running_runs(runs: &[Run]) -> Vec<Run> {
	runs.iter().filter(|r| r.is_running()).cloned().collect()
}

pub fn successful_runs(runs: &[Run]) -> Vec<Run> {
	runs.iter().filter(|r| r.is_successful()).cloned().collect()
}
