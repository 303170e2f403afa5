// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pipeline runs and their status taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::model::Repository;

/// Execution state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
	Queued,
	Waiting,
	Pending,
	InProgress,
	Completed,
	Requested,
}

impl RunStatus {
	/// Human-readable label.
	pub fn label(&self) -> &'static str {
		match self {
			RunStatus::Queued => "Queued",
			RunStatus::Waiting => "Waiting",
			RunStatus::Pending => "Pending",
			RunStatus::InProgress => "Running",
			RunStatus::Completed => "Completed",
			RunStatus::Requested => "Requested",
		}
	}
}

impl fmt::Display for RunStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl FromStr for RunStatus {
	type Err = UnknownValueError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"queued" => Ok(RunStatus::Queued),
			"waiting" => Ok(RunStatus::Waiting),
			"pending" => Ok(RunStatus::Pending),
			"in_progress" => Ok(RunStatus::InProgress),
			"completed" => Ok(RunStatus::Completed),
			"requested" => Ok(RunStatus::Requested),
			other => Err(UnknownValueError(other.to_string())),
		}
	}
}

/// Terminal outcome of a run. Only present when the status is
/// [`RunStatus::Completed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
	Success,
	Failure,
	Cancelled,
	Skipped,
	TimedOut,
	ActionRequired,
	Neutral,
	Stale,
}

impl RunConclusion {
	/// Human-readable label.
	pub fn label(&self) -> &'static str {
		match self {
			RunConclusion::Success => "Success",
			RunConclusion::Failure => "Failed",
			RunConclusion::Cancelled => "Cancelled",
			RunConclusion::Skipped => "Skipped",
			RunConclusion::TimedOut => "Timed Out",
			RunConclusion::ActionRequired => "Action Required",
			RunConclusion::Neutral => "Neutral",
			RunConclusion::Stale => "Stale",
		}
	}
}

impl fmt::Display for RunConclusion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl FromStr for RunConclusion {
	type Err = UnknownValueError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"success" => Ok(RunConclusion::Success),
			"failure" => Ok(RunConclusion::Failure),
			"cancelled" => Ok(RunConclusion::Cancelled),
			"skipped" => Ok(RunConclusion::Skipped),
			"timed_out" => Ok(RunConclusion::TimedOut),
			"action_required" => Ok(RunConclusion::ActionRequired),
			"neutral" => Ok(RunConclusion::Neutral),
			"stale" => Ok(RunConclusion::Stale),
			other => Err(UnknownValueError(other.to_string())),
		}
	}
}

/// Error for status/conclusion strings this version does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValueError(pub String);

impl fmt::Display for UnknownValueError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown value: {}", self.0)
	}
}

impl std::error::Error for UnknownValueError {}

/// Identifies one logical pipeline whose runs recur over time: the same
/// workflow in the same repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkflowKey {
	/// "owner/name" of the repository.
	pub repo_full_name: String,
	/// Provider-assigned workflow identifier.
	pub workflow_id: String,
}

impl WorkflowKey {
	pub fn new(repo_full_name: impl Into<String>, workflow_id: impl Into<String>) -> Self {
		Self {
			repo_full_name: repo_full_name.into(),
			workflow_id: workflow_id.into(),
		}
	}
}

impl fmt::Display for WorkflowKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.repo_full_name, self.workflow_id)
	}
}

/// One execution instance of a CI pipeline.
///
/// Invariant: `conclusion` is `Some` if and only if `status` is
/// [`RunStatus::Completed`]. Provider implementations are responsible for
/// upholding this when mapping wire data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
	/// Unique within its repository+provider.
	pub id: String,
	pub name: String,
	pub status: RunStatus,
	pub conclusion: Option<RunConclusion>,
	pub branch: String,
	pub commit_sha: String,
	pub commit_message: String,
	pub started_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
	pub url: Url,
	pub repository: Repository,
	pub triggered_by: String,
	/// Provider-assigned workflow id the run belongs to.
	pub workflow_id: String,
}

impl Run {
	/// The logical pipeline this run belongs to.
	pub fn workflow_key(&self) -> WorkflowKey {
		WorkflowKey::new(self.repository.full_name.clone(), self.workflow_id.clone())
	}

	/// First line of the commit message.
	pub fn display_title(&self) -> &str {
		self.commit_message
			.lines()
			.next()
			.unwrap_or(&self.commit_message)
	}

	pub fn is_running(&self) -> bool {
		matches!(
			self.status,
			RunStatus::InProgress | RunStatus::Queued | RunStatus::Waiting | RunStatus::Pending
		)
	}

	pub fn is_failed(&self) -> bool {
		matches!(
			self.conclusion,
			Some(RunConclusion::Failure)
				| Some(RunConclusion::TimedOut)
				| Some(RunConclusion::ActionRequired)
		)
	}

	pub fn is_successful(&self) -> bool {
		self.status == RunStatus::Completed && self.conclusion == Some(RunConclusion::Success)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil::run as sample_run;

	#[test]
	fn running_covers_all_pre_terminal_statuses() {
		for status in [
			RunStatus::InProgress,
			RunStatus::Queued,
			RunStatus::Waiting,
			RunStatus::Pending,
		] {
			assert!(sample_run("1", status, None).is_running(), "{status:?}");
		}

		assert!(!sample_run("1", RunStatus::Completed, Some(RunConclusion::Success)).is_running());
		assert!(!sample_run("1", RunStatus::Requested, None).is_running());
	}

	#[test]
	fn failed_covers_failure_timeout_and_action_required() {
		for conclusion in [
			RunConclusion::Failure,
			RunConclusion::TimedOut,
			RunConclusion::ActionRequired,
		] {
			let run = sample_run("1", RunStatus::Completed, Some(conclusion));
			assert!(run.is_failed(), "{conclusion:?}");
		}

		for conclusion in [
			RunConclusion::Success,
			RunConclusion::Cancelled,
			RunConclusion::Skipped,
			RunConclusion::Neutral,
			RunConclusion::Stale,
		] {
			let run = sample_run("1", RunStatus::Completed, Some(conclusion));
			assert!(!run.is_failed(), "{conclusion:?}");
		}
	}

	#[test]
	fn successful_requires_completed_status() {
		let run = sample_run("1", RunStatus::Completed, Some(RunConclusion::Success));
		assert!(run.is_successful());

		let running = sample_run("1", RunStatus::InProgress, None);
		assert!(!running.is_successful());
	}

	#[test]
	fn display_title_is_first_commit_line() {
		let run = sample_run("1", RunStatus::Completed, Some(RunConclusion::Success));
		assert_eq!(run.display_title(), "fix: align retry budget");
	}

	#[test]
	fn workflow_key_combines_repo_and_workflow() {
		let run = sample_run("1", RunStatus::Completed, Some(RunConclusion::Success));
		let key = run.workflow_key();
		assert_eq!(key, WorkflowKey::new("acme/api", "42"));
		assert_eq!(key.to_string(), "acme/api#42");
	}

	#[test]
	fn statuses_parse_from_wire_strings() {
		assert_eq!("in_progress".parse::<RunStatus>().unwrap(), RunStatus::InProgress);
		assert_eq!("queued".parse::<RunStatus>().unwrap(), RunStatus::Queued);
		assert!("mystery".parse::<RunStatus>().is_err());

		assert_eq!(
			"timed_out".parse::<RunConclusion>().unwrap(),
			RunConclusion::TimedOut
		);
		assert!("mystery".parse::<RunConclusion>().is_err());
	}
}
