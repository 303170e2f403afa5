// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Edge-triggered alerting on pipeline status transitions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;
use url::Url;

use pipewatch_core::{Run, RunConclusion, WorkflowKey};

/// One alert ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
	pub title: String,
	/// Identity + branch, e.g. "acme/api: CI on main has failed".
	pub body: String,
	/// Deep link to the run.
	pub url: Url,
}

/// Delivery target for alerts. Fire-and-forget: implementations are
/// best-effort and the notifier neither retries nor confirms delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync {
	async fn deliver(&self, alert: Alert);
}

/// Sink that writes alerts to the log. Used by the headless CLI.
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
	async fn deliver(&self, alert: Alert) {
		info!(title = %alert.title, body = %alert.body, url = %alert.url, "alert");
	}
}

/// Diff engine that turns run conclusions into alerts.
///
/// Transition state is keyed by [`WorkflowKey`], not by run id: a rerun
/// gets a fresh run id, and run-id keying would miss the recovery edge of a
/// workflow that fails in one run and passes in the next. Keying by
/// workflow display name instead would conflate identically named workflows
/// across repositories. State lives for the monitor process only.
pub struct Notifier {
	sink: Arc<dyn NotificationSink>,
	last_conclusions: HashMap<WorkflowKey, RunConclusion>,
}

impl Notifier {
	pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
		Self {
			sink,
			last_conclusions: HashMap::new(),
		}
	}

	/// Evaluate one freshly fetched run set (the raw set, not the
	/// deduplicated view) against the recorded conclusions.
	///
	/// Runs are walked in ascending start-time order so per-workflow state
	/// advances chronologically when one fetch carries several completed
	/// runs of the same workflow. Runs without a conclusion (still running)
	/// leave the recorded state untouched.
	pub async fn observe(&mut self, runs: &[Run]) {
		let mut completed: Vec<&Run> = runs.iter().filter(|r| r.conclusion.is_some()).collect();
		completed.sort_by_key(|r| r.started_at.unwrap_or(DateTime::<Utc>::MIN_UTC));

		for run in completed {
			let conclusion = match run.conclusion {
				Some(conclusion) => conclusion,
				None => continue,
			};
			let key = run.workflow_key();
			let previous = self.last_conclusions.get(&key).copied();

			if conclusion == RunConclusion::Failure && previous != Some(RunConclusion::Failure) {
				self.sink.deliver(failure_alert(run)).await;
			}

			if conclusion == RunConclusion::Success && previous == Some(RunConclusion::Failure) {
				self.sink.deliver(recovery_alert(run)).await;
			}

			self.last_conclusions.insert(key, conclusion);
		}
	}
}

fn failure_alert(run: &Run) -> Alert {
	Alert {
		title: "Pipeline failed".to_string(),
		body: format!(
			"{}: {} on {} has failed",
			run.repository.full_name, run.name, run.branch
		),
		url: run.url.clone(),
	}
}

fn recovery_alert(run: &Run) -> Alert {
	Alert {
		title: "Pipeline recovered".to_string(),
		body: format!(
			"{}: {} on {} is now passing",
			run.repository.full_name, run.name, run.branch
		),
		url: run.url.clone(),
	}
}
