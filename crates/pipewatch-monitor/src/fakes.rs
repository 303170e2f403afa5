// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory fakes for the provider and sink contracts (testing only).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use pipewatch_core::{
	Account, CiProvider, Organization, ProviderError, ProviderKind, Repository, Result, Run,
	RunConclusion, RunStatus,
};

use crate::notifier::{Alert, NotificationSink};

/// Build a completed run fixture.
pub fn completed_run(repo: &str, workflow: &str, id: &str, conclusion: RunConclusion) -> Run {
	let (owner, name) = repo.split_once('/').expect("owner/name");
	Run {
		id: id.to_string(),
		name: "CI".to_string(),
		status: RunStatus::Completed,
		conclusion: Some(conclusion),
		branch: "main".to_string(),
		commit_sha: "abc1234".to_string(),
		commit_message: "chore: poke the build".to_string(),
		started_at: Some(Utc::now()),
		updated_at: Some(Utc::now()),
		url: Url::parse(&format!("https://github.com/{repo}/actions/runs/{id}")).unwrap(),
		repository: Repository {
			id: format!("github-{name}"),
			name: name.to_string(),
			full_name: repo.to_string(),
			owner: owner.to_string(),
			kind: ProviderKind::Github,
			url: Url::parse(&format!("https://github.com/{repo}")).unwrap(),
			default_branch: "main".to_string(),
			private: false,
		},
		triggered_by: "octocat".to_string(),
		workflow_id: workflow.to_string(),
	}
}

/// Sink that records every alert it is handed.
#[derive(Debug, Default)]
pub struct RecordingSink {
	alerts: Mutex<Vec<Alert>>,
}

impl RecordingSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn alerts(&self) -> Vec<Alert> {
		self.alerts.lock().unwrap().clone()
	}
}

#[async_trait]
impl NotificationSink for RecordingSink {
	async fn deliver(&self, alert: Alert) {
		self.alerts.lock().unwrap().push(alert);
	}
}

/// Scripted provider keyed by token, so different accounts of the same
/// kind can succeed and fail independently.
#[derive(Debug, Default)]
pub struct MockProvider {
	runs_by_token: Mutex<HashMap<String, Vec<Run>>>,
	failing_tokens: Mutex<HashSet<String>>,
	fetch_calls: AtomicUsize,
	in_flight: AtomicUsize,
	max_in_flight: AtomicUsize,
	delay: Mutex<Duration>,
	actions: Mutex<Vec<String>>,
}

impl MockProvider {
	pub fn new() -> Self {
		Self::default()
	}

	/// Script the run set returned for a token.
	pub fn set_runs(&self, token: &str, runs: Vec<Run>) {
		self
			.runs_by_token
			.lock()
			.unwrap()
			.insert(token.to_string(), runs);
	}

	/// Make every fetch for a token fail with a server error.
	pub fn set_failing(&self, token: &str, failing: bool) {
		let mut failing_tokens = self.failing_tokens.lock().unwrap();
		if failing {
			failing_tokens.insert(token.to_string());
		} else {
			failing_tokens.remove(token);
		}
	}

	/// Artificial latency per fetch, for overlap tests.
	pub fn set_delay(&self, delay: Duration) {
		*self.delay.lock().unwrap() = delay;
	}

	pub fn fetch_calls(&self) -> usize {
		self.fetch_calls.load(Ordering::SeqCst)
	}

	/// Highest number of fetches observed in flight at once.
	pub fn max_in_flight(&self) -> usize {
		self.max_in_flight.load(Ordering::SeqCst)
	}

	/// Cancel/rerun invocations, as "cancel:<id>" / "rerun:<id>".
	pub fn actions(&self) -> Vec<String> {
		self.actions.lock().unwrap().clone()
	}

	async fn fetch(&self, token: &str) -> Result<Vec<Run>> {
		self.fetch_calls.fetch_add(1, Ordering::SeqCst);
		let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_in_flight.fetch_max(current, Ordering::SeqCst);

		let delay = *self.delay.lock().unwrap();
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}

		let result = if self.failing_tokens.lock().unwrap().contains(token) {
			Err(ProviderError::Server(500))
		} else {
			Ok(self
				.runs_by_token
				.lock()
				.unwrap()
				.get(token)
				.cloned()
				.unwrap_or_default())
		};

		self.in_flight.fetch_sub(1, Ordering::SeqCst);
		result
	}
}

#[async_trait]
impl CiProvider for MockProvider {
	fn name(&self) -> &str {
		"Mock"
	}

	fn kind(&self) -> ProviderKind {
		ProviderKind::Github
	}

	async fn validate_token(&self, token: &pipewatch_common_secret::SecretString) -> Result<Account> {
		if self.failing_tokens.lock().unwrap().contains(token.expose()) {
			return Err(ProviderError::Unauthorized);
		}
		Ok(Account::with_id("github-1", ProviderKind::Github, "octocat"))
	}

	async fn fetch_organizations(
		&self,
		_token: &pipewatch_common_secret::SecretString,
	) -> Result<Vec<Organization>> {
		Ok(Vec::new())
	}

	async fn fetch_repositories(
		&self,
		_token: &pipewatch_common_secret::SecretString,
		_organizations: &[String],
	) -> Result<Vec<Repository>> {
		Ok(Vec::new())
	}

	async fn fetch_runs(
		&self,
		token: &pipewatch_common_secret::SecretString,
		_repository: &Repository,
		_since: DateTime<Utc>,
	) -> Result<Vec<Run>> {
		self.fetch(token.expose()).await
	}

	async fn fetch_all_runs(
		&self,
		token: &pipewatch_common_secret::SecretString,
		_organizations: &[String],
		_since: DateTime<Utc>,
	) -> Result<Vec<Run>> {
		self.fetch(token.expose()).await
	}

	async fn cancel_run(
		&self,
		_token: &pipewatch_common_secret::SecretString,
		run: &Run,
	) -> Result<()> {
		self.actions.lock().unwrap().push(format!("cancel:{}", run.id));
		Ok(())
	}

	async fn rerun(&self, _token: &pipewatch_common_secret::SecretString, run: &Run) -> Result<()> {
		self.actions.lock().unwrap().push(format!("rerun:{}", run.id));
		Ok(())
	}
}
