// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Wire types for the GitHub REST API and their mapping onto the domain
//! model.

use chrono::{DateTime, Utc};
use pipewatch_core::{
	ProviderError, ProviderKind, Repository, Run, RunConclusion, RunStatus,
};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub(crate) struct GithubUser {
	pub id: i64,
	pub login: String,
	pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GithubOrganization {
	pub id: i64,
	pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GithubOwner {
	pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GithubRepository {
	pub id: i64,
	pub name: String,
	pub full_name: String,
	pub owner: GithubOwner,
	pub html_url: String,
	pub default_branch: String,
	pub private: bool,
}

impl GithubRepository {
	pub(crate) fn into_repository(self) -> Result<Repository, ProviderError> {
		let url = Url::parse(&self.html_url)
			.map_err(|e| ProviderError::InvalidResponse(format!("bad repository url: {e}")))?;

		Ok(Repository {
			id: format!("github-{}", self.id),
			name: self.name,
			full_name: self.full_name,
			owner: self.owner.login,
			kind: ProviderKind::Github,
			url,
			default_branch: self.default_branch,
			private: self.private,
		})
	}
}

#[derive(Debug, Deserialize)]
pub(crate) struct GithubWorkflowRunsResponse {
	pub workflow_runs: Vec<GithubWorkflowRun>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GithubWorkflowRun {
	pub id: i64,
	pub name: Option<String>,
	pub status: String,
	pub conclusion: Option<String>,
	pub head_branch: Option<String>,
	pub head_sha: String,
	pub display_title: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub html_url: String,
	pub workflow_id: i64,
	pub triggering_actor: Option<GithubActor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GithubActor {
	pub login: String,
}

impl GithubWorkflowRun {
	pub(crate) fn into_run(self, repository: Repository) -> Result<Run, ProviderError> {
		let url = Url::parse(&self.html_url)
			.map_err(|e| ProviderError::InvalidResponse(format!("bad run url: {e}")))?;

		let status: RunStatus = self.status.parse().unwrap_or(RunStatus::Pending);

		// A conclusion is only meaningful on completed runs; GitHub leaves
		// stale values on reruns that have gone back to queued.
		let conclusion = if status == RunStatus::Completed {
			self
				.conclusion
				.as_deref()
				.and_then(|s| s.parse::<RunConclusion>().ok())
		} else {
			None
		};

		Ok(Run {
			id: self.id.to_string(),
			name: self.name.unwrap_or_else(|| "Workflow".to_string()),
			status,
			conclusion,
			branch: self.head_branch.unwrap_or_default(),
			commit_sha: self.head_sha,
			commit_message: self.display_title,
			started_at: Some(self.created_at),
			updated_at: Some(self.updated_at),
			url,
			repository,
			triggered_by: self
				.triggering_actor
				.map(|actor| actor.login)
				.unwrap_or_else(|| "Unknown".to_string()),
			workflow_id: self.workflow_id.to_string(),
		})
	}
}

/// GitHub error payloads carry a `message` field.
#[derive(Debug, Deserialize)]
pub(crate) struct GithubErrorBody {
	pub message: String,
}
