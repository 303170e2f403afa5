// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared fixtures for unit tests.

use chrono::{DateTime, Utc};
use url::Url;

use crate::model::{ProviderKind, Repository};
use crate::run::{Run, RunConclusion, RunStatus};

pub(crate) fn repo(full_name: &str) -> Repository {
	let (owner, name) = full_name.split_once('/').expect("owner/name");
	Repository {
		id: format!("github-{name}"),
		name: name.to_string(),
		full_name: full_name.to_string(),
		owner: owner.to_string(),
		kind: ProviderKind::Github,
		url: Url::parse(&format!("https://github.com/{full_name}")).unwrap(),
		default_branch: "main".to_string(),
		private: false,
	}
}

pub(crate) fn run(id: &str, status: RunStatus, conclusion: Option<RunConclusion>) -> Run {
	run_in("acme/api", "42", id, status, conclusion)
}

pub(crate) fn run_in(
	repo_full_name: &str,
	workflow_id: &str,
	id: &str,
	status: RunStatus,
	conclusion: Option<RunConclusion>,
) -> Run {
	Run {
		id: id.to_string(),
		name: "CI".to_string(),
		status,
		conclusion,
		branch: "main".to_string(),
		commit_sha: "abc1234".to_string(),
		commit_message: "fix: align retry budget\n\nLonger body".to_string(),
		started_at: None,
		updated_at: None,
		url: Url::parse(&format!(
			"https://github.com/{repo_full_name}/actions/runs/{id}"
		))
		.unwrap(),
		repository: repo(repo_full_name),
		triggered_by: "octocat".to_string(),
		workflow_id: workflow_id.to_string(),
	}
}

pub(crate) fn started(run: Run, at: DateTime<Utc>) -> Run {
	Run {
		started_at: Some(at),
		..run
	}
}
