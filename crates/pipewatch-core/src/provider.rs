// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The capability contract every CI backend implements.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pipewatch_common_secret::SecretString;
use url::Url;

use crate::error::Result;
use crate::model::{Account, Organization, ProviderKind, Repository};
use crate::run::Run;

/// One CI backend (GitHub Actions today, others by implementing this).
///
/// Providers are pure data sources: no operation here may mutate shared
/// monitor state. Results flow back through the fetch orchestrator.
#[async_trait]
pub trait CiProvider: Send + Sync {
	/// Provider name for display.
	fn name(&self) -> &str;

	/// Which [`ProviderKind`] this implementation serves.
	fn kind(&self) -> ProviderKind;

	/// Validate an authentication token, returning the account it belongs
	/// to. Fails with [`ProviderError::Unauthorized`] for invalid or
	/// expired tokens.
	///
	/// [`ProviderError::Unauthorized`]: crate::error::ProviderError::Unauthorized
	async fn validate_token(&self, token: &SecretString) -> Result<Account>;

	/// Organizations/groups visible to the token, with a synthetic entry
	/// for the personal account first.
	async fn fetch_organizations(&self, token: &SecretString) -> Result<Vec<Organization>>;

	/// Repositories for the given organization logins. An org-scoped
	/// listing failure falls back to treating the login as a user scope.
	async fn fetch_repositories(
		&self,
		token: &SecretString,
		organizations: &[String],
	) -> Result<Vec<Repository>>;

	/// Runs of one repository created at or after `since`.
	async fn fetch_runs(
		&self,
		token: &SecretString,
		repository: &Repository,
		since: DateTime<Utc>,
	) -> Result<Vec<Run>>;

	/// All recent runs across every repository in scope, sorted by start
	/// time descending. Per-repository failures degrade to an empty
	/// contribution rather than failing the whole call.
	async fn fetch_all_runs(
		&self,
		token: &SecretString,
		organizations: &[String],
		since: DateTime<Utc>,
	) -> Result<Vec<Run>>;

	/// Cancel a running pipeline. Idempotent in intent.
	async fn cancel_run(&self, token: &SecretString, run: &Run) -> Result<()>;

	/// Rerun a pipeline. Idempotent in intent.
	async fn rerun(&self, token: &SecretString, run: &Run) -> Result<()>;

	/// Direct URL to a run. Pure, no I/O.
	fn run_url(&self, run: &Run) -> Url {
		run.url.clone()
	}
}
