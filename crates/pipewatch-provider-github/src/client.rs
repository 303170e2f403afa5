// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub Actions implementation of the provider contract.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::stream::{self, StreamExt};
use pipewatch_common_http::{retry, RetryConfig};
use pipewatch_common_secret::SecretString;
use pipewatch_core::{
	aggregate, Account, CiProvider, Organization, ProviderError, ProviderKind, Repository, Result,
	Run,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

const GITHUB_API_BASE: &str = "https://api.github.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const REPOS_PER_PAGE: usize = 100;
const RUNS_PER_PAGE: usize = 30;
/// Cap on concurrent per-repository run fetches within one account.
const REPO_FETCH_CONCURRENCY: usize = 8;

/// Provider for GitHub Actions.
#[derive(Debug, Clone)]
pub struct GithubActionsProvider {
	http_client: Client,
	base_url: Url,
	retry_config: RetryConfig,
}

impl Default for GithubActionsProvider {
	fn default() -> Self {
		Self::new()
	}
}

impl GithubActionsProvider {
	pub fn new() -> Self {
		Self {
			http_client: pipewatch_common_http::new_client_with_timeout(REQUEST_TIMEOUT),
			base_url: Url::parse(GITHUB_API_BASE).expect("static base URL"),
			retry_config: RetryConfig::default(),
		}
	}

	/// Point the provider at a different API base (GitHub Enterprise, test
	/// servers).
	pub fn with_base_url(mut self, base_url: Url) -> Self {
		self.base_url = base_url;
		self
	}

	pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
		self.retry_config = retry_config;
		self
	}

	fn endpoint(&self, path: &str) -> Result<Url> {
		self
			.base_url
			.join(path)
			.map_err(|_| ProviderError::InvalidUrl)
	}

	fn request(&self, method: Method, url: Url, token: &SecretString) -> RequestBuilder {
		self
			.http_client
			.request(method, url)
			.header("Authorization", format!("Bearer {}", token.expose()))
			.header("Accept", "application/vnd.github+json")
			.header("X-GitHub-Api-Version", "2022-11-28")
	}

	async fn get_json<T: DeserializeOwned>(
		&self,
		token: &SecretString,
		path: &str,
		query: &[(&str, String)],
	) -> Result<T> {
		let url = self.endpoint(path)?;

		retry(&self.retry_config, || async {
			let response = self
				.request(Method::GET, url.clone(), token)
				.query(query)
				.send()
				.await
				.map_err(map_transport_error)?;

			let status = response.status();
			if !status.is_success() {
				let body = response.text().await.unwrap_or_default();
				return Err(ProviderError::from_status(
					status.as_u16(),
					parse_error_message(&body),
				));
			}

			response
				.json::<T>()
				.await
				.map_err(|e| ProviderError::InvalidResponse(e.to_string()))
		})
		.await
	}

	// Side-effecting actions are sent exactly once: cancel and rerun
	// errors go straight back to the caller rather than being retried.
	async fn post_empty(&self, token: &SecretString, path: &str) -> Result<()> {
		let url = self.endpoint(path)?;

		let response = self
			.request(Method::POST, url, token)
			.send()
			.await
			.map_err(map_transport_error)?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(ProviderError::from_status(
				status.as_u16(),
				parse_error_message(&body),
			));
		}

		Ok(())
	}

	async fn fetch_repository_page(
		&self,
		token: &SecretString,
		scope_path: &str,
		page: usize,
	) -> Result<Vec<Repository>> {
		let wire: Vec<crate::types::GithubRepository> = self
			.get_json(
				token,
				scope_path,
				&[
					("per_page", REPOS_PER_PAGE.to_string()),
					("sort", "pushed".to_string()),
					("page", page.to_string()),
				],
			)
			.await?;

		wire.into_iter().map(|repo| repo.into_repository()).collect()
	}

	/// Page through a repository listing until a short page ends it.
	async fn fetch_repository_scope(
		&self,
		token: &SecretString,
		scope_path: &str,
	) -> Result<Vec<Repository>> {
		let mut repositories = Vec::new();
		let mut page = 1;

		loop {
			let batch = self.fetch_repository_page(token, scope_path, page).await?;
			let batch_len = batch.len();
			repositories.extend(batch);

			if batch_len < REPOS_PER_PAGE {
				break;
			}
			page += 1;
		}

		Ok(repositories)
	}
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
	if e.is_timeout() {
		ProviderError::Timeout
	} else {
		ProviderError::Network(e)
	}
}

fn parse_error_message(body: &str) -> String {
	serde_json::from_str::<crate::types::GithubErrorBody>(body)
		.map(|parsed| parsed.message)
		.unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl CiProvider for GithubActionsProvider {
	fn name(&self) -> &str {
		"GitHub Actions"
	}

	fn kind(&self) -> ProviderKind {
		ProviderKind::Github
	}

	#[instrument(skip(self, token))]
	async fn validate_token(&self, token: &SecretString) -> Result<Account> {
		let user: crate::types::GithubUser = self.get_json(token, "user", &[]).await?;

		Ok(Account::with_id(
			format!("github-{}", user.id),
			ProviderKind::Github,
			user.login,
		))
	}

	#[instrument(skip(self, token))]
	async fn fetch_organizations(&self, token: &SecretString) -> Result<Vec<Organization>> {
		let user: crate::types::GithubUser = self.get_json(token, "user", &[]).await?;
		let orgs: Vec<crate::types::GithubOrganization> =
			self.get_json(token, "user/orgs", &[]).await?;

		let mut organizations = vec![Organization {
			id: format!("user-{}", user.id),
			name: user.name.unwrap_or_else(|| user.login.clone()),
			login: user.login,
			kind: ProviderKind::Github,
			is_personal: true,
		}];

		organizations.extend(orgs.into_iter().map(|org| Organization {
			id: format!("org-{}", org.id),
			name: org.login.clone(),
			login: org.login,
			kind: ProviderKind::Github,
			is_personal: false,
		}));

		Ok(organizations)
	}

	#[instrument(skip(self, token))]
	async fn fetch_repositories(
		&self,
		token: &SecretString,
		organizations: &[String],
	) -> Result<Vec<Repository>> {
		let mut all_repos = Vec::new();

		for org in organizations {
			let org_scope = format!("orgs/{org}/repos");
			match self.fetch_repository_scope(token, &org_scope).await {
				Ok(repos) => all_repos.extend(repos),
				Err(e) => {
					// Personal accounts are not orgs; retry as a user scope.
					debug!(org = %org, error = %e, "org listing failed, falling back to user scope");
					let user_scope = format!("users/{org}/repos");
					all_repos.extend(self.fetch_repository_scope(token, &user_scope).await?);
				}
			}
		}

		Ok(all_repos)
	}

	#[instrument(skip(self, token, repository), fields(repo = %repository.full_name))]
	async fn fetch_runs(
		&self,
		token: &SecretString,
		repository: &Repository,
		since: DateTime<Utc>,
	) -> Result<Vec<Run>> {
		let since_param = since.to_rfc3339_opts(SecondsFormat::Secs, true);
		let path = format!("repos/{}/actions/runs", repository.full_name);

		let response: crate::types::GithubWorkflowRunsResponse = self
			.get_json(
				token,
				&path,
				&[
					("per_page", RUNS_PER_PAGE.to_string()),
					("created", format!(">={since_param}")),
				],
			)
			.await?;

		response
			.workflow_runs
			.into_iter()
			.map(|run| run.into_run(repository.clone()))
			.collect()
	}

	#[instrument(skip(self, token))]
	async fn fetch_all_runs(
		&self,
		token: &SecretString,
		organizations: &[String],
		since: DateTime<Utc>,
	) -> Result<Vec<Run>> {
		let repositories = self.fetch_repositories(token, organizations).await?;

		let batches: Vec<Vec<Run>> = stream::iter(repositories)
			.map(|repo| async move {
				match self.fetch_runs(token, &repo, since).await {
					Ok(runs) => runs,
					Err(e) => {
						// A repo without Actions, or one we cannot read,
						// contributes nothing rather than failing the sweep.
						warn!(repo = %repo.full_name, error = %e, "skipping repository");
						Vec::new()
					}
				}
			})
			.buffer_unordered(REPO_FETCH_CONCURRENCY)
			.collect()
			.await;

		let mut runs: Vec<Run> = batches.into_iter().flatten().collect();
		aggregate::sort_by_start_desc(&mut runs);
		Ok(runs)
	}

	#[instrument(skip(self, token, run), fields(run_id = %run.id))]
	async fn cancel_run(&self, token: &SecretString, run: &Run) -> Result<()> {
		let path = format!(
			"repos/{}/actions/runs/{}/cancel",
			run.repository.full_name, run.id
		);
		self.post_empty(token, &path).await
	}

	#[instrument(skip(self, token, run), fields(run_id = %run.id))]
	async fn rerun(&self, token: &SecretString, run: &Run) -> Result<()> {
		let path = format!(
			"repos/{}/actions/runs/{}/rerun",
			run.repository.full_name, run.id
		);
		self.post_empty(token, &path).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn endpoint_joins_against_base() {
		let provider = GithubActionsProvider::new();
		let url = provider.endpoint("repos/acme/api/actions/runs").unwrap();
		assert_eq!(
			url.as_str(),
			"https://api.github.com/repos/acme/api/actions/runs"
		);
	}

	#[test]
	fn custom_base_url_is_respected() {
		let provider = GithubActionsProvider::new()
			.with_base_url(Url::parse("https://ghe.example.com/api/v3/").unwrap());
		let url = provider.endpoint("user").unwrap();
		assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/user");
	}

	#[test]
	fn error_message_falls_back_to_raw_body() {
		assert_eq!(parse_error_message("{\"message\": \"Bad credentials\"}"), "Bad credentials");
		assert_eq!(parse_error_message("plain text"), "plain text");
	}

	#[test]
	fn provider_identifies_itself() {
		let provider = GithubActionsProvider::new();
		assert_eq!(provider.name(), "GitHub Actions");
		assert_eq!(provider.kind(), ProviderKind::Github);
	}
}
