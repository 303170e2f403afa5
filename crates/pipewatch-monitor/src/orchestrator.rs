// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fan-out fetch across accounts with partial-failure tolerance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use pipewatch_common_credentials::CredentialStore;
use pipewatch_core::{aggregate, CiProvider, ProviderError, ProviderKind, Run};
use tracing::{debug, instrument, warn};

use crate::error::{MonitorError, Result};
use crate::settings::Settings;

/// Cap on concurrent per-account fetches.
const ACCOUNT_FETCH_CONCURRENCY: usize = 4;

/// Fetch one account's runs. Extracted into a named async fn so the
/// spawned loop future's `Send` bound resolves without a higher-ranked
/// lifetime inference failure on the boxed `async_trait` future.
async fn fetch_one(
	provider: Arc<dyn CiProvider>,
	token: pipewatch_common_secret::SecretString,
	organizations: Vec<String>,
	since: DateTime<Utc>,
) -> std::result::Result<Vec<Run>, ProviderError> {
	provider.fetch_all_runs(&token, &organizations, since).await
}

/// Resolves tokens and fans fetches out across every configured account.
///
/// Failure policy: an account without a token is skipped silently; an
/// account whose fetch fails contributes nothing; the whole fetch fails
/// only when every participating account failed.
pub struct FetchOrchestrator {
	providers: Vec<Arc<dyn CiProvider>>,
	credentials: Arc<dyn CredentialStore>,
}

impl FetchOrchestrator {
	pub fn new(providers: Vec<Arc<dyn CiProvider>>, credentials: Arc<dyn CredentialStore>) -> Self {
		Self {
			providers,
			credentials,
		}
	}

	/// The registered provider serving a kind, if any.
	pub fn provider_for(&self, kind: ProviderKind) -> Option<Arc<dyn CiProvider>> {
		self
			.providers
			.iter()
			.find(|provider| provider.kind() == kind)
			.cloned()
	}

	pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
		&self.credentials
	}

	/// Fetch runs for every account, merged and sorted most recent first.
	#[instrument(skip(self, settings), fields(accounts = settings.accounts.len()))]
	pub async fn fetch_all(&self, settings: &Settings, since: DateTime<Utc>) -> Result<Vec<Run>> {
		let mut jobs = Vec::new();

		for account in &settings.accounts {
			let Some(provider) = self.provider_for(account.kind) else {
				debug!(account = %account.id, kind = %account.kind, "no provider registered, skipping account");
				continue;
			};

			let token = match self.credentials.get(&account.id).await {
				Ok(Some(token)) => token,
				Ok(None) => {
					debug!(account = %account.id, "no token stored, skipping account");
					continue;
				}
				Err(e) => {
					warn!(account = %account.id, error = %e, "token lookup failed, skipping account");
					continue;
				}
			};

			jobs.push((provider, token, settings.organizations_for(account)));
		}

		if jobs.is_empty() {
			return Ok(Vec::new());
		}

		let fetches: Vec<
			std::pin::Pin<
				Box<
					dyn std::future::Future<Output = std::result::Result<Vec<Run>, ProviderError>>
						+ Send,
				>,
			>,
		> = jobs
			.into_iter()
			.map(|(provider, token, organizations)| {
				Box::pin(fetch_one(provider, token, organizations, since)) as _
			})
			.collect();
		let results: Vec<std::result::Result<Vec<Run>, ProviderError>> = stream::iter(fetches)
			.buffer_unordered(ACCOUNT_FETCH_CONCURRENCY)
			.collect()
			.await;

		let total = results.len();
		let mut runs = Vec::new();
		let mut last_error = None;
		let mut failures = 0;

		for result in results {
			match result {
				Ok(mut batch) => runs.append(&mut batch),
				Err(e) => {
					warn!(error = %e, "account fetch failed, contributing nothing");
					failures += 1;
					last_error = Some(e);
				}
			}
		}

		if failures == total {
			if let Some(error) = last_error {
				return Err(MonitorError::AllAccountsFailed(error));
			}
		}

		aggregate::sort_by_start_desc(&mut runs);
		Ok(runs)
	}
}
