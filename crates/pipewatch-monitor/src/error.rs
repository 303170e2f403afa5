// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Monitor error types.

use pipewatch_common_credentials::CredentialError;
use pipewatch_core::{ProviderError, ProviderKind};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors surfaced by the monitoring engine.
#[derive(Debug, Error)]
pub enum MonitorError {
	/// No configured account matches the provider of the targeted run.
	#[error("No account found for provider {0}")]
	NoAccount(ProviderKind),

	/// The account exists but has no stored token.
	#[error("No authentication token found for account {0}")]
	NoToken(String),

	/// Every account's fetch failed; nothing contributed to the cycle.
	#[error("All accounts failed to fetch: {0}")]
	AllAccountsFailed(#[source] ProviderError),

	#[error(transparent)]
	Provider(#[from] ProviderError),

	#[error(transparent)]
	Credentials(#[from] CredentialError),
}
