// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Accounts, organizations and repositories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;
use uuid::Uuid;

/// Supported CI/CD backends.
///
/// Adding a backend means adding a variant here and implementing
/// [`CiProvider`](crate::provider::CiProvider) for it; the monitor core
/// never branches on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
	Github,
}

impl fmt::Display for ProviderKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProviderKind::Github => write!(f, "GitHub"),
		}
	}
}

/// A configured provider account.
///
/// Owned by the settings layer; the monitor loop only reads accounts. The
/// account id doubles as the credential-store key for the account's token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
	pub id: String,
	pub kind: ProviderKind,
	pub username: String,
	pub created_at: DateTime<Utc>,
}

impl Account {
	/// Create an account with a fresh unique id.
	pub fn new(kind: ProviderKind, username: impl Into<String>) -> Self {
		Self {
			id: Uuid::new_v4().to_string(),
			kind,
			username: username.into(),
			created_at: Utc::now(),
		}
	}

	/// Create an account with a provider-assigned id (e.g. "github-12345").
	pub fn with_id(id: impl Into<String>, kind: ProviderKind, username: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			kind,
			username: username.into(),
			created_at: Utc::now(),
		}
	}
}

/// An organization or group an account can see.
///
/// Provider listings always include a synthetic entry for the authenticated
/// user's personal scope, flagged with `is_personal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
	pub id: String,
	pub name: String,
	pub login: String,
	pub kind: ProviderKind,
	pub is_personal: bool,
}

/// A repository as reported by a provider.
///
/// Value type: immutable once fetched, rebuilt on every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
	pub id: String,
	pub name: String,
	/// "owner/name"
	pub full_name: String,
	pub owner: String,
	pub kind: ProviderKind,
	pub url: Url,
	pub default_branch: String,
	pub private: bool,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn provider_kind_serializes_lowercase() {
		let json = serde_json::to_string(&ProviderKind::Github).unwrap();
		assert_eq!(json, "\"github\"");

		let kind: ProviderKind = serde_json::from_str("\"github\"").unwrap();
		assert_eq!(kind, ProviderKind::Github);
	}

	#[test]
	fn new_accounts_get_unique_ids() {
		let a = Account::new(ProviderKind::Github, "octocat");
		let b = Account::new(ProviderKind::Github, "octocat");
		assert_ne!(a.id, b.id);
	}

	#[test]
	fn with_id_keeps_provider_assigned_id() {
		let account = Account::with_id("github-583231", ProviderKind::Github, "octocat");
		assert_eq!(account.id, "github-583231");
		assert_eq!(account.username, "octocat");
	}
}
