// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Token storage backends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pipewatch_common_secret::SecretString;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::CredentialError;

/// On-disk credential store format: account id → token.
type PersistedTokens = HashMap<String, String>;

/// Trait for token storage backends.
///
/// Implementations store one token per account id. The monitor core only
/// ever calls [`get`](CredentialStore::get) and [`has`](CredentialStore::has).
#[async_trait]
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
	/// Look up the token for an account.
	async fn get(&self, account_id: &str) -> Result<Option<SecretString>, CredentialError>;

	/// Store a token for an account, replacing any existing one.
	async fn set(&self, account_id: &str, token: SecretString) -> Result<(), CredentialError>;

	/// Delete the token for an account. Deleting a missing token is not an
	/// error.
	async fn delete(&self, account_id: &str) -> Result<(), CredentialError>;

	/// Check whether a token exists for an account.
	async fn has(&self, account_id: &str) -> Result<bool, CredentialError> {
		Ok(self.get(account_id).await?.is_some())
	}
}

/// File-based token store with JSON format.
///
/// Tokens are stored in a JSON file with restricted permissions (0600 on
/// Unix). Writes go through a temp file and atomic rename.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
	path: PathBuf,
}

impl FileCredentialStore {
	/// Create a new file token store at the given path.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Get the path to the credential file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	async fn read_store(&self) -> Result<PersistedTokens, CredentialError> {
		if !self.path.exists() {
			return Ok(HashMap::new());
		}

		let contents = fs::read_to_string(&self.path).await?;
		let store: PersistedTokens = serde_json::from_str(&contents)?;
		Ok(store)
	}

	async fn write_store(&self, store: &PersistedTokens) -> Result<(), CredentialError> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).await?;
		}

		let contents = serde_json::to_string_pretty(store)?;

		let temp_path = self.path.with_extension("tmp");
		let mut file = fs::File::create(&temp_path).await?;
		file.write_all(contents.as_bytes()).await?;
		file.sync_all().await?;
		drop(file);

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			let perms = std::fs::Permissions::from_mode(0o600);
			if let Err(e) = std::fs::set_permissions(&temp_path, perms) {
				warn!(path = ?temp_path, error = %e, "Failed to set file permissions to 0600");
			}
		}

		fs::rename(&temp_path, &self.path).await?;

		debug!(path = ?self.path, "Credential store written");
		Ok(())
	}
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
	async fn get(&self, account_id: &str) -> Result<Option<SecretString>, CredentialError> {
		let store = self.read_store().await?;
		Ok(store.get(account_id).cloned().map(SecretString::new))
	}

	async fn set(&self, account_id: &str, token: SecretString) -> Result<(), CredentialError> {
		let mut store = self.read_store().await?;
		store.insert(account_id.to_string(), token.expose().clone());
		self.write_store(&store).await
	}

	async fn delete(&self, account_id: &str) -> Result<(), CredentialError> {
		let mut store = self.read_store().await?;
		store.remove(account_id);
		self.write_store(&store).await
	}
}

/// In-memory token store for testing.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
	tokens: tokio::sync::RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
	/// Create a new empty in-memory store.
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
	async fn get(&self, account_id: &str) -> Result<Option<SecretString>, CredentialError> {
		let tokens = self.tokens.read().await;
		Ok(tokens.get(account_id).cloned().map(SecretString::new))
	}

	async fn set(&self, account_id: &str, token: SecretString) -> Result<(), CredentialError> {
		let mut tokens = self.tokens.write().await;
		tokens.insert(account_id.to_string(), token.expose().clone());
		Ok(())
	}

	async fn delete(&self, account_id: &str) -> Result<(), CredentialError> {
		let mut tokens = self.tokens.write().await;
		tokens.remove(account_id);
		Ok(())
	}
}
