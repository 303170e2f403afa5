// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Config file handling.
//!
//! Settings live in `config.toml` and tokens in `credentials.json`, both
//! under the pipewatch config directory (XDG config dir by default,
//! overridable with `PIPEWATCH_CONFIG_DIR`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use pipewatch_core::Account;
use pipewatch_monitor::{Settings, SettingsSource};
use tracing::warn;

pub struct ConfigPaths {
	dir: PathBuf,
}

impl ConfigPaths {
	pub fn resolve(override_dir: Option<PathBuf>) -> Result<Self> {
		let dir = override_dir
			.or_else(|| dirs::config_dir().map(|d| d.join("pipewatch")))
			.context("could not determine a config directory")?;
		Ok(Self { dir })
	}

	pub fn settings_file(&self) -> PathBuf {
		self.dir.join("config.toml")
	}

	pub fn credentials_file(&self) -> PathBuf {
		self.dir.join("credentials.json")
	}
}

pub fn load_settings(paths: &ConfigPaths) -> Result<Settings> {
	let path = paths.settings_file();
	if !path.exists() {
		return Ok(Settings::default());
	}

	let contents = std::fs::read_to_string(&path)
		.with_context(|| format!("failed to read {}", path.display()))?;
	toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn save_settings(paths: &ConfigPaths, settings: &Settings) -> Result<()> {
	std::fs::create_dir_all(&paths.dir)
		.with_context(|| format!("failed to create {}", paths.dir.display()))?;

	let path = paths.settings_file();
	let contents = toml::to_string_pretty(settings).context("failed to serialize settings")?;
	std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Insert or replace one account in the settings file.
pub fn add_account(paths: &ConfigPaths, account: &Account) -> Result<()> {
	let mut settings = load_settings(paths)?;
	settings.accounts.retain(|existing| existing.id != account.id);
	settings.accounts.push(account.clone());
	save_settings(paths, &settings)
}

/// Settings source that re-reads the config file on every load, so a loop
/// restart picks up edits.
pub struct FileSettingsSource {
	path: PathBuf,
}

impl FileSettingsSource {
	pub fn new(paths: &ConfigPaths) -> Self {
		Self {
			path: paths.settings_file(),
		}
	}
}

impl SettingsSource for FileSettingsSource {
	fn load(&self) -> Settings {
		if !self.path.exists() {
			return Settings::default();
		}

		match std::fs::read_to_string(&self.path)
			.map_err(anyhow::Error::from)
			.and_then(|contents| toml::from_str(&contents).map_err(anyhow::Error::from))
		{
			Ok(settings) => settings,
			Err(e) => {
				warn!(path = %self.path.display(), error = %e, "falling back to default settings");
				Settings::default()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pipewatch_core::ProviderKind;

	fn temp_paths() -> (tempfile::TempDir, ConfigPaths) {
		let dir = tempfile::tempdir().unwrap();
		let paths = ConfigPaths::resolve(Some(dir.path().to_path_buf())).unwrap();
		(dir, paths)
	}

	#[test]
	fn missing_settings_file_loads_defaults() {
		let (_dir, paths) = temp_paths();
		let settings = load_settings(&paths).unwrap();
		assert_eq!(settings, Settings::default());
	}

	#[test]
	fn settings_round_trip_through_toml() {
		let (_dir, paths) = temp_paths();

		let mut settings = Settings::default();
		settings.refresh_interval_secs = 120;
		settings.selected_organizations = vec!["acme".to_string()];
		settings
			.accounts
			.push(Account::with_id("github-1", ProviderKind::Github, "octocat"));

		save_settings(&paths, &settings).unwrap();
		let loaded = load_settings(&paths).unwrap();

		assert_eq!(loaded, settings);
	}

	#[test]
	fn add_account_replaces_by_id() {
		let (_dir, paths) = temp_paths();

		let account = Account::with_id("github-1", ProviderKind::Github, "octocat");
		add_account(&paths, &account).unwrap();

		let renamed = Account::with_id("github-1", ProviderKind::Github, "monalisa");
		add_account(&paths, &renamed).unwrap();

		let settings = load_settings(&paths).unwrap();
		assert_eq!(settings.accounts.len(), 1);
		assert_eq!(settings.accounts[0].username, "monalisa");
	}

	#[test]
	fn file_source_falls_back_on_unparseable_config() {
		let (_dir, paths) = temp_paths();
		std::fs::create_dir_all(paths.settings_file().parent().unwrap()).unwrap();
		std::fs::write(paths.settings_file(), "not valid toml [").unwrap();

		let source = FileSettingsSource::new(&paths);
		assert_eq!(source.load(), Settings::default());
	}
}
