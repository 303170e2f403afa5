// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The settings contract the monitor reads.
//!
//! Settings are owned elsewhere (the CLI's config file, a future GUI); the
//! monitor sees them only through [`SettingsSource`] and reads them fresh at
//! the start of each loop restart, never mid-cycle.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use pipewatch_core::Account;

/// Recommended refresh intervals, in seconds.
pub const REFRESH_INTERVAL_PRESETS: [u64; 4] = [30, 60, 120, 300];

/// Recommended lookback windows, in days.
pub const LOOKBACK_DAYS_PRESETS: [u32; 4] = [1, 3, 7, 14];

fn default_refresh_interval_secs() -> u64 {
	60
}

fn default_lookback_days() -> u32 {
	3
}

fn default_alerts_enabled() -> bool {
	true
}

/// Monitoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
	#[serde(default)]
	pub accounts: Vec<Account>,

	/// Organization logins to watch. Empty means each account defaults to
	/// its own username scope.
	#[serde(default)]
	pub selected_organizations: Vec<String>,

	#[serde(default = "default_refresh_interval_secs")]
	pub refresh_interval_secs: u64,

	#[serde(default = "default_lookback_days")]
	pub lookback_days: u32,

	#[serde(default = "default_alerts_enabled")]
	pub alerts_enabled: bool,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			accounts: Vec::new(),
			selected_organizations: Vec::new(),
			refresh_interval_secs: default_refresh_interval_secs(),
			lookback_days: default_lookback_days(),
			alerts_enabled: default_alerts_enabled(),
		}
	}
}

impl Settings {
	pub fn refresh_interval(&self) -> Duration {
		Duration::from_secs(self.refresh_interval_secs)
	}

	pub fn lookback(&self) -> chrono::Duration {
		chrono::Duration::days(i64::from(self.lookback_days))
	}

	/// The organization scope for one account: the explicit selection, or
	/// the account's own username when nothing is selected.
	pub fn organizations_for(&self, account: &Account) -> Vec<String> {
		if self.selected_organizations.is_empty() {
			vec![account.username.clone()]
		} else {
			self.selected_organizations.clone()
		}
	}
}

/// Where the monitor obtains its settings.
pub trait SettingsSource: Send + Sync {
	fn load(&self) -> Settings;
}

/// A fixed settings value, for tests and one-shot invocations.
#[derive(Debug, Clone)]
pub struct StaticSettings(pub Settings);

impl SettingsSource for StaticSettings {
	fn load(&self) -> Settings {
		self.0.clone()
	}
}
