// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scheduled monitoring engine for PipeWatch.
//!
//! Ties the provider abstraction together: a background loop fetches runs
//! across all configured accounts on an interval, aggregates them into one
//! [`MonitorSnapshot`](pipewatch_core::MonitorSnapshot), raises
//! edge-triggered alerts on failure/recovery transitions, and publishes the
//! snapshot through a watch channel.

pub mod error;
pub mod fakes;
pub mod monitor;
pub mod notifier;
pub mod orchestrator;
pub mod settings;

pub use error::{MonitorError, Result};
pub use monitor::PipelineMonitor;
pub use notifier::{Alert, NotificationSink, Notifier, TracingSink};
pub use orchestrator::FetchOrchestrator;
pub use settings::{
	Settings, SettingsSource, StaticSettings, LOOKBACK_DAYS_PRESETS, REFRESH_INTERVAL_PRESETS,
};
