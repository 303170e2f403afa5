// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The scheduling loop that owns the published snapshot.

use std::sync::Arc;

use chrono::Utc;
use pipewatch_core::{AggregateStatus, MonitorSnapshot, Run};
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{MonitorError, Result};
use crate::notifier::{NotificationSink, Notifier};
use crate::orchestrator::FetchOrchestrator;
use crate::settings::{Settings, SettingsSource};

struct LoopHandle {
	shutdown_tx: watch::Sender<bool>,
	task: JoinHandle<()>,
}

enum Action {
	Cancel,
	Rerun,
}

struct MonitorInner {
	orchestrator: FetchOrchestrator,
	settings: Arc<dyn SettingsSource>,
	notifier: Mutex<Notifier>,
	refresh_lock: Mutex<()>,
	refresh_notify: Notify,
	snapshot_tx: watch::Sender<MonitorSnapshot>,
	running: Mutex<Option<LoopHandle>>,
}

/// Owns scheduling, refresh cycles and snapshot publication.
///
/// The snapshot and the notifier's transition map are mutated only under
/// the refresh lock (single writer); observers read through the watch
/// channel. At most one refresh cycle executes at a time; a manual
/// refresh landing during a scheduled one waits its turn.
#[derive(Clone)]
pub struct PipelineMonitor {
	inner: Arc<MonitorInner>,
}

impl PipelineMonitor {
	pub fn new(
		orchestrator: FetchOrchestrator,
		settings: Arc<dyn SettingsSource>,
		sink: Arc<dyn NotificationSink>,
	) -> Self {
		let (snapshot_tx, _) = watch::channel(MonitorSnapshot::default());

		Self {
			inner: Arc::new(MonitorInner {
				orchestrator,
				settings,
				notifier: Mutex::new(Notifier::new(sink)),
				refresh_lock: Mutex::new(()),
				refresh_notify: Notify::new(),
				snapshot_tx,
				running: Mutex::new(None),
			}),
		}
	}

	/// Observe published snapshots. The receiver immediately holds the
	/// current one.
	pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
		self.inner.snapshot_tx.subscribe()
	}

	/// The currently published snapshot.
	pub fn snapshot(&self) -> MonitorSnapshot {
		self.inner.snapshot_tx.borrow().clone()
	}

	/// Start the monitoring loop: refresh immediately, then on every
	/// interval tick or on-demand request. Starting while already running
	/// stops the previous loop first; there are never two loops.
	///
	/// Settings are read once per loop start, not re-read mid-cycle.
	pub async fn start(&self) {
		self.stop().await;

		let (shutdown_tx, shutdown_rx) = watch::channel(false);
		let monitor = self.clone();

		let task = tokio::spawn(async move { monitor.run_loop(shutdown_rx).await });

		*self.inner.running.lock().await = Some(LoopHandle { shutdown_tx, task });
	}

	/// Stop the loop. Cancels the pending timer wait and any in-flight
	/// fetch; once this returns, no further snapshots are published by the
	/// loop.
	pub async fn stop(&self) {
		let handle = self.inner.running.lock().await.take();
		if let Some(handle) = handle {
			let _ = handle.shutdown_tx.send(true);
			let _ = handle.task.await;
		}
	}

	/// Ask a running loop for an extra refresh without waiting for it.
	pub fn request_refresh(&self) {
		self.inner.refresh_notify.notify_one();
	}

	/// Execute one refresh cycle now, with freshly loaded settings.
	pub async fn refresh(&self) {
		let settings = self.inner.settings.load();
		self.refresh_cycle(&settings).await;
	}

	async fn run_loop(&self, mut shutdown_rx: watch::Receiver<bool>) {
		let settings = self.inner.settings.load();
		let interval = settings.refresh_interval();
		info!(
			interval_secs = settings.refresh_interval_secs,
			lookback_days = settings.lookback_days,
			accounts = settings.accounts.len(),
			"monitor loop started"
		);

		loop {
			tokio::select! {
				_ = shutdown_rx.changed() => break,
				_ = self.refresh_cycle(&settings) => {}
			}

			tokio::select! {
				_ = shutdown_rx.changed() => break,
				_ = tokio::time::sleep(interval) => {}
				_ = self.inner.refresh_notify.notified() => {}
			}
		}

		info!("monitor loop stopped");
	}

	async fn refresh_cycle(&self, settings: &Settings) {
		let _guard = self.inner.refresh_lock.lock().await;

		if settings.accounts.is_empty() {
			let previous = self.inner.snapshot_tx.borrow().clone();
			self.inner.snapshot_tx.send_replace(MonitorSnapshot {
				runs: Vec::new(),
				status: AggregateStatus::NoData,
				..previous
			});
			return;
		}

		let since = Utc::now() - settings.lookback();

		match self.inner.orchestrator.fetch_all(settings, since).await {
			Ok(runs) => {
				if settings.alerts_enabled {
					self.inner.notifier.lock().await.observe(&runs).await;
				}
				self
					.inner
					.snapshot_tx
					.send_replace(MonitorSnapshot::from_runs(runs, Utc::now()));
			}
			Err(e) => {
				warn!(error = %e, "pipeline refresh failed");
				// A failed cycle records the error but never erases good
				// data; without prior data the board shows no-data rather
				// than flashing an error on a transient blip.
				let previous = self.inner.snapshot_tx.borrow().clone();
				let status = if previous.runs.is_empty() {
					AggregateStatus::NoData
				} else {
					previous.status
				};
				self.inner.snapshot_tx.send_replace(MonitorSnapshot {
					status,
					last_error: Some(e.to_string()),
					..previous
				});
			}
		}
	}

	/// Cancel a running pipeline, then force one refresh regardless of the
	/// action's outcome.
	pub async fn cancel_run(&self, run: &Run) -> Result<()> {
		let outcome = self.run_action(run, Action::Cancel).await;
		self.refresh().await;
		outcome
	}

	/// Rerun a pipeline, then force one refresh regardless of the action's
	/// outcome.
	pub async fn rerun(&self, run: &Run) -> Result<()> {
		let outcome = self.run_action(run, Action::Rerun).await;
		self.refresh().await;
		outcome
	}

	async fn run_action(&self, run: &Run, action: Action) -> Result<()> {
		let settings = self.inner.settings.load();
		let kind = run.repository.kind;

		let account = settings
			.accounts
			.iter()
			.find(|account| account.kind == kind)
			.ok_or(MonitorError::NoAccount(kind))?;
		let provider = self
			.inner
			.orchestrator
			.provider_for(kind)
			.ok_or(MonitorError::NoAccount(kind))?;
		let token = self
			.inner
			.orchestrator
			.credentials()
			.get(&account.id)
			.await?
			.ok_or_else(|| MonitorError::NoToken(account.id.clone()))?;

		match action {
			Action::Cancel => provider.cancel_run(&token, run).await?,
			Action::Rerun => provider.rerun(&token, run).await?,
		}

		Ok(())
	}
}
