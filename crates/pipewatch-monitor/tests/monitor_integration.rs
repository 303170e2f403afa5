// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end refresh cycles against an in-process mock provider.

use std::sync::Arc;
use std::time::Duration;

use pipewatch_common_credentials::{CredentialStore, MemoryCredentialStore};
use pipewatch_common_secret::SecretString;
use pipewatch_monitor::fakes::{completed_run, MockProvider, RecordingSink};
use pipewatch_monitor::{FetchOrchestrator, PipelineMonitor, Settings, StaticSettings};
use pipewatch_core::{Account, AggregateStatus, ProviderKind, RunConclusion};

struct Harness {
	monitor: PipelineMonitor,
	provider: Arc<MockProvider>,
	sink: Arc<RecordingSink>,
}

async fn harness(settings: Settings) -> Harness {
	let provider = Arc::new(MockProvider::new());
	let credentials = Arc::new(MemoryCredentialStore::new());

	for account in &settings.accounts {
		credentials
			.set(&account.id, SecretString::new(format!("token-{}", account.id)))
			.await
			.unwrap();
	}

	let sink = Arc::new(RecordingSink::new());
	let orchestrator = FetchOrchestrator::new(vec![provider.clone()], credentials);
	let monitor = PipelineMonitor::new(
		orchestrator,
		Arc::new(StaticSettings(settings)),
		sink.clone(),
	);

	Harness {
		monitor,
		provider,
		sink,
	}
}

fn one_account_settings() -> Settings {
	Settings {
		accounts: vec![Account::with_id("acct", ProviderKind::Github, "octocat")],
		refresh_interval_secs: 3600,
		..Settings::default()
	}
}

#[tokio::test]
async fn refresh_publishes_a_snapshot() {
	let h = harness(one_account_settings()).await;
	h.provider.set_runs(
		"token-acct",
		vec![completed_run("acme/api", "42", "1", RunConclusion::Failure)],
	);

	h.monitor.refresh().await;

	let snapshot = h.monitor.snapshot();
	assert_eq!(snapshot.runs.len(), 1);
	assert_eq!(snapshot.status, AggregateStatus::SomeFailing);
	assert!(snapshot.last_refresh.is_some());
	assert!(snapshot.last_error.is_none());
}

#[tokio::test]
async fn empty_account_list_publishes_no_data_without_network_calls() {
	let h = harness(Settings::default()).await;

	h.monitor.refresh().await;

	let snapshot = h.monitor.snapshot();
	assert!(snapshot.runs.is_empty());
	assert_eq!(snapshot.status, AggregateStatus::NoData);
	assert_eq!(h.provider.fetch_calls(), 0, "no network calls attempted");
}

#[tokio::test]
async fn failed_cycle_retains_previous_data() {
	let h = harness(one_account_settings()).await;
	h.provider.set_runs(
		"token-acct",
		vec![completed_run("acme/api", "42", "1", RunConclusion::Success)],
	);

	h.monitor.refresh().await;
	let healthy = h.monitor.snapshot();
	assert_eq!(healthy.status, AggregateStatus::AllPassing);

	h.provider.set_failing("token-acct", true);
	h.monitor.refresh().await;

	let snapshot = h.monitor.snapshot();
	assert_eq!(snapshot.runs.len(), 1, "failures never erase good data");
	assert_eq!(snapshot.status, AggregateStatus::AllPassing);
	assert!(snapshot.last_error.is_some());
	assert_eq!(snapshot.last_refresh, healthy.last_refresh);
}

#[tokio::test]
async fn failed_cycle_without_prior_data_shows_no_data() {
	let h = harness(one_account_settings()).await;
	h.provider.set_failing("token-acct", true);

	h.monitor.refresh().await;

	let snapshot = h.monitor.snapshot();
	assert_eq!(snapshot.status, AggregateStatus::NoData, "no error flash on a blip");
	assert!(snapshot.last_error.is_some());
}

#[tokio::test]
async fn failure_then_recovery_emits_both_alerts() {
	let h = harness(one_account_settings()).await;

	h.provider.set_runs(
		"token-acct",
		vec![completed_run("acme/api", "42", "77", RunConclusion::Failure)],
	);
	h.monitor.refresh().await;

	// The rerun that recovers has a fresh run id.
	h.provider.set_runs(
		"token-acct",
		vec![completed_run("acme/api", "42", "78", RunConclusion::Success)],
	);
	h.monitor.refresh().await;

	let alerts = h.sink.alerts();
	assert_eq!(alerts.len(), 2);
	assert_eq!(alerts[0].title, "Pipeline failed");
	assert_eq!(alerts[1].title, "Pipeline recovered");
}

#[tokio::test]
async fn alerts_disabled_suppresses_the_notifier() {
	let mut settings = one_account_settings();
	settings.alerts_enabled = false;
	let h = harness(settings).await;

	h.provider.set_runs(
		"token-acct",
		vec![completed_run("acme/api", "42", "1", RunConclusion::Failure)],
	);
	h.monitor.refresh().await;

	assert!(h.sink.alerts().is_empty());
	assert_eq!(h.monitor.snapshot().status, AggregateStatus::SomeFailing);
}

#[tokio::test]
async fn concurrent_refreshes_are_single_flight() {
	let h = harness(one_account_settings()).await;
	h.provider.set_delay(Duration::from_millis(50));

	let first = {
		let monitor = h.monitor.clone();
		tokio::spawn(async move { monitor.refresh().await })
	};
	let second = {
		let monitor = h.monitor.clone();
		tokio::spawn(async move { monitor.refresh().await })
	};

	first.await.unwrap();
	second.await.unwrap();

	assert_eq!(h.provider.fetch_calls(), 2);
	assert_eq!(h.provider.max_in_flight(), 1, "cycles never overlap");
}

#[tokio::test]
async fn start_refreshes_immediately_and_stop_halts_publication() {
	let h = harness(one_account_settings()).await;
	h.provider.set_runs(
		"token-acct",
		vec![completed_run("acme/api", "42", "1", RunConclusion::Success)],
	);

	let mut rx = h.monitor.subscribe();

	h.monitor.start().await;
	tokio::time::timeout(Duration::from_secs(2), rx.changed())
		.await
		.expect("loop publishes an initial snapshot")
		.unwrap();
	assert_eq!(rx.borrow().status, AggregateStatus::AllPassing);

	h.monitor.stop().await;

	// A wake-up request after stop must not trigger another fetch.
	let fetches_after_stop = h.provider.fetch_calls();
	h.monitor.request_refresh();
	tokio::time::sleep(Duration::from_millis(100)).await;
	assert_eq!(h.provider.fetch_calls(), fetches_after_stop);
}

#[tokio::test]
async fn request_refresh_wakes_a_running_loop() {
	let h = harness(one_account_settings()).await;

	h.monitor.start().await;

	// Wait out the initial refresh, then ask for another.
	let deadline = std::time::Instant::now() + Duration::from_secs(2);
	while h.provider.fetch_calls() < 1 {
		assert!(std::time::Instant::now() < deadline, "initial refresh never ran");
		tokio::time::sleep(Duration::from_millis(10)).await;
	}

	h.monitor.request_refresh();

	let deadline = std::time::Instant::now() + Duration::from_secs(2);
	while h.provider.fetch_calls() < 2 {
		assert!(std::time::Instant::now() < deadline, "on-demand refresh never ran");
		tokio::time::sleep(Duration::from_millis(10)).await;
	}

	h.monitor.stop().await;
}

#[tokio::test]
async fn starting_twice_replaces_the_previous_loop() {
	let h = harness(one_account_settings()).await;

	h.monitor.start().await;
	h.monitor.start().await;
	h.monitor.stop().await;

	// After stop, nothing refreshes anymore; the first loop did not leak.
	let fetches = h.provider.fetch_calls();
	h.monitor.request_refresh();
	tokio::time::sleep(Duration::from_millis(100)).await;
	assert_eq!(h.provider.fetch_calls(), fetches);
}

#[tokio::test]
async fn cancel_action_forces_a_refresh() {
	let h = harness(one_account_settings()).await;
	let run = completed_run("acme/api", "42", "55", RunConclusion::Failure);

	h.monitor.cancel_run(&run).await.unwrap();

	assert_eq!(h.provider.actions(), vec!["cancel:55"]);
	assert_eq!(h.provider.fetch_calls(), 1, "action is followed by one refresh");
}

#[tokio::test]
async fn rerun_without_account_still_refreshes() {
	// No accounts configured: the action fails, the follow-up refresh
	// still runs (and publishes the empty no-data snapshot).
	let h = harness(Settings::default()).await;
	let run = completed_run("acme/api", "42", "55", RunConclusion::Failure);

	let result = h.monitor.rerun(&run).await;

	assert!(result.is_err());
	assert!(h.provider.actions().is_empty());
	assert_eq!(h.monitor.snapshot().status, AggregateStatus::NoData);
}
