// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pipewatch_common_credentials::{CredentialStore, FileCredentialStore};
use pipewatch_common_secret::SecretString;
use pipewatch_core::{AggregateStatus, CiProvider, MonitorSnapshot};
use pipewatch_monitor::{FetchOrchestrator, PipelineMonitor, TracingSink};
use pipewatch_provider_github::GithubActionsProvider;

use config::{ConfigPaths, FileSettingsSource};

#[derive(Parser)]
#[command(name = "pipewatch", about = "Headless CI pipeline monitor", version)]
struct Cli {
	/// Config directory (default: the platform config dir).
	#[arg(long, env = "PIPEWATCH_CONFIG_DIR", global = true)]
	config_dir: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Monitor pipelines until interrupted, logging status transitions.
	Run,
	/// Execute one refresh cycle and print the board. Exits non-zero when
	/// any workflow is failing.
	Once,
	/// Validate a token and print the account it belongs to.
	Validate {
		/// Personal access token to validate.
		#[arg(long, env = "PIPEWATCH_TOKEN")]
		token: String,
		/// Persist the account and token on success.
		#[arg(long)]
		save: bool,
	},
	/// List the organizations a token can see.
	Orgs {
		/// Personal access token.
		#[arg(long, env = "PIPEWATCH_TOKEN")]
		token: String,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let cli = Cli::parse();
	let paths = ConfigPaths::resolve(cli.config_dir)?;

	match cli.command {
		Command::Run => run(&paths).await,
		Command::Once => once(&paths).await,
		Command::Validate { token, save } => validate(&paths, token, save).await,
		Command::Orgs { token } => orgs(token).await,
	}
}

fn build_monitor(paths: &ConfigPaths) -> PipelineMonitor {
	let credentials = Arc::new(FileCredentialStore::new(paths.credentials_file()));
	let provider: Arc<dyn CiProvider> = Arc::new(GithubActionsProvider::new());
	let orchestrator = FetchOrchestrator::new(vec![provider], credentials);

	PipelineMonitor::new(
		orchestrator,
		Arc::new(FileSettingsSource::new(paths)),
		Arc::new(TracingSink),
	)
}

async fn run(paths: &ConfigPaths) -> Result<()> {
	let monitor = build_monitor(paths);
	let mut snapshots = monitor.subscribe();

	monitor.start().await;

	loop {
		tokio::select! {
			_ = tokio::signal::ctrl_c() => break,
			changed = snapshots.changed() => {
				if changed.is_err() {
					break;
				}
				let snapshot = snapshots.borrow().clone();
				info!(
					status = %snapshot.status,
					runs = snapshot.runs.len(),
					workflows = snapshot.latest_per_workflow().len(),
					"snapshot"
				);
			}
		}
	}

	monitor.stop().await;
	Ok(())
}

async fn once(paths: &ConfigPaths) -> Result<()> {
	let monitor = build_monitor(paths);
	monitor.refresh().await;

	let snapshot = monitor.snapshot();
	print_board(&snapshot);

	if let Some(error) = &snapshot.last_error {
		eprintln!("last error: {error}");
	}

	if snapshot.status == AggregateStatus::SomeFailing {
		std::process::exit(1);
	}
	Ok(())
}

async fn validate(paths: &ConfigPaths, token: String, save: bool) -> Result<()> {
	let provider = GithubActionsProvider::new();
	let token = SecretString::new(token);

	let account = provider.validate_token(&token).await?;
	println!(
		"token belongs to {} ({} on {})",
		account.username, account.id, account.kind
	);

	if save {
		config::add_account(paths, &account)?;
		let credentials = FileCredentialStore::new(paths.credentials_file());
		credentials.set(&account.id, token).await?;
		println!("saved account {}", account.id);
	}

	Ok(())
}

async fn orgs(token: String) -> Result<()> {
	let provider = GithubActionsProvider::new();
	let organizations = provider
		.fetch_organizations(&SecretString::new(token))
		.await?;

	for org in organizations {
		let marker = if org.is_personal { " (personal)" } else { "" };
		println!("{}{marker}", org.login);
	}

	Ok(())
}

fn print_board(snapshot: &MonitorSnapshot) {
	println!("status: {}", snapshot.status);

	for run in snapshot.latest_per_workflow() {
		let outcome = run
			.conclusion
			.map(|conclusion| conclusion.label().to_string())
			.unwrap_or_else(|| run.status.label().to_string());

		println!(
			"  {:<40} {:<16} {} ({})",
			format!("{}: {}", run.repository.full_name, run.name),
			outcome,
			run.branch,
			run.display_title(),
		);
	}
}
