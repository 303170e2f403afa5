// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub Actions provider for PipeWatch.
//!
//! Implements the [`CiProvider`](pipewatch_core::CiProvider) contract
//! against the GitHub REST API: bearer-token auth, workflow-run listing
//! filtered by creation time, repository discovery with org → user scope
//! fallback, and cancel/rerun actions.

mod client;
mod types;

pub use client::GithubActionsProvider;
