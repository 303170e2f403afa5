// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error taxonomy at the provider boundary.

use pipewatch_common_http::RetryableError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors a CI provider can return.
///
/// Every provider maps its backend's failures onto this taxonomy; the
/// monitor core never sees provider-specific error types.
#[derive(Debug, Error)]
pub enum ProviderError {
	/// A request URL could not be constructed.
	#[error("Invalid URL")]
	InvalidUrl,

	/// The provider returned a body that could not be interpreted.
	#[error("Invalid response from provider: {0}")]
	InvalidResponse(String),

	/// Invalid or expired token.
	#[error("Invalid or expired token. Please re-authenticate.")]
	Unauthorized,

	/// Token lacks the required permissions.
	#[error("Access denied. Please check your token permissions.")]
	Forbidden,

	/// Resource not found.
	#[error("Resource not found")]
	NotFound,

	/// The provider rejected the request as malformed.
	#[error("Validation error: {0}")]
	Validation(String),

	/// Rate limit exceeded.
	#[error("Rate limit exceeded. Please try again later.")]
	RateLimited,

	/// Provider-side failure.
	#[error("Server error ({0}). Please try again later.")]
	Server(u16),

	/// Anything the taxonomy does not name.
	#[error("Error ({status}): {message}")]
	Unknown { status: u16, message: String },

	/// Network-level error during HTTP communication.
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	/// Request timed out.
	#[error("Request timed out")]
	Timeout,
}

impl ProviderError {
	/// Map an HTTP status code (plus error body, if parseable) onto the
	/// taxonomy. Success statuses must be filtered out by the caller.
	pub fn from_status(status: u16, message: impl Into<String>) -> Self {
		match status {
			401 => ProviderError::Unauthorized,
			403 => ProviderError::Forbidden,
			404 => ProviderError::NotFound,
			422 => ProviderError::Validation(message.into()),
			429 => ProviderError::RateLimited,
			500..=599 => ProviderError::Server(status),
			_ => ProviderError::Unknown {
				status,
				message: message.into(),
			},
		}
	}
}

impl RetryableError for ProviderError {
	fn is_retryable(&self) -> bool {
		match self {
			ProviderError::Network(e) => e.is_retryable(),
			ProviderError::Timeout => true,
			ProviderError::RateLimited => true,
			ProviderError::Server(_) => true,
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_codes_map_onto_taxonomy() {
		assert!(matches!(
			ProviderError::from_status(401, ""),
			ProviderError::Unauthorized
		));
		assert!(matches!(
			ProviderError::from_status(403, ""),
			ProviderError::Forbidden
		));
		assert!(matches!(
			ProviderError::from_status(404, ""),
			ProviderError::NotFound
		));
		assert!(matches!(
			ProviderError::from_status(422, "bad field"),
			ProviderError::Validation(_)
		));
		assert!(matches!(
			ProviderError::from_status(429, ""),
			ProviderError::RateLimited
		));
		assert!(matches!(
			ProviderError::from_status(503, ""),
			ProviderError::Server(503)
		));
		assert!(matches!(
			ProviderError::from_status(418, "teapot"),
			ProviderError::Unknown { status: 418, .. }
		));
	}

	#[test]
	fn transient_errors_are_retryable() {
		assert!(ProviderError::Timeout.is_retryable());
		assert!(ProviderError::RateLimited.is_retryable());
		assert!(ProviderError::Server(502).is_retryable());
	}

	#[test]
	fn permanent_errors_are_not_retryable() {
		assert!(!ProviderError::Unauthorized.is_retryable());
		assert!(!ProviderError::Forbidden.is_retryable());
		assert!(!ProviderError::NotFound.is_retryable());
		assert!(!ProviderError::InvalidUrl.is_retryable());
		assert!(!ProviderError::Validation("field".to_string()).is_retryable());
	}
}
