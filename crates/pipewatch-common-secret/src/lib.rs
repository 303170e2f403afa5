// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret wrapper type that prevents accidental logging of sensitive values.
//!
//! CI tokens pass through every layer of the monitor (HTTP headers, the
//! credential store, settings plumbing), so they are wrapped in [`Secret<T>`]
//! from the moment they enter the process:
//!
//! - Debug/Display always print `[REDACTED]`
//! - Serialize always emits `"[REDACTED]"` (config dumps cannot leak)
//! - Memory is zeroized on drop
//! - Reading the value requires an explicit `.expose()` call
//!
//! ```
//! use pipewatch_common_secret::Secret;
//!
//! let token = Secret::new("ghp_example".to_string());
//! assert_eq!(format!("{token}"), "[REDACTED]");
//! assert_eq!(token.expose(), "ghp_example");
//! ```

use std::fmt;
use zeroize::Zeroize;

/// The redaction placeholder used in all output.
pub const REDACTED: &str = "[REDACTED]";

/// A wrapper for sensitive values that prevents accidental exposure.
///
/// No `Deref` impl; call sites must opt in to seeing the secret via
/// [`Secret::expose`], which keeps secret access visible in code review.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

/// Convenience alias for the common case of secret strings.
pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	/// Create a new secret wrapper around the given value.
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Explicitly access the inner value.
	pub fn expose(&self) -> &T {
		&self.inner
	}

	/// Consume the wrapper and return a copy of the inner value.
	///
	/// Clones rather than moves so the original secret memory is still
	/// zeroized on drop.
	pub fn into_inner(self) -> T
	where
		T: Clone,
	{
		self.inner.clone()
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

impl<T> serde::Serialize for Secret<T>
where
	T: serde::Serialize + Zeroize,
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de, T> serde::Deserialize<'de> for Secret<T>
where
	T: serde::Deserialize<'de> + Zeroize,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let inner = T::deserialize(deserializer)?;
		Ok(Secret::new(inner))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Verifies that Debug output never contains the secret value.
	#[test]
	fn debug_is_redacted() {
		let secret = Secret::new("ghp_super-secret".to_string());
		let debug_output = format!("{secret:?}");

		assert!(!debug_output.contains("ghp_super-secret"));
		assert!(debug_output.contains(REDACTED));
	}

	/// Verifies that Display output never contains the secret value.
	#[test]
	fn display_is_redacted() {
		let secret = Secret::new("ghp_super-secret".to_string());
		assert_eq!(format!("{secret}"), REDACTED);
	}

	#[test]
	fn expose_returns_inner_value() {
		let secret = Secret::new("ghp_token".to_string());
		assert_eq!(secret.expose(), "ghp_token");
	}

	#[test]
	fn into_inner_returns_owned_value() {
		let secret = Secret::new("ghp_token".to_string());
		assert_eq!(secret.into_inner(), "ghp_token");
	}

	/// Verifies that serialization emits the redaction placeholder, so a
	/// settings or state dump can never carry a live token.
	#[test]
	fn serialize_is_redacted() {
		let secret = Secret::new("ghp_super-secret".to_string());
		let json = serde_json::to_string(&secret).unwrap();

		assert_eq!(json, format!("\"{REDACTED}\""));
	}

	#[test]
	fn deserialize_preserves_value() {
		let secret: SecretString = serde_json::from_str("\"ghp_token\"").unwrap();
		assert_eq!(secret.expose(), "ghp_token");
	}

	#[test]
	fn equality_compares_inner_values() {
		let a = Secret::new("same".to_string());
		let b = Secret::new("same".to_string());
		let c = Secret::new("different".to_string());

		assert_eq!(a, b);
		assert_ne!(a, c);
	}
}
