//! Paths served without credential checks.

// self
use crate::_prelude::*;

/// Single allow-list rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExemptPath {
	/// Matches every path starting with the value.
	Prefix(String),
	/// Matches the value exactly.
	Exact(String),
}
impl ExemptPath {
	/// Creates a prefix rule.
	pub fn prefix(value: impl Into<String>) -> Self {
		Self::Prefix(value.into())
	}

	/// Creates an exact rule.
	pub fn exact(value: impl Into<String>) -> Self {
		Self::Exact(value.into())
	}

	/// Returns `true` when `path` satisfies the rule.
	pub fn matches(&self, path: &str) -> bool {
		match self {
			ExemptPath::Prefix(prefix) => path.starts_with(prefix.as_str()),
			ExemptPath::Exact(exact) => path == exact,
		}
	}
}

/// Static allow-list of paths that skip credential processing.
///
/// Exempt paths are still subject to admission control.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExemptPaths(Vec<ExemptPath>);
impl ExemptPaths {
	/// Creates an allow-list from explicit rules.
	pub fn new(rules: impl IntoIterator<Item = ExemptPath>) -> Self {
		Self(rules.into_iter().collect())
	}

	/// Allow-list that exempts nothing.
	pub fn none() -> Self {
		Self(Vec::new())
	}

	/// Login, provider callback, health, and documentation endpoints.
	pub fn defaults() -> Self {
		Self::new([
			ExemptPath::prefix("/api/auth/"),
			ExemptPath::exact("/api/figma/callback"),
			ExemptPath::prefix("/actuator/"),
			ExemptPath::prefix("/api-docs"),
			ExemptPath::prefix("/swagger-ui"),
		])
	}

	/// Returns `true` when any rule matches `path`.
	pub fn is_exempt(&self, path: &str) -> bool {
		self.0.iter().any(|rule| rule.matches(path))
	}

	/// Iterates over the rules.
	pub fn iter(&self) -> impl Iterator<Item = &ExemptPath> {
		self.0.iter()
	}
}
impl Default for ExemptPaths {
	fn default() -> Self {
		Self::defaults()
	}
}
