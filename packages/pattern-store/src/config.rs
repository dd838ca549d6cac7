//! Dispatcher configuration.

use serde::{Deserialize, Serialize};

use patternfs_core_store::Error;

/// Default bound on how many references a single read may follow.
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 32;

/// Tunables for a [`PatternStore`](crate::PatternStore).
///
/// Loadable from JSON; missing fields take their defaults:
///
/// ```rust
/// use patternfs_pattern_store::DispatchConfig;
///
/// let config = DispatchConfig::from_json(r#"{"max_reference_depth": 4}"#).unwrap();
/// assert_eq!(config.max_reference_depth, Some(4));
///
/// // `null` disables the bound entirely.
/// let unbounded = DispatchConfig::from_json(r#"{"max_reference_depth": null}"#).unwrap();
/// assert_eq!(unbounded, DispatchConfig::unbounded());
///
/// assert_eq!(DispatchConfig::from_json("{}").unwrap(), DispatchConfig::default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// How many references one read may follow before failing with
    /// `Error::ReferenceDepthExceeded`. `None` follows references without
    /// limit, so a reference cycle never terminates.
    pub max_reference_depth: Option<usize>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_reference_depth: Some(DEFAULT_MAX_REFERENCE_DEPTH),
        }
    }
}

impl DispatchConfig {
    /// Follow references without any depth limit.
    pub fn unbounded() -> Self {
        Self {
            max_reference_depth: None,
        }
    }

    #[must_use]
    pub fn with_max_reference_depth(mut self, depth: usize) -> Self {
        self.max_reference_depth = Some(depth);
        self
    }

    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::Config {
            message: e.to_string(),
        })
    }
}
