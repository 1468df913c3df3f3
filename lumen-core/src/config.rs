//! Runtime Configuration
//!
//! Tunables for the reactive runtime. The defaults are suitable for normal
//! use; configs can also be loaded from JSON so an embedding application can
//! keep them next to its own settings.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default bound on nested notification passes.
pub const DEFAULT_MAX_UPDATE_DEPTH: usize = 100;

/// Configuration for a [`Runtime`](crate::reactive::Runtime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How deep notification passes may nest before a write is rejected
    /// with [`Error::RecursionLimitExceeded`].
    ///
    /// A write performed inside a render re-enters notification
    /// synchronously, so a render that writes a value it also reads would
    /// otherwise recurse until the stack overflows.
    pub max_update_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_update_depth: DEFAULT_MAX_UPDATE_DEPTH,
        }
    }
}

impl RuntimeConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("invalid runtime config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Builder-style override of [`max_update_depth`](Self::max_update_depth).
    pub fn with_max_update_depth(mut self, depth: usize) -> Self {
        self.max_update_depth = depth;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_update_depth == 0 {
            return Err(Error::Configuration(
                "max_update_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
