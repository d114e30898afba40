//! Client configuration

use vitrine_core::query::executor::DEFAULT_MAX_EMBED_DEPTH;
use vitrine_core::query::ExecutionLimits;

/// Default cap on select spec length in bytes
pub const DEFAULT_MAX_SELECT_LENGTH: usize = 4 * 1024;

/// Configuration carried by a [`Client`](crate::Client) into every query it builds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Hard cap on rows returned by a sequence fetch (`None` = unbounded)
    pub max_rows: Option<usize>,
    /// Deepest relationship expansion a select may request
    pub max_embed_depth: usize,
    /// Longest select spec accepted, in bytes
    pub max_select_length: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_rows: None,
            max_embed_depth: DEFAULT_MAX_EMBED_DEPTH,
            max_select_length: DEFAULT_MAX_SELECT_LENGTH,
        }
    }
}

impl ClientConfig {
    /// Cap the rows any sequence fetch may return
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Set the deepest relationship expansion allowed
    pub fn with_max_embed_depth(mut self, depth: usize) -> Self {
        self.max_embed_depth = depth;
        self
    }

    /// Set the longest select spec accepted
    pub fn with_max_select_length(mut self, length: usize) -> Self {
        self.max_select_length = length;
        self
    }

    /// Limits handed to the executor
    pub fn limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            max_rows: self.max_rows,
            max_embed_depth: self.max_embed_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_rows, None);
        assert_eq!(config.max_embed_depth, 4);
        assert_eq!(config.limits(), ExecutionLimits::default());
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::default()
            .with_max_rows(100)
            .with_max_embed_depth(2)
            .with_max_select_length(256);
        assert_eq!(config.limits().max_rows, Some(100));
        assert_eq!(config.limits().max_embed_depth, 2);
        assert_eq!(config.max_select_length, 256);
    }
}
