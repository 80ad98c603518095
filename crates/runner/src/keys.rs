//! API key pool
//!
//! Keys are read from one environment variable holding a comma-separated
//! list. Prompt `n` (1-based) uses key `((n - 1) / prompts_per_key) % len`,
//! so each key serves a contiguous block of prompts before the next takes
//! over. Keys never appear in `Debug` output.

use std::fmt;

use crate::error::{Result, RunnerError};

#[derive(Clone)]
pub struct ApiKeys {
    keys: Vec<String>,
    prompts_per_key: usize,
}

impl ApiKeys {
    /// Parse a comma-separated list, ignoring blanks
    pub fn parse(raw: &str, prompts_per_key: usize) -> Option<Self> {
        let keys: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        (!keys.is_empty()).then_some(Self {
            keys,
            prompts_per_key: prompts_per_key.max(1),
        })
    }

    /// Keys from the environment variable `env`
    pub fn from_env(env: &str, prompts_per_key: usize) -> Result<Self> {
        std::env::var(env)
            .ok()
            .and_then(|raw| Self::parse(&raw, prompts_per_key))
            .ok_or_else(|| RunnerError::MissingApiKeys {
                env: env.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Slot used for prompt `sequence` (1-based)
    pub fn slot(&self, sequence: usize) -> usize {
        (sequence.saturating_sub(1) / self.prompts_per_key) % self.keys.len()
    }

    /// Key used for prompt `sequence` (1-based)
    pub fn for_sequence(&self, sequence: usize) -> &str {
        &self.keys[self.slot(sequence)]
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeys")
            .field("count", &self.keys.len())
            .field("prompts_per_key", &self.prompts_per_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_skips_blanks() {
        let keys = ApiKeys::parse(" a, b ,,c ", 2).unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys.for_sequence(1), "a");
        assert!(ApiKeys::parse(" , ", 2).is_none());
    }

    #[test]
    fn test_rotation_blocks() {
        let keys = ApiKeys::parse("k1,k2,k3", 450).unwrap();
        assert_eq!(keys.for_sequence(1), "k1");
        assert_eq!(keys.for_sequence(450), "k1");
        assert_eq!(keys.for_sequence(451), "k2");
        assert_eq!(keys.for_sequence(901), "k3");
        // wraps around after the last key
        assert_eq!(keys.for_sequence(1351), "k1");
    }

    #[test]
    fn test_debug_hides_keys() {
        let keys = ApiKeys::parse("secret-1,secret-2", 1).unwrap();
        let shown = format!("{keys:?}");
        assert!(!shown.contains("secret"));
        assert!(shown.contains("count: 2"));
    }

    #[test]
    fn test_missing_env() {
        let err = ApiKeys::from_env("RESUME_AUDIT_TEST_NO_SUCH_VAR", 10).unwrap_err();
        assert!(matches!(err, RunnerError::MissingApiKeys { .. }));
    }
}
