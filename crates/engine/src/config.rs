//! Engine configuration
//!
//! A small, explicit config struct rather than a builder: the engine has
//! exactly one knob worth exposing today, so a builder would be ceremony
//! without payoff. New knobs get added here as plain fields instead of a
//! fluent API.

use filestore_core::IsolationLevel;

/// Configuration for a [`TransactionEngine`](crate::engine::TransactionEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Isolation level assigned to transactions started via
    /// [`TransactionEngine::begin_default`](crate::engine::TransactionEngine::begin_default).
    pub default_isolation: IsolationLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_isolation: IsolationLevel::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_snapshot_isolation() {
        assert_eq!(EngineConfig::default().default_isolation, IsolationLevel::Snapshot);
    }
}
