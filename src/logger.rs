//! Memory-threshold logger handed to factories as a dependency.
//!
//! Severity is chosen per message by comparing the reported memory usage
//! against the threshold the logger was built with.

use crate::config::LoggerConfig;

/// Severity chosen for a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
}

/// Logger that escalates to a warning once memory usage exceeds its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLogger {
    limit_mb: u64,
}

impl MemoryLogger {
    pub fn new(limit_mb: u64) -> Self {
        Self { limit_mb }
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new(config.limit_mb)
    }

    pub fn limit_mb(&self) -> u64 {
        self.limit_mb
    }

    /// Severity for a given memory reading; a reading equal to the limit is
    /// not above it.
    pub fn severity(&self, memory_mb: u64) -> Severity {
        if memory_mb > self.limit_mb {
            Severity::Warn
        } else {
            Severity::Info
        }
    }

    /// Logs `message` with the current memory reading and returns the
    /// severity used.
    pub fn log(&self, memory_mb: u64, message: &str) -> Severity {
        let severity = self.severity(memory_mb);
        match severity {
            Severity::Warn => tracing::warn!(
                memory_mb,
                limit_mb = self.limit_mb,
                "{}",
                message
            ),
            Severity::Info => tracing::info!(memory_mb, "{}", message),
        }
        severity
    }
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::from_config(&LoggerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LIMIT_MB;

    #[test]
    fn test_threshold() {
        let logger = MemoryLogger::new(100);
        assert_eq!(logger.log(50, "steady"), Severity::Info);
        assert_eq!(logger.log(100, "at limit"), Severity::Info);
        assert_eq!(logger.log(101, "over limit"), Severity::Warn);
    }

    #[test]
    fn test_from_config() {
        let logger = MemoryLogger::from_config(&LoggerConfig { limit_mb: 8 });
        assert_eq!(logger.limit_mb(), 8);
        assert_eq!(MemoryLogger::default().limit_mb(), DEFAULT_LIMIT_MB);
    }
}
