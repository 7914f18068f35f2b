//! Error reporting for pipeline stages.
//!
//! A stage that hits an error reports it here and then stops; there is no
//! channel carrying errors between stages.

use crate::error::DcaError;

/// Trait for reporting stage errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a stage.
    fn report(&self, stage: &str, error: &DcaError);
}

/// Reporter that logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, stage: &str, error: &DcaError) {
        tracing::error!(stage, "{}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_reporter() {
        let reporter = LogReporter;
        let error = DcaError::malformed("test error");
        // Just ensure it doesn't panic
        reporter.report("reader", &error);
    }
}
