//! Error taxonomy for the chain driver.

use thiserror::Error;

/// Errors surfaced by [`run_chain`](crate::core::run_chain) and the
/// adaptation helpers. All variants are fatal: a broken step invalidates
/// every subsequent step, so nothing is retried and no partial trace is
/// returned.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The kernel returned a position whose schema differs from the
    /// initial state's. A well-formed kernel never does this, but kernels
    /// are opaque external objects and the driver checks.
    #[error("kernel output at step {step} does not match the initial schema (expected {expected:?}, got {got:?})")]
    ShapeMismatch {
        step: usize,
        expected: Vec<String>,
        got: Vec<String>,
    },

    /// Fewer seeds than requested steps were supplied.
    #[error("requested {requested} steps but only {supplied} seeds were supplied")]
    InsufficientRandomness { requested: usize, supplied: usize },

    /// The target acceptance rate handed to adaptation must lie in (0, 1).
    #[error("target acceptance rate must lie in (0, 1), got {0}")]
    InvalidTargetAccept(f64),

    /// A failure raised inside an opaque kernel, passed through verbatim.
    #[error(transparent)]
    Kernel(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = DriverError::InsufficientRandomness {
            requested: 5,
            supplied: 3,
        };
        assert_eq!(
            err.to_string(),
            "requested 5 steps but only 3 seeds were supplied"
        );

        let err = DriverError::InvalidTargetAccept(1.5);
        assert!(err.to_string().contains("(0, 1)"));
    }

    #[test]
    fn test_kernel_errors_pass_through_verbatim() {
        let inner: Box<dyn std::error::Error + Send + Sync> =
            "energy is NaN at depth 7".to_string().into();
        let err = DriverError::Kernel(inner);
        assert_eq!(err.to_string(), "energy is NaN at depth 7");
    }
}
