//! Error type shared by the gradient oracles, the leapfrog proposer and the chain driver.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HmcError>;

/// Everything that can go wrong while building or running a Hamiltonian proposal.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum HmcError {
    /// Position and momentum passed to a proposer have different lengths.
    #[error("dimension mismatch: position has length {position}, momentum has length {momentum}")]
    DimensionMismatch { position: usize, momentum: usize },

    /// A vector does not have the length the target density works with.
    #[error("dimension mismatch: density expects length {expected}, got {found}")]
    OracleDimension { expected: usize, found: usize },

    /// The potential or its gradient is not finite at `at`.
    #[error("non-finite {what} at position {at:?}")]
    NumericalDomain { what: &'static str, at: Vec<f64> },

    /// Invalid construction parameters (step size, path length, initial state).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The tensor backend failed to hand back its data.
    #[error("tensor backend error: {0}")]
    Backend(String),
}

impl HmcError {
    /// True for both flavours of dimension mismatch.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            HmcError::DimensionMismatch { .. } | HmcError::OracleDimension { .. }
        )
    }

    /// True when the density could not be evaluated at the requested point.
    pub fn is_numerical_domain(&self) -> bool {
        matches!(self, HmcError::NumericalDomain { .. })
    }

    pub(crate) fn domain<T: num_traits::ToPrimitive>(what: &'static str, at: &[T]) -> Self {
        HmcError::NumericalDomain {
            what,
            at: at.iter().map(|x| x.to_f64().unwrap_or(f64::NAN)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = HmcError::DimensionMismatch {
            position: 3,
            momentum: 2,
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch: position has length 3, momentum has length 2"
        );
        assert!(err.is_dimension_mismatch());
        assert!(!err.is_numerical_domain());

        let err = HmcError::domain("gradient", &[1.0_f32, -2.0]);
        assert_eq!(err.to_string(), "non-finite gradient at position [1.0, -2.0]");
        assert!(err.is_numerical_domain());
    }
}
