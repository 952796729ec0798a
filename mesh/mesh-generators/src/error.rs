//! Error types for mesh generators.

use mesh_buffers::BufferError;
use mesh_polygroup::MeshError;
use thiserror::Error;

/// Result type for generator operations.
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Errors that can occur while building or refreshing a generated mesh.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeneratorError {
    /// Failure inside the mesh aggregate.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Failure inside the attribute store.
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// A sampling resolution is below what the generator needs.
    #[error("{what} needs at least {min} samples, got {actual}")]
    TooFewSamples {
        /// Which resolution was rejected.
        what: &'static str,
        /// Minimum accepted value.
        min: usize,
        /// Supplied value.
        actual: usize,
    },

    /// Tube radius or ribbon width is negative or not finite.
    #[error("invalid radius: {0}")]
    InvalidRadius(f32),

    /// Integration step is zero or not finite.
    #[error("invalid time step: {0}")]
    InvalidStep(f32),

    /// A parameter interval is empty, reversed or not finite.
    #[error("invalid domain [{min}, {max}]")]
    InvalidDomain {
        /// Lower end.
        min: f32,
        /// Upper end.
        max: f32,
    },

    /// A sample list does not match the size the mesh was built with.
    #[error("expected {expected} samples, got {actual}")]
    SampleCountMismatch {
        /// Required number of samples.
        expected: usize,
        /// Supplied number of samples.
        actual: usize,
    },

    /// Start times and start points disagree in number.
    #[error("{points} start points but {times} start times")]
    StartTimesMismatch {
        /// Number of start points.
        points: usize,
        /// Number of start times.
        times: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_polygroup::PolyGroupId;

    #[test]
    fn mesh_errors_pass_through() {
        let err = GeneratorError::from(MeshError::UnknownPolygroup(PolyGroupId::from(3)));
        assert_eq!(
            err.to_string(),
            MeshError::UnknownPolygroup(PolyGroupId::from(3)).to_string()
        );
    }

    #[test]
    fn resolution_message() {
        let err = GeneratorError::TooFewSamples {
            what: "pipe rings",
            min: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "pipe rings needs at least 2 samples, got 1");
    }
}
