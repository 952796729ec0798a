//! Error types for mesh aggregate operations.

use mesh_buffers::BufferError;
use thiserror::Error;

use crate::id::PolyGroupId;

/// Errors that can occur in mesh aggregate operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// Failure reported by the underlying attribute store.
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// No polygroup with this id exists.
    #[error("unknown polygroup {0}")]
    UnknownPolygroup(PolyGroupId),

    /// The operation needs at least one vertex or triangle in the group.
    #[error("polygroup {0} is empty")]
    EmptyPolygroup(PolyGroupId),

    /// A face refers to a vertex beyond the supplied vertex list.
    #[error("face {face} refers to vertex {index}, but only {vertex_count} vertices were given [{index}/{vertex_count}]")]
    FaceIndexOutOfBounds {
        /// Position of the face in the input list.
        face: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices supplied.
        vertex_count: usize,
    },

    /// A local vertex or triangle index beyond the group's size.
    #[error("local index {index} is out of bounds for polygroup {id} [{index}/{len}]")]
    LocalIndexOutOfBounds {
        /// Polygroup that was queried.
        id: PolyGroupId,
        /// Requested local index.
        index: usize,
        /// Number of entries in the group.
        len: usize,
    },

    /// Argument that does not fit the aggregate's state.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
}

/// Result type for mesh aggregate operations.
pub type MeshResult<T> = std::result::Result<T, MeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_error_reports_bound() {
        let err = MeshError::FaceIndexOutOfBounds {
            face: 2,
            index: 9,
            vertex_count: 4,
        };
        let display = format!("{err}");
        assert!(display.contains("face 2"));
        assert!(display.contains("[9/4]"));
    }

    #[test]
    fn buffer_errors_are_transparent() {
        let inner = BufferError::IllegalArgument("x".into());
        let err: MeshError = inner.clone().into();
        assert_eq!(err.to_string(), inner.to_string());
    }

    #[test]
    fn unknown_group_names_id() {
        let err = MeshError::UnknownPolygroup(PolyGroupId::from("wing"));
        assert!(err.to_string().contains("wing"));
    }
}
