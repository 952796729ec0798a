//! Error types for attribute buffer operations.

use thiserror::Error;

use crate::kind::{AttributeKind, AttributeSet};

/// Result type for buffer operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors raised by the attribute buffer store and its views.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Index at or beyond the current length of a buffer.
    #[error("index {index} is out of bounds for the {kind} buffer [{index}/{len}]")]
    IndexOutOfBounds {
        /// Buffer that was accessed.
        kind: AttributeKind,
        /// Requested index.
        index: usize,
        /// Current buffer length.
        len: usize,
    },

    /// Argument that does not fit the store's state.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// Operation needs a buffer the store was built without.
    #[error("{operation} needs the {kind} buffer, which this store does not carry")]
    NotImplemented {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Missing buffer.
        kind: AttributeKind,
    },

    /// Two stores carry different active attribute sets.
    #[error("incompatible attribute sets: {left:?} vs {right:?}")]
    IncompatibleAttributes {
        /// Attribute set of the receiving store.
        left: AttributeSet,
        /// Attribute set of the other store.
        right: AttributeSet,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reports_index_and_length() {
        let err = BufferError::IndexOutOfBounds {
            kind: AttributeKind::Normal,
            index: 7,
            len: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("normal"));
        assert!(msg.contains("[7/3]"));
    }

    #[test]
    fn not_implemented_names_kind() {
        let err = BufferError::NotImplemented {
            operation: "set_extra",
            kind: AttributeKind::Extra2,
        };
        assert!(err.to_string().contains("extra2"));
        assert!(err.to_string().contains("set_extra"));
    }
}
