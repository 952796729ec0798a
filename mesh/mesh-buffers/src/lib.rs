//! Vertex attribute storage for polygroup meshes.
//!
//! This crate provides the memory layer beneath the mesh aggregate:
//!
//! - [`AttributeKind`] / [`AttributeSet`] - named per-vertex channels and the
//!   set a store carries
//! - [`AttributeBufferStore`] - one contiguous buffer per active kind plus
//!   the triangle index buffer
//! - [`Vertex`] - the owned record vertices take outside a store
//! - [`VertexView`] / [`TriangleView`] - non-owning `(store, index)` handles
//!   with typed access and per-triangle geometry
//! - [`RenderBinding`] - raw byte export for a GPU upload layer
//!
//! # Layer 0 Crate
//!
//! No engine or GPU dependencies. Everything is synchronous and
//! single-threaded; exclusive access for mutation is enforced by `&mut`.
//!
//! # Precision
//!
//! All attributes are stored as `f32` (indices as `u32`) because the
//! buffer layout is what the upload layer reads directly.
//!
//! # Example
//!
//! ```
//! use mesh_buffers::{AttributeBufferStore, AttributeKind, Vertex, Vector4};
//!
//! let mut store = AttributeBufferStore::with_material(false, &[0]);
//! let v = Vertex::from_coords(0.0, 1.0, 0.0).with_extra(0, Vector4::new(1.0, 0.0, 0.0, 0.0));
//! let i = store.add_vertex(&v)?;
//!
//! assert_eq!(store.vertex(i)?, v);
//! assert_eq!(store.buffer_size(AttributeKind::Extra0), 16);
//! # Ok::<(), mesh_buffers::BufferError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod export;
mod kind;
mod store;
mod triangle;
mod vertex;
mod view;

pub use error::{BufferError, BufferResult};
pub use export::RenderBinding;
pub use kind::{AttributeKind, AttributeSet, EXTRA_SLOTS, MATERIAL_COLUMNS};
pub use store::AttributeBufferStore;
pub use triangle::{TriangleView, TriangleViewMut};
pub use vertex::{Vertex, VertexAttributes};
pub use view::{VertexView, VertexViewMut};

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix2, Matrix3, Matrix4, Point3, Vector2, Vector3, Vector4};
