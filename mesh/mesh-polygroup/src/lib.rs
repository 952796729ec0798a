//! Polygroup mesh aggregate.
//!
//! A [`MeshAggregate`] owns one [`AttributeBufferStore`](mesh_buffers::AttributeBufferStore)
//! and partitions it into named sub-meshes ([`Polygroup`]s) that hold only
//! index lists. Everything else is scoped to one polygroup at a time:
//!
//! - **Construction** - [`add_new_polygroup`](MeshAggregate::add_new_polygroup),
//!   surface sampling, copy and merge
//! - **Topology** - 1-ring neighbours, ordered fans, normal estimation and
//!   face orientation ([`GroupTopology`])
//! - **Curvature** - cotangent mean curvature, angle-defect Gauss curvature
//!   and explicit mean curvature flow
//! - **Editing** - barycentric and edge subdivision, edge wireframes, affine
//!   transforms and per-vertex deformation callbacks
//! - **Integrals** - area, centre of mass and inertia tensors
//!
//! Inside a polygroup vertices are addressed by their **local index**, the
//! position in the group's vertex list.
//!
//! # Example
//!
//! ```
//! use mesh_polygroup::{MeshAggregate, PolyGroupId};
//! use mesh_buffers::Vertex;
//!
//! let vertices = vec![
//!     Vertex::from_coords(0.0, 0.0, 0.0),
//!     Vertex::from_coords(1.0, 0.0, 0.0),
//!     Vertex::from_coords(0.0, 1.0, 0.0),
//! ];
//! let id = PolyGroupId::from("face");
//! let mut mesh = MeshAggregate::from_polygroup(&vertices, &[[0, 1, 2]], id.clone())?;
//! mesh.recalculate_normals(&id)?;
//!
//! let fine = mesh.subdivide_edgecentric(&id)?;
//! assert_eq!(fine.triangle_count(&id)?, 4);
//! assert!((fine.surface_area(&id)? - 0.5).abs() < 1e-6);
//! # Ok::<(), mesh_polygroup::MeshError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod aggregate;
mod curvature;
mod error;
mod id;
mod integrate;
mod normals;
mod subdivide;
mod surface;
mod topology;
mod transform;
mod wireframe;

pub use aggregate::{MeshAggregate, Polygroup};
pub use error::{MeshError, MeshResult};
pub use id::PolyGroupId;
pub use surface::{FnSurface, ParametricSurface};
pub use topology::GroupTopology;
pub use wireframe::WireframeParams;
