//! Polygroup triangle meshes for a rendering pipeline.
//!
//! This umbrella crate re-exports the mesh-* crates behind one API. All of
//! them are Layer 0 (no engine or GPU dependencies) and produce data that a
//! GPU upload layer consumes through [`buffers::RenderBinding`].
//!
//! # Quick Start
//!
//! ```
//! use mesh::prelude::*;
//!
//! let sphere = FnSurface::new(
//!     |t: f32, u: f32| Point3::new(t.sin() * u.cos(), t.sin() * u.sin(), t.cos()),
//!     (0.1, 3.0),
//!     (0.0, std::f32::consts::TAU),
//! );
//! let id = PolyGroupId::from("sphere");
//! let mut mesh = MeshAggregate::from_surface(&sphere, 16, 32, id.clone())?;
//!
//! // One smoothing step, then refresh the normals.
//! mesh.mean_curvature_flow_deform(1e-4, &id)?;
//! mesh.recalculate_normals(&id)?;
//!
//! let bindings = mesh.render_bindings();
//! assert!(!bindings.is_empty());
//! # Ok::<(), mesh::polygroup::MeshError>(())
//! ```
//!
//! # Module Organization
//!
//! - [`buffers`] - attribute kinds, the struct-of-arrays store, vertex and
//!   triangle views, render export
//! - [`polygroup`] - the mesh aggregate: topology, normals, curvature,
//!   subdivision, wireframes, transforms and integrals
//! - [`generators`] - surface wireframes, pipe curves, surface plots, planar
//!   flow lines and diffused flow sheets
//!
//! # Feature Flags
//!
//! - `serde` - serialization for ids, attribute sets and generator configs

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

// =============================================================================
// Re-exports
// =============================================================================

/// Attribute storage, views and render export.
pub use mesh_buffers as buffers;

/// Polygroup mesh aggregate and its geometry operations.
pub use mesh_polygroup as polygroup;

/// Generators composed over the aggregate.
pub use mesh_generators as generators;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for mesh work.
///
/// # Usage
///
/// ```
/// use mesh::prelude::*;
/// ```
pub mod prelude {
    // Math
    pub use mesh_buffers::{Matrix3, Matrix4, Point3, Vector2, Vector3, Vector4};

    // Storage
    pub use mesh_buffers::{AttributeBufferStore, AttributeKind, AttributeSet, Vertex, VertexView};

    // Aggregate
    pub use mesh_polygroup::{
        FnSurface, GroupTopology, MeshAggregate, MeshError, MeshResult, ParametricSurface, PolyGroupId,
        WireframeParams,
    };

    // Generators
    pub use mesh_generators::{
        Diffusion, FlowLineConfig, FnCurve, HeightField, ParametricCurve, PipeConfig, PipeCurve,
        PlanarDiffusedFlow, PlanarFlowLines, SampledFunction, SurfacePlot, SurfaceWireframe,
        SurfaceWireframeConfig,
    };
}

// =============================================================================
// Tests
// =============================================================================
