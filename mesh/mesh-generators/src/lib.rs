//! Mesh generators on top of the polygroup aggregate.
//!
//! Each generator owns a [`MeshAggregate`](mesh_polygroup::MeshAggregate)
//! and keeps enough per-vertex data in the attribute store to refresh the
//! geometry later without rebuilding topology:
//!
//! - [`PipeCurve`] - a tube around a [`ParametricCurve`], with
//!   parallel-transport frames; the radius and the curve can both be swapped
//! - [`SurfaceWireframe`] - tubes along the `t` and `u` parameter lines of a
//!   [`ParametricSurface`](mesh_polygroup::ParametricSurface); the wireframe
//!   can be moved onto another surface
//! - [`PipeCurve::from_plot`] and [`PipeCurve::from_samples`] - the same tube
//!   around the graph of a real function, given as a closure or a
//!   [`SampledFunction`]
//! - [`SurfacePlot`] - the graph of a sampled [`HeightField`]
//! - [`PlanarFlowLines`] - flat ribbons along integral curves of a 2D vector
//!   field, seeded on a grid or at random
//! - [`PlanarDiffusedFlow`] - sheets swept through the same kind of field by
//!   a seed interval or curve, fading and narrowing over time
//!
//! # Example
//!
//! ```
//! use mesh_generators::{SurfaceWireframe, SurfaceWireframeConfig};
//! use mesh_polygroup::FnSurface;
//! use mesh_buffers::Point3;
//!
//! let plane = FnSurface::new(|t, u| Point3::new(t, u, 0.0), (0.0, 1.0), (0.0, 1.0));
//! let config = SurfaceWireframeConfig::default().with_lines(4, 4).with_resolution(16, 6);
//! let wire = SurfaceWireframe::new(&plane, &config)?;
//! assert_eq!(wire.mesh().polygroup_count(), 8);
//! # Ok::<(), mesh_generators::GeneratorError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod curve;
mod diffused;
mod error;
mod flow;
mod frame;
mod pipe;
mod surface_plot;
mod surface_wireframe;
mod tube;

pub use curve::{FnCurve, ParametricCurve, PlotCurve, SampledFunction};
pub use diffused::{Diffusion, PlanarDiffusedFlow};
pub use error::{GeneratorError, GeneratorResult};
pub use flow::{FlowLineConfig, FlowSample, PlanarFlowLines};
pub use frame::{parallel_transport, Frame};
pub use pipe::{PipeConfig, PipeCurve};
pub use surface_plot::{HeightField, SurfacePlot};
pub use surface_wireframe::{SurfaceWireframe, SurfaceWireframeConfig};
