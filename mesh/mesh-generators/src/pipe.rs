//! Tubes around parametric curves.

use mesh_buffers::{AttributeSet, Point3, Vector2, Vector3, Vector4, Vertex, VertexView};
use mesh_polygroup::{MeshAggregate, PolyGroupId};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::{samples, ParametricCurve, PlotCurve, SampledFunction};
use crate::error::{GeneratorError, GeneratorResult};
use crate::frame::parallel_transport;
use crate::tube::{check_radius, check_resolution, segment_angle, tube_faces};

/// Extra slot holding `(center.x, center.y, center.z, t)` per vertex.
const CENTER_SLOT: usize = 0;

/// Configuration for [`PipeCurve`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipeConfig {
    /// Tube radius.
    pub radius: f32,
    /// Number of rings along the curve.
    pub rings: usize,
    /// Number of vertices around each ring.
    pub segments: usize,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            radius: 0.05,
            rings: 64,
            segments: 12,
        }
    }
}

impl PipeConfig {
    /// Set the tube radius.
    #[must_use]
    pub const fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Set the number of rings along the curve.
    #[must_use]
    pub const fn with_rings(mut self, rings: usize) -> Self {
        self.rings = rings;
        self
    }

    /// Set the number of vertices around each ring.
    #[must_use]
    pub const fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }
}

/// A tube of constant topology around a curve.
///
/// Ring `i`, segment `j` is local vertex `i * segments + j`. Every vertex
/// keeps its ring centre and curve parameter in extra slot 0, so the radius
/// can be changed without the curve and the curve without rebuilding
/// topology.
///
/// # Example
///
/// ```
/// use mesh_generators::{FnCurve, PipeConfig, PipeCurve};
/// use mesh_buffers::Point3;
///
/// let line = FnCurve::new(|t| Point3::new(0.0, 0.0, t), (0.0, 1.0));
/// let pipe = PipeCurve::new(&line, &PipeConfig::default().with_rings(8))?;
/// assert_eq!(pipe.mesh().total_vertex_count(), 8 * 12);
/// # Ok::<(), mesh_generators::GeneratorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PipeCurve {
    mesh: MeshAggregate,
    id: PolyGroupId,
    config: PipeConfig,
}

impl PipeCurve {
    /// Sweep a circle of `config.radius` along `curve`.
    ///
    /// # Errors
    ///
    /// - [`GeneratorError::TooFewSamples`](crate::GeneratorError::TooFewSamples)
    ///   for fewer than 2 rings or 3 segments;
    /// - [`GeneratorError::InvalidRadius`](crate::GeneratorError::InvalidRadius)
    ///   for a negative or non-finite radius.
    pub fn new<C>(curve: &C, config: &PipeConfig) -> GeneratorResult<Self>
    where
        C: ParametricCurve + ?Sized,
    {
        check_resolution("pipe rings", config.rings, 2)?;
        check_resolution("pipe segments", config.segments, 3)?;
        check_radius(config.radius)?;

        let id = PolyGroupId::curve(0);
        let mut mesh = MeshAggregate::with_attributes(AttributeSet::standard().with_extra(CENTER_SLOT))?;
        let vertices = sweep(curve, config);
        let faces = tube_faces(config.rings, config.segments)?;
        mesh.add_new_polygroup(&vertices, &faces, id.clone())?;

        debug!(
            "Built pipe with {} rings x {} segments",
            config.rings, config.segments
        );
        Ok(Self {
            mesh,
            id,
            config: *config,
        })
    }

    /// Tube around the graph `x ↦ (x, f(x), 0)` over `domain`.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn from_plot<F>(f: F, domain: (f32, f32), config: &PipeConfig) -> GeneratorResult<Self>
    where
        F: Fn(f32) -> f32,
    {
        Self::new(&PlotCurve::new(f, domain), config)
    }

    /// Tube around the graph of a sampled function, one ring per sample.
    ///
    /// `config.rings` is replaced by the number of samples.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn from_samples(plot: &SampledFunction, config: &PipeConfig) -> GeneratorResult<Self> {
        Self::new(plot, &config.with_rings(plot.len()))
    }

    /// Move the tube onto the graph of another function.
    ///
    /// # Errors
    ///
    /// Propagates mesh errors.
    pub fn update_plot<F>(&mut self, f: F, domain: (f32, f32)) -> GeneratorResult<()>
    where
        F: Fn(f32) -> f32,
    {
        self.update_curve(&PlotCurve::new(f, domain))
    }

    /// Move the tube onto the graph of another sampled function.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::SampleCountMismatch`] unless there is one
    /// sample per ring.
    pub fn update_samples(&mut self, plot: &SampledFunction) -> GeneratorResult<()> {
        if plot.len() != self.config.rings {
            return Err(GeneratorError::SampleCountMismatch {
                expected: self.config.rings,
                actual: plot.len(),
            });
        }
        self.update_curve(plot)
    }

    /// Move the tube onto another curve. Topology is unchanged.
    ///
    /// # Errors
    ///
    /// Propagates mesh errors.
    pub fn update_curve<C>(&mut self, curve: &C) -> GeneratorResult<()>
    where
        C: ParametricCurve + ?Sized,
    {
        for (local, vertex) in sweep(curve, &self.config).iter().enumerate() {
            let mut view = self.mesh.vertex_view_mut(&self.id, local)?;
            view.set_vertex(vertex)?;
        }
        debug!("Updated pipe curve");
        Ok(())
    }

    /// Set the radius per ring from its curve parameter.
    ///
    /// # Errors
    ///
    /// Propagates mesh errors.
    pub fn update_radius<F>(&mut self, radius: F) -> GeneratorResult<()>
    where
        F: Fn(f32) -> f32,
    {
        for local in 0..self.mesh.vertex_count(&self.id)? {
            let mut view = self.mesh.vertex_view_mut(&self.id, local)?;
            let packed = view.extra(CENTER_SLOT)?;
            let center = Point3::from(packed.xyz());
            view.set_position(center + view.normal() * radius(packed.w));
        }
        Ok(())
    }

    /// Curve parameter of a pipe vertex.
    ///
    /// # Errors
    ///
    /// Returns a buffer error if the vertex's store has no extra slot 0.
    pub fn curve_parameter(vertex: &VertexView<'_>) -> GeneratorResult<f32> {
        Ok(vertex.extra(CENTER_SLOT)?.w)
    }

    /// The generated mesh.
    pub fn mesh(&self) -> &MeshAggregate {
        &self.mesh
    }

    /// Take the generated mesh.
    pub fn into_mesh(self) -> MeshAggregate {
        self.mesh
    }

    /// Id of the tube's polygroup.
    pub fn id(&self) -> &PolyGroupId {
        &self.id
    }

    /// Configuration the tube was built with.
    pub fn config(&self) -> &PipeConfig {
        &self.config
    }
}

fn sweep<C>(curve: &C, config: &PipeConfig) -> Vec<Vertex>
where
    C: ParametricCurve + ?Sized,
{
    let ts = samples(curve.domain(), config.rings);
    let tangents: Vec<Vector3<f32>> = ts.iter().map(|&t| curve.tangent(t)).collect();
    let frames = parallel_transport(&tangents);
    let ring_last = (config.rings - 1).max(1) as f32;

    let mut vertices = Vec::with_capacity(config.rings * config.segments);
    for (i, (&t, frame)) in ts.iter().zip(&frames).enumerate() {
        let center = curve.position(t);
        for j in 0..config.segments {
            let radial = frame.radial(segment_angle(j, config.segments));
            vertices.push(
                Vertex::new(
                    center + radial * config.radius,
                    radial,
                    Vector2::new(i as f32 / ring_last, j as f32 / config.segments as f32),
                    Vector4::new(1.0, 1.0, 1.0, 1.0),
                )
                .with_extra(CENTER_SLOT, Vector4::new(center.x, center.y, center.z, t)),
            );
        }
    }
    vertices
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::curve::FnCurve;
    use approx::assert_relative_eq;

    fn line() -> FnCurve<impl Fn(f32) -> Point3<f32>> {
        FnCurve::new(|t| Point3::new(0.0, 0.0, t), (0.0, 2.0))
    }

    #[test]
    fn vertices_sit_on_the_tube() {
        let config = PipeConfig::default().with_rings(5).with_segments(6).with_radius(0.5);
        let pipe = PipeCurve::new(&line(), &config).unwrap();
        let id = pipe.id().clone();
        assert_eq!(pipe.mesh().vertex_count(&id).unwrap(), 30);
        assert_eq!(pipe.mesh().triangle_count(&id).unwrap(), 2 * 4 * 6);
        for v in pipe.mesh().vertex_views(&id).unwrap() {
            let p = v.position();
            assert_relative_eq!(Vector2::new(p.x, p.y).norm(), 0.5, epsilon = 1e-5);
        }
    }

    #[test]
    fn faces_point_outward() {
        let config = PipeConfig::default().with_rings(4).with_segments(8);
        let pipe = PipeCurve::new(&line(), &config).unwrap();
        for t in pipe.mesh().triangle_views(pipe.id()).unwrap() {
            let c = t.center();
            let outward = Vector3::new(c.x, c.y, 0.0);
            assert!(t.face_normal().dot(&outward) > 0.0);
        }
    }

    #[test]
    fn update_radius_follows_parameter() {
        let config = PipeConfig::default().with_rings(3).with_segments(4);
        let mut pipe = PipeCurve::new(&line(), &config).unwrap();
        pipe.update_radius(|t| 1.0 + t).unwrap();
        let id = pipe.id().clone();
        for v in pipe.mesh().vertex_views(&id).unwrap() {
            let p = v.position();
            let t = PipeCurve::curve_parameter(&v).unwrap();
            assert_relative_eq!(Vector2::new(p.x, p.y).norm(), 1.0 + t, epsilon = 1e-5);
        }
    }

    #[test]
    fn update_curve_keeps_topology() {
        let config = PipeConfig::default().with_rings(6);
        let mut pipe = PipeCurve::new(&line(), &config).unwrap();
        let faces = pipe.mesh().indices(pipe.id()).unwrap();
        let shifted = FnCurve::new(|t| Point3::new(3.0, 0.0, t), (0.0, 2.0));
        pipe.update_curve(&shifted).unwrap();
        assert_eq!(pipe.mesh().indices(pipe.id()).unwrap(), faces);
        let p = pipe.mesh().vertex_view(pipe.id(), 0).unwrap().position();
        assert_relative_eq!(Vector2::new(p.x - 3.0, p.y).norm(), config.radius, epsilon = 1e-5);
    }

    #[test]
    fn rejects_bad_config() {
        assert!(matches!(
            PipeCurve::new(&line(), &PipeConfig::default().with_rings(1)),
            Err(GeneratorError::TooFewSamples { .. })
        ));
        assert!(matches!(
            PipeCurve::new(&line(), &PipeConfig::default().with_radius(-1.0)),
            Err(GeneratorError::InvalidRadius(_))
        ));
    }

    #[test]
    fn plot_pipe_follows_the_graph() {
        let config = PipeConfig::default().with_rings(9).with_segments(6).with_radius(0.1);
        let mut pipe = PipeCurve::from_plot(|x| 2.0 * x, (0.0, 1.0), &config).unwrap();
        let id = pipe.id().clone();
        for v in pipe.mesh().vertex_views(&id).unwrap() {
            let x = PipeCurve::curve_parameter(&v).unwrap();
            let center = Point3::from(v.extra(CENTER_SLOT).unwrap().xyz());
            assert_relative_eq!(center, Point3::new(x, 2.0 * x, 0.0), epsilon = 1e-5);
            assert_relative_eq!((v.position() - center).norm(), 0.1, epsilon = 1e-5);
        }

        pipe.update_plot(|x| -x, (0.0, 1.0)).unwrap();
        let center = pipe.mesh().vertex_view(&id, 8 * 6).unwrap().extra(CENTER_SLOT).unwrap();
        assert_relative_eq!(center.xyz(), Vector3::new(1.0, -1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn sampled_pipe_has_one_ring_per_sample() {
        let plot = SampledFunction::new((0.0, 3.0), vec![0.0, 1.0, 0.0, 1.0]).unwrap();
        let config = PipeConfig::default().with_segments(5).with_rings(100);
        let mut pipe = PipeCurve::from_samples(&plot, &config).unwrap();
        assert_eq!(pipe.config().rings, 4);
        assert_eq!(pipe.mesh().total_vertex_count(), 20);

        let ring = |pipe: &PipeCurve, i: usize| {
            pipe.mesh()
                .vertex_view(pipe.id(), i * 5)
                .unwrap()
                .extra(CENTER_SLOT)
                .unwrap()
                .xyz()
        };
        assert_relative_eq!(ring(&pipe, 1), Vector3::new(1.0, 1.0, 0.0), epsilon = 1e-5);

        let flipped = SampledFunction::new((0.0, 3.0), vec![1.0, 0.0, 1.0, 0.0]).unwrap();
        pipe.update_samples(&flipped).unwrap();
        assert_relative_eq!(ring(&pipe, 1), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-5);

        let short = SampledFunction::new((0.0, 3.0), vec![1.0, 0.0]).unwrap();
        assert_eq!(
            pipe.update_samples(&short).unwrap_err(),
            GeneratorError::SampleCountMismatch { expected: 4, actual: 2 }
        );
    }
}
