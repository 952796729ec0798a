//! Ribbons along integral curves of a planar vector field.
//!
//! Vertex layout of every ribbon:
//!
//! | channel  | contents                                   |
//! |----------|--------------------------------------------|
//! | position | `(x, y, 0)` offset sideways by half width  |
//! | normal   | `(0, 0, 1)`                                |
//! | uv       | `(t, side)`, side 0 on the left, 1 right   |
//! | color    | user color                                 |
//! | extra0   | `(t0, x0, y0, arc length)`                 |
//! | extra1   | `(speed, width, 0, 0)`                     |

use mesh_buffers::{AttributeSet, Point3, Vector2, Vector3, Vector4, Vertex, VertexView};
use mesh_polygroup::{MeshAggregate, PolyGroupId};
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::curve::samples;
use crate::error::{GeneratorError, GeneratorResult};
use crate::tube::{check_resolution, strip_faces};

const START_SLOT: usize = 0;
const MOTION_SLOT: usize = 1;

/// Integration settings for [`PlanarFlowLines`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlowLineConfig {
    /// Euler time step. Negative values integrate backwards.
    pub dt: f32,
    /// Number of steps per line; a line has `steps + 1` samples.
    pub steps: usize,
}

impl Default for FlowLineConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,
            steps: 100,
        }
    }
}

impl FlowLineConfig {
    /// Set the time step.
    #[must_use]
    pub const fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    /// Set the number of steps.
    #[must_use]
    pub const fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }
}

/// Flow-line ribbons of the field `X`.
///
/// Width and color are evaluated per sample as
/// `f(t, t0, speed, x, x0)`, with `t` the absolute time, `t0` the line's
/// start time, `x` the current and `x0` the start point.
///
/// # Example
///
/// ```
/// use mesh_generators::{FlowLineConfig, PlanarFlowLines};
/// use mesh_buffers::{Vector2, Vector4};
///
/// let mut lines = PlanarFlowLines::new(
///     |x: Vector2<f32>| Vector2::new(-x.y, x.x),
///     &FlowLineConfig::default().with_steps(20),
///     |_t, _t0, _speed, _x, _x0| 0.01,
///     |_t, _t0, _speed, _x, _x0| Vector4::new(1.0, 0.5, 0.0, 1.0),
/// )?;
/// lines.generate_grid(Vector2::new(0.5, 0.5), Vector2::new(1.0, 1.0), (2, 2));
/// lines.generate_lines()?;
/// assert_eq!(lines.mesh().polygroup_count(), 4);
/// # Ok::<(), mesh_generators::GeneratorError>(())
/// ```
pub struct PlanarFlowLines<X, W, C> {
    field: X,
    config: FlowLineConfig,
    width: W,
    color: C,
    start_points: Vec<Vector2<f32>>,
    start_times: Vec<f32>,
    ids: Vec<PolyGroupId>,
    mesh: MeshAggregate,
}

impl<X, W, C> PlanarFlowLines<X, W, C>
where
    X: Fn(Vector2<f32>) -> Vector2<f32>,
    W: Fn(f32, f32, f32, Vector2<f32>, Vector2<f32>) -> f32,
    C: Fn(f32, f32, f32, Vector2<f32>, Vector2<f32>) -> Vector4<f32>,
{
    /// Set up a generator with no start points.
    ///
    /// # Errors
    ///
    /// - [`GeneratorError::InvalidStep`] if `dt` is zero or not finite;
    /// - [`GeneratorError::TooFewSamples`] if `steps` is zero.
    pub fn new(field: X, config: &FlowLineConfig, width: W, color: C) -> GeneratorResult<Self> {
        check_flow_config(config)?;
        Ok(Self {
            field,
            config: *config,
            width,
            color,
            start_points: Vec::new(),
            start_times: Vec::new(),
            ids: Vec::new(),
            mesh: empty_mesh()?,
        })
    }

    /// Start points on a `res.0 × res.1` grid spanning `[min, max]`, all
    /// starting at time 0.
    pub fn generate_grid(&mut self, min: Vector2<f32>, max: Vector2<f32>, res: (usize, usize)) {
        let xs = samples((min.x, max.x), res.0);
        let ys = samples((min.y, max.y), res.1);
        self.start_points = xs
            .iter()
            .flat_map(|&x| ys.iter().map(move |&y| Vector2::new(x, y)))
            .collect();
        self.generate_start_times_all_zero();
    }

    /// `n` start points drawn uniformly from `[min, max]`, all starting at
    /// time 0.
    pub fn generate_random_uniform(&mut self, min: Vector2<f32>, max: Vector2<f32>, n: usize) {
        let mut rng = rand::thread_rng();
        self.start_points = (0..n)
            .map(|_| {
                let r = Vector2::new(rng.gen::<f32>(), rng.gen::<f32>());
                min + (max - min).component_mul(&r)
            })
            .collect();
        self.generate_start_times_all_zero();
    }

    /// Replace the start points; start times are reset to 0.
    pub fn set_start_points(&mut self, points: Vec<Vector2<f32>>) {
        self.start_points = points;
        self.generate_start_times_all_zero();
    }

    /// Every line starts at time 0.
    pub fn generate_start_times_all_zero(&mut self) {
        self.start_times = vec![0.0; self.start_points.len()];
    }

    /// Start times drawn uniformly from `[0, t_max]`.
    pub fn generate_start_times_uniform(&mut self, t_max: f32) {
        let mut rng = rand::thread_rng();
        self.start_times = (0..self.start_points.len())
            .map(|_| rng.gen::<f32>() * t_max)
            .collect();
    }

    /// Replace the start times.
    pub fn set_start_times(&mut self, times: Vec<f32>) {
        self.start_times = times;
    }

    /// Integrate every start point and rebuild the mesh, one polygroup per
    /// line (`PolyGroupId::curve(k)`).
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::StartTimesMismatch`] if there are not as many
    /// start times as start points.
    pub fn generate_lines(&mut self) -> GeneratorResult<()> {
        if self.start_times.len() != self.start_points.len() {
            return Err(GeneratorError::StartTimesMismatch {
                points: self.start_points.len(),
                times: self.start_times.len(),
            });
        }

        let mut mesh = empty_mesh()?;
        let faces = strip_faces(self.config.steps + 1, 2)?;
        let mut ids = Vec::with_capacity(self.start_points.len());
        for (k, (&x0, &t0)) in self.start_points.iter().zip(&self.start_times).enumerate() {
            let vertices = self.line_vertices(x0, t0);
            let id = PolyGroupId::curve(k);
            mesh.add_new_polygroup(&vertices, &faces, id.clone())?;
            ids.push(id);
        }

        info!(
            "Generated {} flow lines of {} steps",
            ids.len(),
            self.config.steps
        );
        self.mesh = mesh;
        self.ids = ids;
        Ok(())
    }

    fn line_vertices(&self, x0: Vector2<f32>, t0: f32) -> Vec<Vertex> {
        let dt = self.config.dt;
        let mut vertices = Vec::with_capacity(2 * (self.config.steps + 1));
        let mut x = x0;
        let mut direction = Vector2::x();
        let mut length = 0.0_f32;

        for s in 0..=self.config.steps {
            let t = t0 + s as f32 * dt;
            let velocity = (self.field)(x);
            let speed = velocity.norm();
            let step = velocity * dt;
            if let Some(d) = step.try_normalize(f32::EPSILON) {
                direction = d;
            }
            let w = (self.width)(t, t0, speed, x, x0);
            let color = (self.color)(t, t0, speed, x, x0);
            let left = Vector2::new(-direction.y, direction.x) * (0.5 * w);

            for (side, offset) in [(0.0, left), (1.0, -left)] {
                let p = x + offset;
                vertices.push(
                    Vertex::new(
                        Point3::new(p.x, p.y, 0.0),
                        Vector3::z(),
                        Vector2::new(t, side),
                        color,
                    )
                    .with_extra(START_SLOT, Vector4::new(t0, x0.x, x0.y, length))
                    .with_extra(MOTION_SLOT, Vector4::new(speed, w, 0.0, 0.0)),
                );
            }

            length += step.norm();
            x += step;
        }
        debug!("Integrated flow line from ({}, {})", x0.x, x0.y);
        vertices
    }

    /// The generated mesh. Empty until [`generate_lines`](Self::generate_lines).
    pub fn mesh(&self) -> &MeshAggregate {
        &self.mesh
    }

    /// Take the generated mesh.
    pub fn into_mesh(self) -> MeshAggregate {
        self.mesh
    }

    /// Polygroup ids of the generated lines, in start-point order.
    pub fn ids(&self) -> &[PolyGroupId] {
        &self.ids
    }

    /// Vertices of line `k` as flow samples, two per integration step.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`](mesh_polygroup::MeshError::UnknownPolygroup) if
    /// there is no line `k`.
    pub fn line_samples(&self, k: usize) -> GeneratorResult<Vec<FlowSample<'_>>> {
        Ok(self
            .mesh
            .vertex_views(&PolyGroupId::curve(k))?
            .into_iter()
            .map(FlowSample::new)
            .collect())
    }

    /// Current start points.
    pub fn start_points(&self) -> &[Vector2<f32>] {
        &self.start_points
    }

    /// Current start times.
    pub fn start_times(&self) -> &[f32] {
        &self.start_times
    }
}

/// Read access to the flow-line channels of one ribbon vertex.
#[derive(Debug, Clone, Copy)]
pub struct FlowSample<'a> {
    view: VertexView<'a>,
}

impl<'a> FlowSample<'a> {
    /// Wrap a vertex of a flow-line mesh.
    pub const fn new(view: VertexView<'a>) -> Self {
        Self { view }
    }

    /// The underlying vertex.
    pub const fn view(&self) -> VertexView<'a> {
        self.view
    }

    /// Time since the line started.
    ///
    /// # Errors
    ///
    /// Returns a buffer error if the vertex lacks the flow-line slots.
    pub fn time_relative(&self) -> GeneratorResult<f32> {
        Ok(self.time_absolute() - self.t0()?)
    }

    /// Start time of the vertex's line.
    ///
    /// # Errors
    ///
    /// Returns a buffer error if the vertex lacks the flow-line slots.
    pub fn t0(&self) -> GeneratorResult<f32> {
        Ok(self.view.extra(START_SLOT)?.x)
    }

    /// Absolute time of the sample.
    pub fn time_absolute(&self) -> f32 {
        self.view.uv().x
    }

    /// Planar position of the vertex.
    pub fn position(&self) -> Vector2<f32> {
        self.view.position().coords.xy()
    }

    /// Start point of the vertex's line.
    ///
    /// # Errors
    ///
    /// Returns a buffer error if the vertex lacks the flow-line slots.
    pub fn start_point(&self) -> GeneratorResult<Vector2<f32>> {
        let e = self.view.extra(START_SLOT)?;
        Ok(Vector2::new(e.y, e.z))
    }

    /// Field speed at the sample.
    ///
    /// # Errors
    ///
    /// Returns a buffer error if the vertex lacks the flow-line slots.
    pub fn speed(&self) -> GeneratorResult<f32> {
        Ok(self.view.extra(MOTION_SLOT)?.x)
    }

    /// Arc length travelled from the start point to the sample.
    ///
    /// # Errors
    ///
    /// Returns a buffer error if the vertex lacks the flow-line slots.
    pub fn length(&self) -> GeneratorResult<f32> {
        Ok(self.view.extra(START_SLOT)?.w)
    }

    /// Ribbon width at the sample.
    ///
    /// # Errors
    ///
    /// Returns a buffer error if the vertex lacks the flow-line slots.
    pub fn width(&self) -> GeneratorResult<f32> {
        Ok(self.view.extra(MOTION_SLOT)?.y)
    }

    /// Color of the sample.
    pub fn color(&self) -> Vector4<f32> {
        self.view.color()
    }
}

impl<'a> From<VertexView<'a>> for FlowSample<'a> {
    fn from(view: VertexView<'a>) -> Self {
        Self::new(view)
    }
}

fn empty_mesh() -> GeneratorResult<MeshAggregate> {
    Ok(MeshAggregate::with_attributes(
        AttributeSet::standard()
            .with_extra(START_SLOT)
            .with_extra(MOTION_SLOT),
    )?)
}

/// Validate the integration settings shared by the flow generators.
pub(crate) fn check_flow_config(config: &FlowLineConfig) -> GeneratorResult<()> {
    if !config.dt.is_finite() || config.dt == 0.0 {
        return Err(GeneratorError::InvalidStep(config.dt));
    }
    check_resolution("flow line steps", config.steps, 1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn uniform_flow(
        steps: usize,
    ) -> PlanarFlowLines<
        impl Fn(Vector2<f32>) -> Vector2<f32>,
        impl Fn(f32, f32, f32, Vector2<f32>, Vector2<f32>) -> f32,
        impl Fn(f32, f32, f32, Vector2<f32>, Vector2<f32>) -> Vector4<f32>,
    > {
        PlanarFlowLines::new(
            |_x: Vector2<f32>| Vector2::new(2.0, 0.0),
            &FlowLineConfig::default().with_dt(0.5).with_steps(steps),
            |_t, _t0, _speed, _x, _x0| 0.2,
            |t, _t0, speed, _x, _x0| Vector4::new(t, speed, 0.0, 1.0),
        )
        .unwrap()
    }

    #[test]
    fn grid_start_points() {
        let mut lines = uniform_flow(1);
        lines.generate_grid(Vector2::new(0.0, 0.0), Vector2::new(1.0, 2.0), (2, 3));
        assert_eq!(lines.start_points().len(), 6);
        assert_eq!(lines.start_points()[5], Vector2::new(1.0, 2.0));
        assert!(lines.start_times().iter().all(|&t| t == 0.0));
    }

    #[test]
    fn random_start_points_stay_in_box() {
        let mut lines = uniform_flow(1);
        lines.generate_random_uniform(Vector2::new(-1.0, 2.0), Vector2::new(1.0, 3.0), 50);
        for p in lines.start_points() {
            assert!((-1.0..=1.0).contains(&p.x));
            assert!((2.0..=3.0).contains(&p.y));
        }
        lines.generate_start_times_uniform(4.0);
        assert!(lines.start_times().iter().all(|t| (0.0..=4.0).contains(t)));
    }

    #[test]
    fn ribbon_layout_and_accessors() {
        let mut lines = uniform_flow(4);
        lines.set_start_points(vec![Vector2::new(0.0, 1.0)]);
        lines.set_start_times(vec![3.0]);
        lines.generate_lines().unwrap();

        let id = PolyGroupId::curve(0);
        let mesh = lines.mesh();
        assert_eq!(mesh.vertex_count(&id).unwrap(), 10);
        assert_eq!(mesh.triangle_count(&id).unwrap(), 8);

        // Sample 2, right side.
        let v = lines.line_samples(0).unwrap()[5];
        assert_relative_eq!(v.position(), Vector2::new(2.0, 0.9), epsilon = 1e-6);
        assert_relative_eq!(v.time_absolute(), 4.0);
        assert_relative_eq!(v.time_relative().unwrap(), 1.0);
        assert_relative_eq!(v.t0().unwrap(), 3.0);
        assert_eq!(v.start_point().unwrap(), Vector2::new(0.0, 1.0));
        assert_relative_eq!(v.speed().unwrap(), 2.0);
        assert_relative_eq!(v.length().unwrap(), 2.0);
        assert_relative_eq!(v.width().unwrap(), 0.2);
        assert_relative_eq!(v.color(), Vector4::new(4.0, 2.0, 0.0, 1.0));
        assert_eq!(v.view().uv().y, 1.0);
    }

    #[test]
    fn ribbons_face_up() {
        let mut lines = uniform_flow(3);
        lines.set_start_points(vec![Vector2::zeros(), Vector2::new(0.0, 5.0)]);
        lines.generate_lines().unwrap();
        assert_eq!(lines.ids(), &[PolyGroupId::curve(0), PolyGroupId::curve(1)]);
        for id in lines.ids() {
            for t in lines.mesh().triangle_views(id).unwrap() {
                assert_relative_eq!(t.face_normal(), Vector3::z(), epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn mismatched_start_times_rejected() {
        let mut lines = uniform_flow(2);
        lines.set_start_points(vec![Vector2::zeros(); 3]);
        lines.set_start_times(vec![0.0]);
        assert_eq!(
            lines.generate_lines().unwrap_err(),
            GeneratorError::StartTimesMismatch { points: 3, times: 1 }
        );
    }

    #[test]
    fn zero_step_rejected() {
        let result = PlanarFlowLines::new(
            |x: Vector2<f32>| x,
            &FlowLineConfig::default().with_dt(0.0),
            |_t, _t0, _s, _x, _x0| 1.0,
            |_t, _t0, _s, _x, _x0| Vector4::zeros(),
        );
        assert!(matches!(result, Err(GeneratorError::InvalidStep(_))));
    }
}
