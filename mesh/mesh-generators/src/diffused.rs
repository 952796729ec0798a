//! Sheets swept by seed curves carried along a planar vector field.
//!
//! A seed curve is sampled at `resolution` points, and every point follows
//! the field by explicit Euler steps. Row `s` of the sheet holds the seeds
//! after `s` steps, so local vertex `s * resolution + k` is seed `k` at time
//! `t0 + s * dt`.
//!
//! | channel  | contents                                        |
//! |----------|-------------------------------------------------|
//! | position | `(x, y, 0)`, pulled towards the row centroid    |
//! | normal   | `(0, 0, 1)`                                     |
//! | uv       | `(t, t0)`                                       |
//! | color    | pattern color, alpha scaled by the time dump    |
//! | extra0   | `(seed parameter, x0, y0, width ratio)`         |

use mesh_buffers::{AttributeSet, Point3, Vector2, Vector3, Vector4, Vertex, VertexView};
use mesh_polygroup::{MeshAggregate, PolyGroupId};
use tracing::{debug, info};

use crate::curve::samples;
use crate::error::GeneratorResult;
use crate::flow::{check_flow_config, FlowLineConfig};
use crate::tube::{check_domain, check_resolution, strip_faces};

const SEED_SLOT: usize = 0;

/// Appearance of a diffused sheet over time.
///
/// Both callbacks take the time since the seed curve started. `time_dump`
/// scales the color alpha; `width_ratio_dump` scales the distance of each
/// point from the centroid of its row, so `1` keeps the advected shape and
/// `0` collapses a row to a point.
#[derive(Debug, Clone)]
pub struct Diffusion<T, R> {
    color: Vector4<f32>,
    time_dump: T,
    width_ratio_dump: R,
    t0: f32,
}

impl<T, R> Diffusion<T, R>
where
    T: Fn(f32) -> f32,
    R: Fn(f32) -> f32,
{
    /// A diffusion starting at time 0.
    pub const fn new(color: Vector4<f32>, time_dump: T, width_ratio_dump: R) -> Self {
        Self {
            color,
            time_dump,
            width_ratio_dump,
            t0: 0.0,
        }
    }

    /// Set the start time of the seed curve.
    #[must_use]
    pub fn with_start_time(mut self, t0: f32) -> Self {
        self.t0 = t0;
        self
    }

    /// Base color.
    pub const fn color(&self) -> Vector4<f32> {
        self.color
    }

    /// Start time.
    pub const fn start_time(&self) -> f32 {
        self.t0
    }
}

/// Sheets traced by seed curves in a planar flow, one polygroup per seed
/// curve (`PolyGroupId::curve(k)`).
///
/// # Example
///
/// ```
/// use mesh_generators::{Diffusion, FlowLineConfig, PlanarDiffusedFlow};
/// use mesh_buffers::{Vector2, Vector4};
///
/// let fade = Diffusion::new(Vector4::new(0.2, 0.4, 1.0, 1.0), |t: f32| (-t).exp(), |_t: f32| 1.0);
/// let sheet = PlanarDiffusedFlow::from_interval(
///     |x: Vector2<f32>| Vector2::new(1.0, 0.1 * x.x),
///     &FlowLineConfig::default().with_steps(10),
///     &fade,
///     Vector2::new(0.0, 0.0),
///     Vector2::new(0.0, 1.0),
/// )?;
/// assert_eq!(sheet.mesh().total_vertex_count(), 2 * 11);
/// # Ok::<(), mesh_generators::GeneratorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PlanarDiffusedFlow {
    mesh: MeshAggregate,
    ids: Vec<PolyGroupId>,
    config: FlowLineConfig,
}

impl PlanarDiffusedFlow {
    /// Sheet swept by the segment `a → b`, seeded at its two endpoints.
    ///
    /// # Errors
    ///
    /// Same as [`from_curve`](Self::from_curve).
    pub fn from_interval<X, T, R>(
        field: X,
        config: &FlowLineConfig,
        diffusion: &Diffusion<T, R>,
        a: Vector2<f32>,
        b: Vector2<f32>,
    ) -> GeneratorResult<Self>
    where
        X: Fn(Vector2<f32>) -> Vector2<f32>,
        T: Fn(f32) -> f32,
        R: Fn(f32) -> f32,
    {
        Self::from_curve(field, config, diffusion, |s| a + (b - a) * s, (0.0, 1.0), 2)
    }

    /// Sheet swept by a plane curve sampled at `resolution` parameters of
    /// `domain`.
    ///
    /// # Errors
    ///
    /// - [`GeneratorError::InvalidStep`](crate::GeneratorError::InvalidStep)
    ///   or [`GeneratorError::TooFewSamples`](crate::GeneratorError::TooFewSamples)
    ///   for bad integration settings;
    /// - [`GeneratorError::TooFewSamples`](crate::GeneratorError::TooFewSamples)
    ///   for a resolution below 2;
    /// - [`GeneratorError::InvalidDomain`](crate::GeneratorError::InvalidDomain)
    ///   for an empty or non-finite domain.
    pub fn from_curve<X, T, R, C>(
        field: X,
        config: &FlowLineConfig,
        diffusion: &Diffusion<T, R>,
        curve: C,
        domain: (f32, f32),
        resolution: usize,
    ) -> GeneratorResult<Self>
    where
        X: Fn(Vector2<f32>) -> Vector2<f32>,
        T: Fn(f32) -> f32,
        R: Fn(f32) -> f32,
        C: Fn(f32) -> Vector2<f32>,
    {
        let single = [(diffusion.color, Vector2::zeros())];
        Self::from_patterns(field, config, diffusion, curve, domain, resolution, &single)
    }

    /// One sheet per `(color, shift)` pattern, each swept by the curve
    /// translated by `shift` and drawn in `color` instead of the
    /// diffusion's base color.
    ///
    /// # Errors
    ///
    /// As for [`from_curve`](Self::from_curve), plus
    /// [`GeneratorError::TooFewSamples`](crate::GeneratorError::TooFewSamples)
    /// for an empty pattern list.
    pub fn from_patterns<X, T, R, C>(
        field: X,
        config: &FlowLineConfig,
        diffusion: &Diffusion<T, R>,
        curve: C,
        domain: (f32, f32),
        resolution: usize,
        patterns: &[(Vector4<f32>, Vector2<f32>)],
    ) -> GeneratorResult<Self>
    where
        X: Fn(Vector2<f32>) -> Vector2<f32>,
        T: Fn(f32) -> f32,
        R: Fn(f32) -> f32,
        C: Fn(f32) -> Vector2<f32>,
    {
        check_flow_config(config)?;
        check_resolution("diffused curve resolution", resolution, 2)?;
        check_resolution("diffusion patterns", patterns.len(), 1)?;
        check_domain(domain)?;

        let mut mesh = MeshAggregate::with_attributes(AttributeSet::standard().with_extra(SEED_SLOT))?;
        let faces = strip_faces(config.steps + 1, resolution)?;
        let params = samples(domain, resolution);
        let mut ids = Vec::with_capacity(patterns.len());

        for (k, (color, shift)) in patterns.iter().enumerate() {
            let seeds: Vec<Vector2<f32>> = params.iter().map(|&s| curve(s) + shift).collect();
            let vertices = sheet_vertices(&field, config, diffusion, *color, &params, &seeds);
            let faces = facing_up(&vertices, &faces);
            let id = PolyGroupId::curve(k);
            mesh.add_new_polygroup(&vertices, &faces, id.clone())?;
            ids.push(id);
        }

        info!(
            "Generated {} diffused sheets of {} seeds over {} steps",
            ids.len(),
            resolution,
            config.steps
        );
        Ok(Self {
            mesh,
            ids,
            config: *config,
        })
    }

    /// Absolute time of a sheet vertex.
    pub fn time_absolute(vertex: &VertexView<'_>) -> f32 {
        vertex.uv().x
    }

    /// Start time of a sheet vertex's seed curve.
    pub fn start_time(vertex: &VertexView<'_>) -> f32 {
        vertex.uv().y
    }

    /// Seed-curve parameter the vertex was advected from.
    ///
    /// # Errors
    ///
    /// Returns a buffer error if the vertex lacks extra slot 0.
    pub fn seed_parameter(vertex: &VertexView<'_>) -> GeneratorResult<f32> {
        Ok(vertex.extra(SEED_SLOT)?.x)
    }

    /// Seed point the vertex was advected from.
    ///
    /// # Errors
    ///
    /// Returns a buffer error if the vertex lacks extra slot 0.
    pub fn seed_point(vertex: &VertexView<'_>) -> GeneratorResult<Vector2<f32>> {
        let e = vertex.extra(SEED_SLOT)?;
        Ok(Vector2::new(e.y, e.z))
    }

    /// Width ratio applied to the vertex's row.
    ///
    /// # Errors
    ///
    /// Returns a buffer error if the vertex lacks extra slot 0.
    pub fn width_ratio(vertex: &VertexView<'_>) -> GeneratorResult<f32> {
        Ok(vertex.extra(SEED_SLOT)?.w)
    }

    /// The generated mesh.
    pub fn mesh(&self) -> &MeshAggregate {
        &self.mesh
    }

    /// Take the generated mesh.
    pub fn into_mesh(self) -> MeshAggregate {
        self.mesh
    }

    /// Polygroup ids of the sheets, in pattern order.
    pub fn ids(&self) -> &[PolyGroupId] {
        &self.ids
    }

    /// Integration settings the sheets were built with.
    pub fn config(&self) -> &FlowLineConfig {
        &self.config
    }
}

fn sheet_vertices<X, T, R>(
    field: &X,
    config: &FlowLineConfig,
    diffusion: &Diffusion<T, R>,
    color: Vector4<f32>,
    params: &[f32],
    seeds: &[Vector2<f32>],
) -> Vec<Vertex>
where
    X: Fn(Vector2<f32>) -> Vector2<f32>,
    T: Fn(f32) -> f32,
    R: Fn(f32) -> f32,
{
    let t0 = diffusion.t0;
    let mut row = seeds.to_vec();
    let mut vertices = Vec::with_capacity((config.steps + 1) * seeds.len());

    for s in 0..=config.steps {
        let elapsed = s as f32 * config.dt;
        let t = t0 + elapsed;
        let ratio = (diffusion.width_ratio_dump)(elapsed);
        let alpha = (diffusion.time_dump)(elapsed);
        let centroid = row.iter().sum::<Vector2<f32>>() / row.len() as f32;
        let tint = Vector4::new(color.x, color.y, color.z, color.w * alpha);

        for ((x, &param), seed) in row.iter().zip(params).zip(seeds) {
            let p = centroid + (x - centroid) * ratio;
            vertices.push(
                Vertex::new(Point3::new(p.x, p.y, 0.0), Vector3::z(), Vector2::new(t, t0), tint)
                    .with_extra(SEED_SLOT, Vector4::new(param, seed.x, seed.y, ratio)),
            );
        }

        for x in &mut row {
            *x += field(*x) * config.dt;
        }
    }
    debug!("Advected {} seeds over {} steps", seeds.len(), config.steps);
    vertices
}

/// Reverse every face whose winding points down.
fn facing_up(vertices: &[Vertex], faces: &[[u32; 3]]) -> Vec<[u32; 3]> {
    faces
        .iter()
        .map(|&[a, b, c]| {
            let p = |i: u32| vertices[i as usize].position;
            let area = (p(b) - p(a)).cross(&(p(c) - p(a))).z;
            if area < 0.0 {
                [a, c, b]
            } else {
                [a, b, c]
            }
        })
        .collect()
}
