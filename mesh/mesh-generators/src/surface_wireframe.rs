//! Tubes along the parameter lines of a surface.

use mesh_buffers::{Point3, Vector2, Vector3, Vector4, Vertex, VertexView};
use mesh_polygroup::{MeshAggregate, ParametricSurface, PolyGroupId};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::curve::samples;
use crate::error::GeneratorResult;
use crate::frame::Frame;
use crate::tube::{check_radius, check_resolution, segment_angle, tube_faces};

const DIFF_STEP: f32 = 1e-3;

/// Configuration for [`SurfaceWireframe`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceWireframeConfig {
    /// Tube radius.
    pub width: f32,
    /// Number of lines of constant `t`.
    pub t_lines: usize,
    /// Number of lines of constant `u`.
    pub u_lines: usize,
    /// Samples along each line.
    pub curve_res_hor: usize,
    /// Vertices around each tube ring.
    pub curve_res_rad: usize,
}

impl Default for SurfaceWireframeConfig {
    fn default() -> Self {
        Self {
            width: 0.01,
            t_lines: 10,
            u_lines: 10,
            curve_res_hor: 64,
            curve_res_rad: 8,
        }
    }
}

impl SurfaceWireframeConfig {
    /// Set the tube radius.
    #[must_use]
    pub const fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Set the number of `t` and `u` lines.
    #[must_use]
    pub const fn with_lines(mut self, t_lines: usize, u_lines: usize) -> Self {
        self.t_lines = t_lines;
        self.u_lines = u_lines;
        self
    }

    /// Set the resolution along and around each tube.
    #[must_use]
    pub const fn with_resolution(mut self, hor: usize, rad: usize) -> Self {
        self.curve_res_hor = hor;
        self.curve_res_rad = rad;
        self
    }
}

/// Which parameter a line holds fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Isoline {
    /// `t` fixed, running along `u`.
    ConstT,
    /// `u` fixed, running along `t`.
    ConstU,
}

/// Tubes of radius `width` along `t_lines` lines of constant `t` and
/// `u_lines` lines of constant `u`.
///
/// Each line is its own polygroup (`PolyGroupId::curve(k)`, the constant-`t`
/// lines first). Every vertex stores `(t, u, angle, 1)` in its color so
/// [`change_base_surface`](Self::change_base_surface) can move the whole
/// wireframe onto another surface without touching topology.
#[derive(Debug, Clone)]
pub struct SurfaceWireframe {
    mesh: MeshAggregate,
    lines: Vec<(PolyGroupId, Isoline)>,
    config: SurfaceWireframeConfig,
}

impl SurfaceWireframe {
    /// Build the wireframe of `surface`.
    ///
    /// # Errors
    ///
    /// - [`GeneratorError::TooFewSamples`](crate::GeneratorError::TooFewSamples)
    ///   for fewer than 2 samples along or 3 around a tube;
    /// - [`GeneratorError::InvalidRadius`](crate::GeneratorError::InvalidRadius)
    ///   for a negative or non-finite width.
    pub fn new<S>(surface: &S, config: &SurfaceWireframeConfig) -> GeneratorResult<Self>
    where
        S: ParametricSurface + ?Sized,
    {
        check_resolution("wireframe line", config.curve_res_hor, 2)?;
        check_resolution("wireframe ring", config.curve_res_rad, 3)?;
        check_radius(config.width)?;

        let (t_range, u_range) = surface.domain();
        let faces = tube_faces(config.curve_res_hor, config.curve_res_rad)?;
        let mut mesh = MeshAggregate::new();
        let mut lines = Vec::with_capacity(config.t_lines + config.u_lines);

        let along_u = samples(u_range, config.curve_res_hor);
        let along_t = samples(t_range, config.curve_res_hor);
        let fixed = samples(t_range, config.t_lines)
            .into_iter()
            .map(|t| (Isoline::ConstT, t))
            .chain(samples(u_range, config.u_lines).into_iter().map(|u| (Isoline::ConstU, u)));

        for (k, (kind, c)) in fixed.enumerate() {
            let params: Vec<(f32, f32)> = match kind {
                Isoline::ConstT => along_u.iter().map(|&u| (c, u)).collect(),
                Isoline::ConstU => along_t.iter().map(|&t| (t, c)).collect(),
            };
            let mut vertices = Vec::with_capacity(params.len() * config.curve_res_rad);
            for &(t, u) in &params {
                for j in 0..config.curve_res_rad {
                    let angle = segment_angle(j, config.curve_res_rad);
                    let (p, n) = ring_point(surface, kind, t, u, angle, config.width);
                    vertices.push(Vertex::new(p, n, Vector2::new(t, u), Vector4::new(t, u, angle, 1.0)));
                }
            }
            let id = PolyGroupId::curve(k);
            mesh.add_new_polygroup(&vertices, &faces, id.clone())?;
            lines.push((id, kind));
        }

        info!(
            "Built surface wireframe: {} lines, {} vertices",
            lines.len(),
            mesh.total_vertex_count()
        );
        Ok(Self {
            mesh,
            lines,
            config: *config,
        })
    }

    /// Re-evaluate every vertex on `surface` at its stored parameters.
    ///
    /// # Errors
    ///
    /// Propagates mesh errors.
    pub fn change_base_surface<S>(&mut self, surface: &S) -> GeneratorResult<()>
    where
        S: ParametricSurface + ?Sized,
    {
        let width = self.config.width;
        for (id, kind) in &self.lines {
            for local in 0..self.mesh.vertex_count(id)? {
                let mut view = self.mesh.vertex_view_mut(id, local)?;
                let c = view.color();
                let (p, n) = ring_point(surface, *kind, c.x, c.y, c.z, width);
                view.set_position(p);
                view.set_normal(n);
            }
        }
        debug!("Moved surface wireframe onto a new surface");
        Ok(())
    }

    /// Surface parameters `(t, u)` a wireframe vertex was sampled at.
    pub fn surface_parameters(vertex: &VertexView<'_>) -> Vector2<f32> {
        vertex.color().xy()
    }

    /// The generated mesh.
    pub fn mesh(&self) -> &MeshAggregate {
        &self.mesh
    }

    /// Take the generated mesh.
    pub fn into_mesh(self) -> MeshAggregate {
        self.mesh
    }

    /// Polygroup ids of the lines, constant-`t` lines first.
    pub fn line_ids(&self) -> impl Iterator<Item = &PolyGroupId> {
        self.lines.iter().map(|(id, _)| id)
    }

    /// Configuration the wireframe was built with.
    pub fn config(&self) -> &SurfaceWireframeConfig {
        &self.config
    }
}

/// Tube point at `angle` around the line through `(t, u)`, and its outward
/// normal. The ring's zero angle points along the surface normal.
fn ring_point<S>(surface: &S, kind: Isoline, t: f32, u: f32, angle: f32, width: f32) -> (Point3<f32>, Vector3<f32>)
where
    S: ParametricSurface + ?Sized,
{
    let tangent = match kind {
        Isoline::ConstT => surface.position(t, u + DIFF_STEP) - surface.position(t, u - DIFF_STEP),
        Isoline::ConstU => surface.position(t + DIFF_STEP, u) - surface.position(t - DIFF_STEP, u),
    };
    let frame = match tangent.try_normalize(f32::EPSILON) {
        Some(tangent) => {
            let n = surface.normal(t, u);
            match (n - tangent * n.dot(&tangent)).try_normalize(f32::EPSILON) {
                Some(normal) => Frame {
                    tangent,
                    normal,
                    binormal: tangent.cross(&normal),
                },
                None => Frame::from_tangent(tangent),
            }
        }
        None => Frame::from_tangent(surface.normal(t, u)),
    };
    let radial = frame.radial(angle);
    (surface.position(t, u) + radial * width, radial)
}
