//! Graphs of sampled height fields over a rectangle.

use mesh_buffers::Point3;
use mesh_polygroup::{MeshAggregate, ParametricSurface, PolyGroupId};
use tracing::debug;

use crate::curve::{cell, samples};
use crate::error::{GeneratorError, GeneratorResult};
use crate::tube::{check_domain, check_resolution};

/// A function `R² -> R` known on a regular grid.
///
/// Sample `(i, j)` sits at `(x_i, y_j)` with `i < res.0`, `j < res.1` and is
/// stored at `values[i * res.1 + j]`. Between samples the field is
/// interpolated bilinearly; outside the rectangle it is clamped. As a
/// [`ParametricSurface`] it is the graph `(x, y) ↦ (x, y, f(x, y))`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    x_range: (f32, f32),
    y_range: (f32, f32),
    res: (usize, usize),
    values: Vec<f32>,
}

impl HeightField {
    /// Wrap grid samples.
    ///
    /// # Errors
    ///
    /// - [`GeneratorError::TooFewSamples`] if either resolution is below 2;
    /// - [`GeneratorError::InvalidDomain`] for an empty or non-finite range;
    /// - [`GeneratorError::SampleCountMismatch`] unless there are
    ///   `res.0 * res.1` values.
    pub fn new(
        x_range: (f32, f32),
        y_range: (f32, f32),
        res: (usize, usize),
        values: Vec<f32>,
    ) -> GeneratorResult<Self> {
        check_resolution("height field columns", res.0, 2)?;
        check_resolution("height field rows", res.1, 2)?;
        check_domain(x_range)?;
        check_domain(y_range)?;
        if values.len() != res.0 * res.1 {
            return Err(GeneratorError::SampleCountMismatch {
                expected: res.0 * res.1,
                actual: values.len(),
            });
        }
        Ok(Self {
            x_range,
            y_range,
            res,
            values,
        })
    }

    /// Sample `f` on a `res.0 × res.1` grid.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn from_fn<F>(f: F, x_range: (f32, f32), y_range: (f32, f32), res: (usize, usize)) -> GeneratorResult<Self>
    where
        F: Fn(f32, f32) -> f32,
    {
        let ys = samples(y_range, res.1);
        let values = samples(x_range, res.0)
            .into_iter()
            .flat_map(|x| ys.iter().map(move |&y| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self::new(x_range, y_range, res, values)
    }

    /// Bilinearly interpolated value at `(x, y)`.
    #[must_use]
    pub fn value(&self, x: f32, y: f32) -> f32 {
        let (i, s) = cell(self.x_range, self.res.0, x);
        let (j, r) = cell(self.y_range, self.res.1, y);
        let at = |i: usize, j: usize| self.values[i * self.res.1 + j];
        let near = at(i, j) * (1.0 - r) + at(i, j + 1) * r;
        let far = at(i + 1, j) * (1.0 - r) + at(i + 1, j + 1) * r;
        near * (1.0 - s) + far * s
    }

    /// Grid resolution `(columns along x, rows along y)`.
    #[must_use]
    pub const fn resolution(&self) -> (usize, usize) {
        self.res
    }

    /// The samples, row-major in `x`.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

impl ParametricSurface for HeightField {
    fn position(&self, t: f32, u: f32) -> Point3<f32> {
        Point3::new(t, u, self.value(t, u))
    }

    fn domain(&self) -> ((f32, f32), (f32, f32)) {
        (self.x_range, self.y_range)
    }
}

/// Mesh of a [`HeightField`] graph with one vertex per sample.
///
/// Grid sample `(i, j)` is local vertex `i * res.1 + j`. Faces point
/// towards `+z`. The heights can be replaced without touching topology.
///
/// # Example
///
/// ```
/// use mesh_generators::SurfacePlot;
///
/// let plot = SurfacePlot::from_fn(|x, y| x * y, (0.0, 1.0), (0.0, 1.0), (8, 8))?;
/// assert_eq!(plot.mesh().total_vertex_count(), 64);
/// assert_eq!(plot.mesh().total_triangle_count(), 2 * 7 * 7);
/// # Ok::<(), mesh_generators::GeneratorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SurfacePlot {
    mesh: MeshAggregate,
    id: PolyGroupId,
    field: HeightField,
}

impl SurfacePlot {
    /// Mesh the graph of `field`.
    ///
    /// # Errors
    ///
    /// Propagates mesh errors.
    pub fn new(field: HeightField) -> GeneratorResult<Self> {
        let id = PolyGroupId::from(0);
        let (nx, ny) = field.resolution();
        let mesh = MeshAggregate::from_surface(&field, nx, ny, id.clone())?;
        debug!("Built surface plot on a {}x{} grid", nx, ny);
        Ok(Self { mesh, id, field })
    }

    /// Sample `f` on a grid and mesh its graph.
    ///
    /// # Errors
    ///
    /// Same as [`HeightField::from_fn`].
    pub fn from_fn<F>(f: F, x_range: (f32, f32), y_range: (f32, f32), res: (usize, usize)) -> GeneratorResult<Self>
    where
        F: Fn(f32, f32) -> f32,
    {
        Self::new(HeightField::from_fn(f, x_range, y_range, res)?)
    }

    /// Replace the heights and refresh positions and normals.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::SampleCountMismatch`] unless `values` has
    /// one entry per grid sample.
    pub fn update_values(&mut self, values: Vec<f32>) -> GeneratorResult<()> {
        self.field = HeightField::new(self.field.x_range, self.field.y_range, self.field.res, values)?;
        self.mesh.adjust_to_new_surface(&self.field, &self.id)?;
        Ok(())
    }

    /// Resample another function on the same grid.
    ///
    /// # Errors
    ///
    /// Propagates mesh errors.
    pub fn update_fn<F>(&mut self, f: F) -> GeneratorResult<()>
    where
        F: Fn(f32, f32) -> f32,
    {
        let field = HeightField::from_fn(f, self.field.x_range, self.field.y_range, self.field.res)?;
        self.update_values(field.values)
    }

    /// The sampled field.
    pub fn height_field(&self) -> &HeightField {
        &self.field
    }

    /// The generated mesh.
    pub fn mesh(&self) -> &MeshAggregate {
        &self.mesh
    }

    /// Take the generated mesh.
    pub fn into_mesh(self) -> MeshAggregate {
        self.mesh
    }

    /// Id of the plot's polygroup.
    pub fn id(&self) -> &PolyGroupId {
        &self.id
    }
}
