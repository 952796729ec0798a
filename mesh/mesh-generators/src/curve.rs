//! Parametric curves in R³ and graphs of real functions.

use mesh_buffers::{Point3, Vector3};

use crate::error::{GeneratorError, GeneratorResult};
use crate::tube::{check_domain, check_resolution};

const TANGENT_STEP: f32 = 1e-3;

/// A curve `t -> R³` over a closed parameter interval.
pub trait ParametricCurve {
    /// Curve point at `t`.
    fn position(&self, t: f32) -> Point3<f32>;

    /// Parameter interval `(t_min, t_max)`.
    fn domain(&self) -> (f32, f32);

    /// Unit tangent at `t`, by central differences unless overridden.
    fn tangent(&self, t: f32) -> Vector3<f32> {
        let d = self.position(t + TANGENT_STEP) - self.position(t - TANGENT_STEP);
        d.try_normalize(0.0).unwrap_or(d)
    }
}

/// Adapter turning a closure into a [`ParametricCurve`].
#[derive(Debug, Clone)]
pub struct FnCurve<F> {
    f: F,
    domain: (f32, f32),
}

impl<F> FnCurve<F>
where
    F: Fn(f32) -> Point3<f32>,
{
    /// Wrap `f` over `domain`.
    pub const fn new(f: F, domain: (f32, f32)) -> Self {
        Self { f, domain }
    }
}

impl<F> ParametricCurve for FnCurve<F>
where
    F: Fn(f32) -> Point3<f32>,
{
    fn position(&self, t: f32) -> Point3<f32> {
        (self.f)(t)
    }

    fn domain(&self) -> (f32, f32) {
        self.domain
    }
}

/// Graph `x ↦ (x, f(x), 0)` of a real function, drawn in the `xy` plane.
#[derive(Debug, Clone)]
pub struct PlotCurve<F> {
    f: F,
    domain: (f32, f32),
}

impl<F> PlotCurve<F>
where
    F: Fn(f32) -> f32,
{
    /// Graph of `f` over `domain`.
    pub const fn new(f: F, domain: (f32, f32)) -> Self {
        Self { f, domain }
    }
}

impl<F> ParametricCurve for PlotCurve<F>
where
    F: Fn(f32) -> f32,
{
    fn position(&self, t: f32) -> Point3<f32> {
        Point3::new(t, (self.f)(t), 0.0)
    }

    fn domain(&self) -> (f32, f32) {
        self.domain
    }
}

/// A real function known at evenly spaced samples over a domain.
///
/// Sample `i` sits at `min + i * (max - min) / (n - 1)`. Between samples the
/// function is interpolated linearly; outside the domain it is clamped. As a
/// [`ParametricCurve`] it is the graph `x ↦ (x, f(x), 0)`.
///
/// # Example
///
/// ```
/// use mesh_generators::SampledFunction;
///
/// let f = SampledFunction::new((0.0, 2.0), vec![0.0, 1.0, 4.0])?;
/// assert!((f.value(1.5) - 2.5).abs() < 1e-6);
/// # Ok::<(), mesh_generators::GeneratorError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFunction {
    domain: (f32, f32),
    values: Vec<f32>,
}

impl SampledFunction {
    /// Wrap samples of a function over `domain`.
    ///
    /// # Errors
    ///
    /// - [`GeneratorError::TooFewSamples`] for fewer than 2 values;
    /// - [`GeneratorError::InvalidDomain`] for an empty or non-finite domain.
    pub fn new(domain: (f32, f32), values: Vec<f32>) -> GeneratorResult<Self> {
        check_resolution("sampled function", values.len(), 2)?;
        check_domain(domain)?;
        Ok(Self { domain, values })
    }

    /// Sample `f` at `n` evenly spaced points of `domain`.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn from_fn<F>(f: F, domain: (f32, f32), n: usize) -> GeneratorResult<Self>
    where
        F: Fn(f32) -> f32,
    {
        Self::new(domain, samples(domain, n).into_iter().map(f).collect())
    }

    /// Interpolated value at `x`.
    #[must_use]
    pub fn value(&self, x: f32) -> f32 {
        let (i, frac) = cell(self.domain, self.values.len(), x);
        self.values[i] * (1.0 - frac) + self.values[i + 1] * frac
    }

    /// The samples.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; a sampled function has at least two samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace the samples, keeping the domain.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::SampleCountMismatch`] unless `values` has
    /// as many entries as before.
    pub fn set_values(&mut self, values: Vec<f32>) -> GeneratorResult<()> {
        if values.len() != self.values.len() {
            return Err(GeneratorError::SampleCountMismatch {
                expected: self.values.len(),
                actual: values.len(),
            });
        }
        self.values = values;
        Ok(())
    }
}

impl ParametricCurve for SampledFunction {
    fn position(&self, t: f32) -> Point3<f32> {
        Point3::new(t, self.value(t), 0.0)
    }

    fn domain(&self) -> (f32, f32) {
        self.domain
    }
}

/// Cell index and fraction of `x` on `n` evenly spaced samples of `domain`.
///
/// `x` is clamped to the domain; the index is at most `n - 2`.
pub(crate) fn cell(domain: (f32, f32), n: usize, x: f32) -> (usize, f32) {
    let (a, b) = domain;
    let last = n.saturating_sub(1).max(1);
    let u = ((x - a) / (b - a)).clamp(0.0, 1.0) * last as f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let i = (u.floor() as usize).min(last - 1);
    (i, u - i as f32)
}

/// `n` evenly spaced parameters over `domain`, endpoints included.
pub(crate) fn samples(domain: (f32, f32), n: usize) -> Vec<f32> {
    let (a, b) = domain;
    let last = n.saturating_sub(1).max(1) as f32;
    (0..n).map(|i| a + (b - a) * (i as f32 / last)).collect()
}
