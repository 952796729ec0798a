//! Lattices and argument checks shared by the generators.

use mesh_polygroup::MeshResult;

use crate::error::{GeneratorError, GeneratorResult};

/// Faces of a tube with `rings × segments` vertices numbered
/// `ring * segments + segment`.
///
/// Segments wrap around; rings do not. With the ring direction along the
/// tangent and segments turning from normal to binormal, the winding faces
/// outward.
pub(crate) fn tube_faces(rings: usize, segments: usize) -> MeshResult<Vec<[u32; 3]>> {
    let index = |ring: usize, segment: usize| {
        u32::try_from(ring * segments + segment % segments).map_err(|_| {
            mesh_polygroup::MeshError::IllegalArgument(format!(
                "tube of {rings}x{segments} vertices exceeds the u32 index range"
            ))
        })
    };
    let mut faces = Vec::with_capacity(2 * rings.saturating_sub(1) * segments);
    for i in 0..rings.saturating_sub(1) {
        for j in 0..segments {
            let a = index(i, j)?;
            let b = index(i + 1, j)?;
            let c = index(i, j + 1)?;
            let d = index(i + 1, j + 1)?;
            faces.push([a, c, d]);
            faces.push([a, d, b]);
        }
    }
    Ok(faces)
}

/// Faces of an open `rows × cols` strip numbered `row * cols + col`.
///
/// Cell `(r, c)` becomes `(a, b, d)` and `(a, d, e)` with `a = (r, c)`,
/// `b = (r, c + 1)`, `e = (r + 1, c)` and `d = (r + 1, c + 1)`.
pub(crate) fn strip_faces(rows: usize, cols: usize) -> MeshResult<Vec<[u32; 3]>> {
    let index = |row: usize, col: usize| {
        u32::try_from(row * cols + col).map_err(|_| {
            mesh_polygroup::MeshError::IllegalArgument(format!(
                "strip of {rows}x{cols} vertices exceeds the u32 index range"
            ))
        })
    };
    let mut faces = Vec::with_capacity(2 * rows.saturating_sub(1) * cols.saturating_sub(1));
    for r in 0..rows.saturating_sub(1) {
        for c in 0..cols.saturating_sub(1) {
            let a = index(r, c)?;
            let b = index(r, c + 1)?;
            let e = index(r + 1, c)?;
            let d = index(r + 1, c + 1)?;
            faces.push([a, b, d]);
            faces.push([a, d, e]);
        }
    }
    Ok(faces)
}

/// Angle of segment `j` out of `segments`.
pub(crate) fn segment_angle(j: usize, segments: usize) -> f32 {
    std::f32::consts::TAU * j as f32 / segments as f32
}

pub(crate) fn check_resolution(what: &'static str, actual: usize, min: usize) -> GeneratorResult<()> {
    if actual < min {
        return Err(GeneratorError::TooFewSamples { what, min, actual });
    }
    Ok(())
}

pub(crate) fn check_domain(domain: (f32, f32)) -> GeneratorResult<()> {
    let (min, max) = domain;
    if !min.is_finite() || !max.is_finite() || min >= max {
        return Err(GeneratorError::InvalidDomain { min, max });
    }
    Ok(())
}

pub(crate) fn check_radius(radius: f32) -> GeneratorResult<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(GeneratorError::InvalidRadius(radius));
    }
    Ok(())
}
