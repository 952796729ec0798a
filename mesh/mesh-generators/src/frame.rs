//! Rotation-minimising frames along sampled curves.

use mesh_buffers::Vector3;
use nalgebra::Rotation3;

/// Orthonormal frame at a curve sample. `binormal = tangent × normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Unit tangent.
    pub tangent: Vector3<f32>,
    /// Unit normal, orthogonal to the tangent.
    pub normal: Vector3<f32>,
    /// Unit binormal.
    pub binormal: Vector3<f32>,
}

impl Frame {
    /// Any frame with the given tangent.
    ///
    /// The normal is built from the coordinate axis least aligned with the
    /// tangent.
    #[must_use]
    pub fn from_tangent(tangent: Vector3<f32>) -> Self {
        let tangent = tangent.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::z);
        let axis = tangent.iamin();
        let mut helper = Vector3::zeros();
        helper[axis] = 1.0;
        let normal = tangent
            .cross(&helper)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::y);
        Self {
            tangent,
            normal,
            binormal: tangent.cross(&normal),
        }
    }

    /// Unit direction at `angle` in the normal plane, turning from the
    /// normal towards the binormal.
    #[must_use]
    pub fn radial(&self, angle: f32) -> Vector3<f32> {
        let (s, c) = angle.sin_cos();
        self.normal * c + self.binormal * s
    }

    /// Carry this frame over to a new tangent with the smallest rotation.
    #[must_use]
    pub fn transported(&self, tangent: Vector3<f32>) -> Self {
        let Some(tangent) = tangent.try_normalize(f32::EPSILON) else {
            return *self;
        };
        match Rotation3::rotation_between(&self.tangent, &tangent) {
            Some(r) => {
                let rotated = r * self.normal;
                let normal = (rotated - tangent * tangent.dot(&rotated))
                    .try_normalize(f32::EPSILON)
                    .unwrap_or(rotated);
                Self {
                    tangent,
                    normal,
                    binormal: tangent.cross(&normal),
                }
            }
            // Reversal: any half-turn works, keep the normal.
            None => Self {
                tangent,
                normal: self.normal,
                binormal: -self.binormal,
            },
        }
    }
}

/// Parallel-transport frames for a sequence of tangents.
///
/// The first frame comes from [`Frame::from_tangent`]; every other frame is
/// its predecessor rotated onto the next tangent, so the frames do not twist
/// around the curve.
#[must_use]
pub fn parallel_transport(tangents: &[Vector3<f32>]) -> Vec<Frame> {
    let Some(&first) = tangents.first() else {
        return Vec::new();
    };
    let mut frames = Vec::with_capacity(tangents.len());
    let mut frame = Frame::from_tangent(first);
    frames.push(frame);
    for &t in &tangents[1..] {
        frame = frame.transported(t);
        frames.push(frame);
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_orthonormal(f: &Frame) {
        assert_relative_eq!(f.tangent.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(f.normal.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(f.tangent.dot(&f.normal), 0.0, epsilon = 1e-5);
        assert_relative_eq!(f.binormal, f.tangent.cross(&f.normal), epsilon = 1e-5);
    }

    #[test]
    fn from_tangent_is_orthonormal() {
        for t in [Vector3::x(), Vector3::y(), Vector3::z(), Vector3::new(1.0, -2.0, 0.5)] {
            assert_orthonormal(&Frame::from_tangent(t));
        }
    }

    #[test]
    fn straight_line_does_not_twist() {
        let frames = parallel_transport(&[Vector3::x(); 4]);
        assert_eq!(frames.len(), 4);
        for f in &frames {
            assert_relative_eq!(f.normal, frames[0].normal, epsilon = 1e-6);
        }
    }

    #[test]
    fn quarter_turn_rotates_normal_with_tangent() {
        let frames = parallel_transport(&[Vector3::x(), Vector3::y()]);
        assert_orthonormal(&frames[1]);
        assert_relative_eq!(frames[1].tangent, Vector3::y(), epsilon = 1e-6);
    }

    #[test]
    fn reversal_keeps_frame_valid() {
        let frames = parallel_transport(&[Vector3::x(), -Vector3::x()]);
        assert_orthonormal(&frames[1]);
    }

    #[test]
    fn radial_turns_towards_binormal() {
        let f = Frame::from_tangent(Vector3::z());
        assert_relative_eq!(f.radial(std::f32::consts::FRAC_PI_2), f.binormal, epsilon = 1e-6);
        assert_relative_eq!(f.radial(0.0), f.normal);
    }

    #[test]
    fn empty_input() {
        assert!(parallel_transport(&[]).is_empty());
    }
}
