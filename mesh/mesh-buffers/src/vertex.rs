//! Owned vertex records.

use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::kind::EXTRA_SLOTS;

/// Optional per-vertex data beyond the four standard channels.
///
/// A record may only carry data for slots the receiving store has
/// activated; see [`AttributeBufferStore::add_vertex`](crate::AttributeBufferStore::add_vertex).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VertexAttributes {
    /// Per-vertex material matrix, stored column by column.
    pub material: Option<Matrix4<f32>>,

    /// Extra vec4 slots.
    pub extras: [Option<Vector4<f32>>; EXTRA_SLOTS],
}

impl VertexAttributes {
    /// Create attributes with no values set.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            material: None,
            extras: [None; EXTRA_SLOTS],
        }
    }

    /// Check if any attribute is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.material.is_none() && self.extras.iter().all(Option::is_none)
    }
}

/// A vertex with its standard channels and optional attributes.
///
/// This is the owned counterpart of a [`VertexView`](crate::VertexView):
/// the form vertices take before they enter a store and when they are read
/// back out of one.
///
/// # Example
///
/// ```
/// use mesh_buffers::{Vertex, Point3, Vector3};
///
/// let v = Vertex::from_coords(1.0, 2.0, 3.0).with_normal(Vector3::z());
/// assert_eq!(v.position, Point3::new(1.0, 2.0, 3.0));
/// assert!(v.attributes.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f32>,
    /// Vertex normal. Not required to be unit length.
    pub normal: Vector3<f32>,
    /// Texture coordinates.
    pub uv: Vector2<f32>,
    /// RGBA color.
    pub color: Vector4<f32>,
    /// Material and extra slots.
    pub attributes: VertexAttributes,
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(
            Point3::origin(),
            Vector3::zeros(),
            Vector2::zeros(),
            Vector4::new(1.0, 1.0, 1.0, 1.0),
        )
    }
}

impl Vertex {
    /// Create a vertex from its four standard channels.
    #[inline]
    #[must_use]
    pub const fn new(
        position: Point3<f32>,
        normal: Vector3<f32>,
        uv: Vector2<f32>,
        color: Vector4<f32>,
    ) -> Self {
        Self {
            position,
            normal,
            uv,
            color,
            attributes: VertexAttributes::empty(),
        }
    }

    /// Create a vertex from raw coordinates with zero normal and uv and a
    /// white color.
    #[must_use]
    pub fn from_coords(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            ..Self::default()
        }
    }

    /// Replace the normal.
    #[must_use]
    pub fn with_normal(mut self, normal: Vector3<f32>) -> Self {
        self.normal = normal;
        self
    }

    /// Replace the uv.
    #[must_use]
    pub fn with_uv(mut self, uv: Vector2<f32>) -> Self {
        self.uv = uv;
        self
    }

    /// Replace the color.
    #[must_use]
    pub fn with_color(mut self, color: Vector4<f32>) -> Self {
        self.color = color;
        self
    }

    /// Attach a material matrix.
    #[must_use]
    pub fn with_material(mut self, material: Matrix4<f32>) -> Self {
        self.attributes.material = Some(material);
        self
    }

    /// Attach an extra slot value. Slots outside `0..EXTRA_SLOTS` are ignored.
    #[must_use]
    pub fn with_extra(mut self, slot: usize, value: Vector4<f32>) -> Self {
        if let Some(entry) = self.attributes.extras.get_mut(slot) {
            *entry = Some(value);
        }
        self
    }

    /// Weighted blend of several vertices.
    ///
    /// Every channel is blended linearly; the normal is renormalised when
    /// it is not zero. Material and extra slots are blended only when every
    /// input carries them, otherwise they are left unset.
    ///
    /// Returns the default vertex for an empty input.
    #[must_use]
    pub fn blend(parts: &[(&Self, f32)]) -> Self {
        if parts.is_empty() {
            return Self::default();
        }

        let mut position = Vector3::zeros();
        let mut normal = Vector3::zeros();
        let mut uv = Vector2::zeros();
        let mut color = Vector4::zeros();
        for (v, w) in parts {
            position += v.position.coords * *w;
            normal += v.normal * *w;
            uv += v.uv * *w;
            color += v.color * *w;
        }

        let material = parts
            .iter()
            .map(|(v, w)| v.attributes.material.map(|m| m * *w))
            .sum::<Option<Matrix4<f32>>>();

        let mut extras = [None; EXTRA_SLOTS];
        for (slot, extra) in extras.iter_mut().enumerate() {
            *extra = parts
                .iter()
                .map(|(v, w)| v.attributes.extras[slot].map(|e| e * *w))
                .sum::<Option<Vector4<f32>>>();
        }

        Self {
            position: Point3::from(position),
            normal: normal.try_normalize(0.0).unwrap_or(normal),
            uv,
            color,
            attributes: VertexAttributes { material, extras },
        }
    }
}

impl From<Point3<f32>> for Vertex {
    fn from(position: Point3<f32>) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl From<[f32; 3]> for Vertex {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::from_coords(x, y, z)
    }
}
