//! Attribute kinds and active-kind sets.

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of optional "extra" vec4 slots a store can carry.
pub const EXTRA_SLOTS: usize = 5;

/// Number of vec4 columns making up the per-vertex material matrix.
pub const MATERIAL_COLUMNS: usize = 4;

/// One named per-vertex data channel (or the triangle index channel).
///
/// Every kind has a fixed component arity which determines its storage
/// layout and the byte size of one element in the exported render buffer.
///
/// | kind | components | element bytes |
/// |------|-----------|---------------|
/// | `Position`, `Normal` | 3 × f32 | 12 |
/// | `Uv` | 2 × f32 | 8 |
/// | `Color`, `Material1..4`, `Extra0..4` | 4 × f32 | 16 |
/// | `Index` | 3 × u32 | 12 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeKind {
    /// Vertex position.
    Position,
    /// Vertex normal.
    Normal,
    /// Texture coordinates.
    Uv,
    /// RGBA color.
    Color,
    /// First column of the per-vertex material matrix.
    Material1,
    /// Second column of the per-vertex material matrix.
    Material2,
    /// Third column of the per-vertex material matrix.
    Material3,
    /// Fourth column of the per-vertex material matrix.
    Material4,
    /// Triangle vertex indices.
    Index,
    /// Extra slot 0.
    Extra0,
    /// Extra slot 1.
    Extra1,
    /// Extra slot 2.
    Extra2,
    /// Extra slot 3.
    Extra3,
    /// Extra slot 4.
    Extra4,
}

impl AttributeKind {
    /// All kinds in export order.
    pub const ALL: [Self; 14] = [
        Self::Position,
        Self::Normal,
        Self::Uv,
        Self::Color,
        Self::Material1,
        Self::Material2,
        Self::Material3,
        Self::Material4,
        Self::Index,
        Self::Extra0,
        Self::Extra1,
        Self::Extra2,
        Self::Extra3,
        Self::Extra4,
    ];

    /// The four standard per-vertex kinds every store carries.
    pub const STANDARD: [Self; 4] = [Self::Position, Self::Normal, Self::Uv, Self::Color];

    /// Material columns in order.
    pub const MATERIAL: [Self; MATERIAL_COLUMNS] =
        [Self::Material1, Self::Material2, Self::Material3, Self::Material4];

    /// Extra slots in order.
    pub const EXTRAS: [Self; EXTRA_SLOTS] =
        [Self::Extra0, Self::Extra1, Self::Extra2, Self::Extra3, Self::Extra4];

    /// Number of scalar components per element.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Uv => 2,
            Self::Position | Self::Normal | Self::Index => 3,
            _ => 4,
        }
    }

    /// Size in bytes of one element (all components are 32-bit).
    #[must_use]
    pub const fn element_size(self) -> usize {
        self.arity() * 4
    }

    /// Returns `true` for position, normal, uv and color.
    #[must_use]
    pub const fn is_standard(self) -> bool {
        matches!(self, Self::Position | Self::Normal | Self::Uv | Self::Color)
    }

    /// Returns `true` for the four material columns.
    #[must_use]
    pub const fn is_material(self) -> bool {
        matches!(
            self,
            Self::Material1 | Self::Material2 | Self::Material3 | Self::Material4
        )
    }

    /// Returns the extra-slot number if this is an extra kind.
    #[must_use]
    pub const fn extra_slot(self) -> Option<usize> {
        match self {
            Self::Extra0 => Some(0),
            Self::Extra1 => Some(1),
            Self::Extra2 => Some(2),
            Self::Extra3 => Some(3),
            Self::Extra4 => Some(4),
            _ => None,
        }
    }

    /// The extra kind for a slot number, if the slot exists.
    #[must_use]
    pub const fn extra(slot: usize) -> Option<Self> {
        if slot < EXTRA_SLOTS {
            Some(Self::EXTRAS[slot])
        } else {
            None
        }
    }

    /// The single-kind flag for this kind.
    #[must_use]
    pub const fn flag(self) -> AttributeSet {
        match self {
            Self::Position => AttributeSet::POSITION,
            Self::Normal => AttributeSet::NORMAL,
            Self::Uv => AttributeSet::UV,
            Self::Color => AttributeSet::COLOR,
            Self::Material1 => AttributeSet::MATERIAL1,
            Self::Material2 => AttributeSet::MATERIAL2,
            Self::Material3 => AttributeSet::MATERIAL3,
            Self::Material4 => AttributeSet::MATERIAL4,
            Self::Index => AttributeSet::INDEX,
            Self::Extra0 => AttributeSet::EXTRA0,
            Self::Extra1 => AttributeSet::EXTRA1,
            Self::Extra2 => AttributeSet::EXTRA2,
            Self::Extra3 => AttributeSet::EXTRA3,
            Self::Extra4 => AttributeSet::EXTRA4,
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Position => "position",
            Self::Normal => "normal",
            Self::Uv => "uv",
            Self::Color => "color",
            Self::Material1 => "material1",
            Self::Material2 => "material2",
            Self::Material3 => "material3",
            Self::Material4 => "material4",
            Self::Index => "index",
            Self::Extra0 => "extra0",
            Self::Extra1 => "extra1",
            Self::Extra2 => "extra2",
            Self::Extra3 => "extra3",
            Self::Extra4 => "extra4",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Set of active attribute kinds.
    ///
    /// A store's set is fixed at construction. The standard kinds and the
    /// index channel are always present; material columns are all-or-nothing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct AttributeSet: u16 {
        /// Position channel.
        const POSITION = 1 << 0;
        /// Normal channel.
        const NORMAL = 1 << 1;
        /// UV channel.
        const UV = 1 << 2;
        /// Color channel.
        const COLOR = 1 << 3;
        /// Material column 1.
        const MATERIAL1 = 1 << 4;
        /// Material column 2.
        const MATERIAL2 = 1 << 5;
        /// Material column 3.
        const MATERIAL3 = 1 << 6;
        /// Material column 4.
        const MATERIAL4 = 1 << 7;
        /// Triangle index channel.
        const INDEX = 1 << 8;
        /// Extra slot 0.
        const EXTRA0 = 1 << 9;
        /// Extra slot 1.
        const EXTRA1 = 1 << 10;
        /// Extra slot 2.
        const EXTRA2 = 1 << 11;
        /// Extra slot 3.
        const EXTRA3 = 1 << 12;
        /// Extra slot 4.
        const EXTRA4 = 1 << 13;

        /// Position, normal, uv, color and index.
        const STANDARD = Self::POSITION.bits()
            | Self::NORMAL.bits()
            | Self::UV.bits()
            | Self::COLOR.bits()
            | Self::INDEX.bits();
        /// All four material columns.
        const MATERIAL = Self::MATERIAL1.bits()
            | Self::MATERIAL2.bits()
            | Self::MATERIAL3.bits()
            | Self::MATERIAL4.bits();
    }
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl AttributeSet {
    /// The standard set (position, normal, uv, color, index).
    #[must_use]
    pub const fn standard() -> Self {
        Self::STANDARD
    }

    /// Add the four material columns.
    #[must_use]
    pub const fn with_material(self) -> Self {
        self.union(Self::MATERIAL)
    }

    /// Add one extra slot. Slots outside `0..EXTRA_SLOTS` are ignored.
    #[must_use]
    pub const fn with_extra(self, slot: usize) -> Self {
        match AttributeKind::extra(slot) {
            Some(kind) => self.union(kind.flag()),
            None => self,
        }
    }

    /// Check whether a kind is in the set.
    #[must_use]
    pub const fn has(self, kind: AttributeKind) -> bool {
        self.contains(kind.flag())
    }

    /// Iterate over the kinds in the set in export order.
    pub fn kinds(self) -> impl Iterator<Item = AttributeKind> {
        AttributeKind::ALL
            .into_iter()
            .filter(move |kind| self.has(*kind))
    }

    /// Check the structural rules every store set must satisfy.
    ///
    /// Returns a description of the first violated rule.
    pub(crate) fn validate(self) -> Result<(), String> {
        if !self.contains(Self::STANDARD) {
            return Err(format!(
                "attribute set {self:?} lacks position/normal/uv/color/index"
            ));
        }
        let material = self.intersection(Self::MATERIAL);
        if !material.is_empty() && material != Self::MATERIAL {
            return Err(format!(
                "material columns must be enabled together, got {material:?}"
            ));
        }
        Ok(())
    }
}
