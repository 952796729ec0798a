//! Polygroup identifiers.

use std::fmt;

use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const BOUNDARY_PREFIX: &str = "bd";
const CURVE_PREFIX: &str = "curva";
const RANDOM_DIGITS: usize = 8;

/// Name of an independently addressable sub-mesh.
///
/// Ids are either small integers or strings. They order integers first,
/// then strings lexicographically, so iteration over an aggregate's groups
/// is deterministic.
///
/// # Example
///
/// ```
/// use mesh_polygroup::PolyGroupId;
///
/// let id = PolyGroupId::curve(3);
/// assert!(id.is_curve());
/// assert_eq!(id.to_string(), "curva3");
/// assert_eq!(PolyGroupId::from(7).prefixed("x"), PolyGroupId::from("x7"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PolyGroupId {
    /// Integer id.
    Int(i64),
    /// String id.
    Name(String),
}

impl Default for PolyGroupId {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl PolyGroupId {
    /// Id with `prefix` prepended to this id's text form.
    #[must_use]
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self::Name(format!("{prefix}{self}"))
    }

    /// Id made of random decimal digits.
    #[must_use]
    pub fn random() -> Self {
        Self::Name(random_digits())
    }

    /// This id with a random numeric prefix.
    ///
    /// Used to rename colliding ids during a merge.
    #[must_use]
    pub fn make_unique(&self) -> Self {
        self.prefixed(&random_digits())
    }

    /// Id of the `n`-th boundary group.
    #[must_use]
    pub fn boundary(n: usize) -> Self {
        Self::Name(format!("{BOUNDARY_PREFIX}{n}"))
    }

    /// Id of the `n`-th curve group.
    #[must_use]
    pub fn curve(n: usize) -> Self {
        Self::Name(format!("{CURVE_PREFIX}{n}"))
    }

    /// Random id in the curve namespace.
    #[must_use]
    pub fn random_curve() -> Self {
        Self::Name(format!("{CURVE_PREFIX}{}", random_digits()))
    }

    /// Random id in the boundary namespace.
    #[must_use]
    pub fn random_boundary() -> Self {
        Self::Name(format!("{BOUNDARY_PREFIX}{}", random_digits()))
    }

    /// Check whether the id is in the curve namespace.
    #[must_use]
    pub fn is_curve(&self) -> bool {
        matches!(self, Self::Name(s) if s.starts_with(CURVE_PREFIX))
    }

    /// Check whether the id is in the boundary namespace.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::Name(s) if s.starts_with(BOUNDARY_PREFIX))
    }
}

fn random_digits() -> String {
    let mut rng = rand::thread_rng();
    (0..RANDOM_DIGITS)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

impl fmt::Display for PolyGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Name(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PolyGroupId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for PolyGroupId {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<&str> for PolyGroupId {
    fn from(s: &str) -> Self {
        Self::Name(s.to_owned())
    }
}

impl From<String> for PolyGroupId {
    fn from(s: String) -> Self {
        Self::Name(s)
    }
}
