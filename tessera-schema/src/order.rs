use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The order in which cells are laid out within a tile.
///
/// The discriminant is the order's tag in a serialized schema.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[repr(u8)]
pub enum CellOrder {
    /// The last dimension varies slowest
    ColumnMajor = 0,
    /// Cells follow a Hilbert curve, ties broken in row-major order
    Hilbert = 1,
    /// The first dimension varies slowest
    #[default]
    RowMajor = 2,
    /// No particular order; compared as row-major
    None = 3,
}

/// The order in which tiles are laid out within an array.
///
/// Only arrays with regular tiles carry a tile order other than [`TileOrder::None`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[repr(u8)]
pub enum TileOrder {
    /// Tile ids follow column-major order
    ColumnMajor = 0,
    /// Tile ids follow a Hilbert curve over the tile grid
    Hilbert = 1,
    /// Tile ids follow row-major order
    RowMajor = 2,
    /// Irregular tiling, tiles carry no id
    #[default]
    None = 3,
}

impl Display for CellOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnMajor => write!(f, "column-major"),
            Self::Hilbert => write!(f, "hilbert"),
            Self::RowMajor => write!(f, "row-major"),
            Self::None => write!(f, "none"),
        }
    }
}

impl Display for TileOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnMajor => write!(f, "column-major"),
            Self::Hilbert => write!(f, "hilbert"),
            Self::RowMajor => write!(f, "row-major"),
            Self::None => write!(f, "none"),
        }
    }
}
