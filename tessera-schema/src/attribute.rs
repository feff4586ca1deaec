use std::fmt::{Display, Formatter};
use std::iter::Sum;
use std::ops::Add;
use std::sync::Arc;

use crate::{Compression, ScalarType};

/// The reserved name of the pseudo-attribute holding a cell's coordinates.
pub const COORDINATES_NAME: &str = "__coords";

/// The number of values an attribute stores in every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ValuesPerCell {
    /// Every cell holds exactly this many values
    Fixed(u32),
    /// Cells hold a variable number of values
    Var,
}

impl ValuesPerCell {
    /// The sentinel standing for [`ValuesPerCell::Var`] in a serialized schema.
    pub const VAR_TAG: i32 = i32::MAX;

    /// Whether cells hold a variable number of values.
    pub fn is_var(&self) -> bool {
        matches!(self, Self::Var)
    }
}

impl Display for ValuesPerCell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Var => write!(f, "var"),
        }
    }
}

/// The byte size of a cell, or of the part of a cell a set of attributes occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellSize {
    /// Every cell occupies exactly this many bytes
    Fixed(usize),
    /// Cells are variable-length
    Var,
}

impl CellSize {
    /// Returns the size in bytes if it is fixed.
    pub fn fixed(&self) -> Option<usize> {
        match self {
            Self::Fixed(n) => Some(*n),
            Self::Var => None,
        }
    }

    /// Whether the size is variable.
    pub fn is_var(&self) -> bool {
        matches!(self, Self::Var)
    }
}

impl Add for CellSize {
    type Output = CellSize;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::Fixed(lhs), Self::Fixed(rhs)) => Self::Fixed(lhs + rhs),
            _ => Self::Var,
        }
    }
}

impl Sum for CellSize {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(CellSize::Fixed(0), Add::add)
    }
}

impl Display for CellSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Var => write!(f, "var"),
        }
    }
}

/// A named, typed value stored in every cell of an array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    name: Arc<str>,
    scalar_type: ScalarType,
    values_per_cell: ValuesPerCell,
    #[cfg_attr(feature = "serde", serde(default))]
    compression: Compression,
}

impl Attribute {
    /// Create an uncompressed attribute.
    pub fn new(
        name: impl Into<Arc<str>>,
        scalar_type: ScalarType,
        values_per_cell: ValuesPerCell,
    ) -> Self {
        Self {
            name: name.into(),
            scalar_type,
            values_per_cell,
            compression: Compression::None,
        }
    }

    /// Create an attribute holding a single value per cell.
    pub fn scalar(name: impl Into<Arc<str>>, scalar_type: ScalarType) -> Self {
        Self::new(name, scalar_type, ValuesPerCell::Fixed(1))
    }

    /// Create an attribute holding a variable number of values per cell.
    pub fn var(name: impl Into<Arc<str>>, scalar_type: ScalarType) -> Self {
        Self::new(name, scalar_type, ValuesPerCell::Var)
    }

    /// The coordinate pseudo-attribute of an array with `dimension_count` dimensions.
    pub(crate) fn coordinates(
        scalar_type: ScalarType,
        dimension_count: usize,
        compression: Compression,
    ) -> Self {
        let count = u32::try_from(dimension_count).unwrap_or(u32::MAX);
        Self::new(COORDINATES_NAME, scalar_type, ValuesPerCell::Fixed(count))
            .with_compression(compression)
    }

    /// Returns a copy of this attribute using the given codec.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Returns a copy of this attribute under a new name.
    pub fn with_name(&self, name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// The attribute's name.
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The kind of every value of the attribute.
    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }

    /// How many values each cell holds.
    pub fn values_per_cell(&self) -> ValuesPerCell {
        self.values_per_cell
    }

    /// The codec applied to the attribute.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// The number of bytes one cell of this attribute occupies.
    pub fn cell_size(&self) -> CellSize {
        match self.values_per_cell {
            ValuesPerCell::Fixed(n) => CellSize::Fixed(n as usize * self.scalar_type.byte_width()),
            ValuesPerCell::Var => CellSize::Var,
        }
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}[{}]",
            self.name, self.scalar_type, self.values_per_cell
        )
    }
}
