//! Schemas derived from existing ones.
//!
//! A derivation never touches its source: it takes the source's field list, changes what it
//! needs and builds a new schema through the same validation as construction.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use log::trace;
use tessera_error::{TesseraResult, tessera_bail};

use crate::{ArraySchema, CellOrder};

/// The first property that keeps two schemas from being joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinMismatch {
    /// One schema has regular tiles, the other irregular ones
    Tiling,
    /// The schemas have a different number of dimensions
    DimensionCount,
    /// The coordinates have different scalar types
    CoordinateType,
    /// Some dimension spans a different domain
    Domain,
    /// The tile orders differ
    TileOrder,
    /// The cell orders differ
    CellOrder,
    /// Some dimension has a different tile extent
    TileExtent,
}

impl Display for JoinMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tiling => write!(f, "Tile type mismatch."),
            Self::DimensionCount => write!(f, "Dimension number mismatch."),
            Self::CoordinateType => write!(f, "Dimension type mismatch."),
            Self::Domain => write!(f, "Domain mismatch."),
            Self::TileOrder => write!(f, "Tile order mismatch."),
            Self::CellOrder => write!(f, "Cell order mismatch."),
            Self::TileExtent => write!(f, "Tile extent mismatch."),
        }
    }
}

impl ArraySchema {
    /// A copy of this schema under a new name.
    pub fn clone_with_name(&self, name: impl Into<Arc<str>>) -> TesseraResult<Self> {
        let mut parts = self.to_parts();
        parts.name = name.into();
        trace!("renaming schema {} to {}", self.name(), parts.name);
        parts.build()
    }

    /// A schema holding only the user attributes at `indices`, in that order, plus the
    /// coordinates.
    ///
    /// Every index must name a distinct user attribute; the coordinate index is not accepted.
    pub fn clone_with_attributes(
        &self,
        name: impl Into<Arc<str>>,
        indices: &[usize],
    ) -> TesseraResult<Self> {
        if indices.is_empty() {
            tessera_bail!("a projection of array {} must keep at least one attribute", self.name());
        }
        if let Some(idx) = indices.iter().find(|&&idx| idx >= self.attribute_count()) {
            tessera_bail!(
                "attribute index {idx} out of range for array {} with {} attributes",
                self.name(),
                self.attribute_count()
            );
        }
        if !indices.iter().all_unique() {
            tessera_bail!("duplicate attribute index in {indices:?}");
        }

        let mut parts = self.to_parts();
        parts.name = name.into();
        parts.attributes = indices
            .iter()
            .map(|&idx| parts.attributes[idx].clone())
            .collect();
        trace!(
            "projecting schema {} onto attributes {indices:?} as {}",
            self.name(),
            parts.name
        );
        parts.build()
    }

    /// A copy of this schema with a different cell order.
    pub fn clone_with_cell_order(
        &self,
        name: impl Into<Arc<str>>,
        cell_order: CellOrder,
    ) -> TesseraResult<Self> {
        let mut parts = self.to_parts();
        parts.name = name.into();
        parts.cell_order = cell_order;
        trace!(
            "deriving schema {} from {} with cell order {cell_order}",
            parts.name,
            self.name()
        );
        parts.build()
    }

    /// A copy of this schema with a different tile capacity, keeping its name.
    pub fn clone_with_capacity(&self, capacity: u64) -> TesseraResult<Self> {
        if capacity == 0 {
            tessera_bail!("capacity of array {} must be positive", self.name());
        }
        let mut parts = self.to_parts();
        parts.capacity = capacity;
        trace!("setting capacity of schema {} to {capacity}", self.name());
        parts.build()
    }

    /// Swaps the domains of a two-dimensional array.
    ///
    /// Dimension names, attributes, orders and tile extents are kept as they are, so a regular
    /// tiling whose extents no longer fit the swapped domains fails to build.
    pub fn transpose(&self, name: impl Into<Arc<str>>) -> TesseraResult<Self> {
        let [x, y] = self.dimensions() else {
            tessera_bail!(
                "only two-dimensional arrays can be transposed, {} has {} dimensions",
                self.name(),
                self.dimension_count()
            );
        };

        let mut parts = self.to_parts();
        parts.name = name.into();
        parts.dimensions = vec![x.with_domain(y.domain()), y.with_domain(x.domain())];
        trace!("transposing schema {} into {}", self.name(), parts.name);
        parts.build()
    }

    /// Checks whether cells of this array and of `other` can be joined, returning the first
    /// mismatching property otherwise.
    pub fn join_compatible(&self, other: &ArraySchema) -> Result<(), JoinMismatch> {
        if self.has_regular_tiles() != other.has_regular_tiles() {
            return Err(JoinMismatch::Tiling);
        }
        if self.dimension_count() != other.dimension_count() {
            return Err(JoinMismatch::DimensionCount);
        }
        if self.coordinates_type() != other.coordinates_type() {
            return Err(JoinMismatch::CoordinateType);
        }
        if !self.domains().eq(other.domains()) {
            return Err(JoinMismatch::Domain);
        }
        if self.tile_order() != other.tile_order() {
            return Err(JoinMismatch::TileOrder);
        }
        if self.cell_order() != other.cell_order() {
            return Err(JoinMismatch::CellOrder);
        }
        if self.tile_extents() != other.tile_extents() {
            return Err(JoinMismatch::TileExtent);
        }
        Ok(())
    }

    /// Whether cells of this array and of `other` can be joined.
    pub fn is_join_compatible(&self, other: &ArraySchema) -> bool {
        self.join_compatible(other).is_ok()
    }

    /// The schema of the join of this array with `other`.
    ///
    /// The result holds this array's attributes followed by `other`'s. An attribute of `other`
    /// whose name is already taken is renamed with the first free suffix `_2`, `_3`, ...
    /// Dimensions, coordinates, orders, extents, capacity and consolidation step are this
    /// array's. Fails with [`InvalidArgument`](tessera_error::TesseraError::InvalidArgument)
    /// if the schemas are not join compatible.
    pub fn join_result_schema(
        &self,
        other: &ArraySchema,
        name: impl Into<Arc<str>>,
    ) -> TesseraResult<Self> {
        if let Err(mismatch) = self.join_compatible(other) {
            tessera_bail!(
                "arrays {} and {} cannot be joined: {mismatch}",
                self.name(),
                other.name()
            );
        }

        let mut parts = self.to_parts();
        parts.name = name.into();

        let mut taken: HashSet<Arc<str>> = parts
            .attributes
            .iter()
            .map(|attribute| attribute.name().clone())
            .collect();
        for attribute in other.attributes() {
            let name = unique_name(attribute.name(), &taken);
            taken.insert(name.clone());
            parts.attributes.push(if &name == attribute.name() {
                attribute.clone()
            } else {
                attribute.with_name(name)
            });
        }

        trace!(
            "joining schemas {} and {} into {} with {} attributes",
            self.name(),
            other.name(),
            parts.name,
            parts.attributes.len()
        );
        parts.build()
    }
}

fn unique_name(name: &Arc<str>, taken: &HashSet<Arc<str>>) -> Arc<str> {
    if !taken.contains(name) {
        return name.clone();
    }
    (2usize..)
        .map(|suffix| Arc::<str>::from(format!("{name}_{suffix}")))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.clone())
}

#[cfg(test)]
mod test {
    use rstest::{fixture, rstest};
    use tessera_error::TesseraError;

    use crate::derive::JoinMismatch;
    use crate::{
        ArraySchema, Attribute, CellOrder, CellSize, Compression, Dimension, Domain, ScalarType,
        TileOrder, ValuesPerCell,
    };

    fn tiled(
        name: &str,
        attributes: Vec<Attribute>,
        tile_order: TileOrder,
        cell_order: CellOrder,
    ) -> ArraySchema {
        ArraySchema::try_new_regular(
            name,
            attributes,
            vec![
                Dimension::new("row", (0.0, 9.0)),
                Dimension::new("col", (0.0, 19.0)),
            ],
            ScalarType::Int64,
            tile_order,
            vec![5.0, 5.0],
            2,
            50,
            cell_order,
        )
        .unwrap()
    }

    #[fixture]
    fn left() -> ArraySchema {
        tiled(
            "left",
            vec![
                Attribute::scalar("a", ScalarType::Int32),
                Attribute::var("b", ScalarType::Char).with_compression(Compression::Rle),
                Attribute::new("c", ScalarType::Float32, ValuesPerCell::Fixed(2)),
            ],
            TileOrder::RowMajor,
            CellOrder::RowMajor,
        )
    }

    #[fixture]
    fn right() -> ArraySchema {
        tiled(
            "right",
            vec![
                Attribute::scalar("a", ScalarType::Float64),
                Attribute::scalar("a_2", ScalarType::Int32),
                Attribute::scalar("d", ScalarType::Int64),
            ],
            TileOrder::RowMajor,
            CellOrder::RowMajor,
        )
    }

    #[rstest]
    fn rename_keeps_everything_else(left: ArraySchema) {
        let renamed = left.clone_with_name("other").unwrap();
        assert_eq!(renamed.name().as_ref(), "other");
        assert_eq!(renamed.attributes(), left.attributes());
        assert_eq!(renamed.tiling(), left.tiling());
        assert_eq!(left.name().as_ref(), "left");
    }

    #[rstest]
    fn projection(left: ArraySchema) {
        let projected = left.clone_with_attributes("proj", &[2, 0]).unwrap();
        assert_eq!(projected.attribute_count(), 2);
        assert_eq!(projected.attribute_name(0).unwrap().as_ref(), "c");
        assert_eq!(projected.attribute_name(1).unwrap().as_ref(), "a");
        assert_eq!(projected.attribute_name(2).unwrap().as_ref(), "__coords");
        assert_eq!(projected.cell_byte_size(0).unwrap(), CellSize::Fixed(8));
        assert_eq!(projected.total_cell_byte_size(), CellSize::Fixed(8 + 4 + 16));
        assert_eq!(projected.tile_extents(), left.tile_extents());

        let var = left.clone_with_attributes("var", &[1]).unwrap();
        assert_eq!(var.compression(0).unwrap(), Compression::Rle);
        assert!(var.total_cell_byte_size().is_var());
    }

    #[rstest]
    #[case::out_of_range(vec![0, 5])]
    #[case::coordinates(vec![3])]
    #[case::duplicate(vec![1, 1])]
    #[case::empty(vec![])]
    fn projection_rejects_bad_indices(left: ArraySchema, #[case] indices: Vec<usize>) {
        assert!(matches!(
            left.clone_with_attributes("proj", &indices),
            Err(TesseraError::InvalidArgument(..))
        ));
    }

    #[rstest]
    fn overrides(left: ArraySchema) {
        let hilbert = left.clone_with_cell_order("h", CellOrder::Hilbert).unwrap();
        assert_eq!(hilbert.cell_order(), CellOrder::Hilbert);
        assert_eq!(hilbert.capacity(), left.capacity());
        assert_eq!(left.cell_order(), CellOrder::RowMajor);

        let bigger = left.clone_with_capacity(1 << 20).unwrap();
        assert_eq!(bigger.capacity(), 1 << 20);
        assert_eq!(bigger.name(), left.name());
        assert!(matches!(
            left.clone_with_capacity(0),
            Err(TesseraError::InvalidArgument(..))
        ));
    }

    #[test]
    fn transpose_swaps_domains() {
        let schema = ArraySchema::try_new_irregular(
            "m",
            vec![Attribute::scalar("v", ScalarType::Float64)],
            vec![
                Dimension::new("i", (0.0, 9.0)),
                Dimension::new("j", (0.0, 19.0)),
            ],
            ScalarType::Int32,
            CellOrder::ColumnMajor,
            3,
            100,
        )
        .unwrap();
        let transposed = schema.transpose("mt").unwrap();
        assert_eq!(
            transposed.domains().collect::<Vec<_>>(),
            vec![Domain::new(0.0, 19.0), Domain::new(0.0, 9.0)]
        );
        assert_eq!(transposed.dimensions()[0].name().as_ref(), "i");
        assert_eq!(transposed.attributes(), schema.attributes());
        assert_eq!(transposed.cell_order(), CellOrder::ColumnMajor);
        assert_eq!(transposed.capacity(), 100);
        assert_eq!(transposed.consolidation_step(), 3);
        assert_eq!(transposed.transpose("m").unwrap(), schema);
    }

    #[rstest]
    fn transpose_keeps_tile_extents(left: ArraySchema) {
        let transposed = left.transpose("t").unwrap();
        assert_eq!(transposed.tile_extents(), &[5.0, 5.0]);
    }

    #[test]
    fn transpose_requires_two_dimensions() {
        let schema = ArraySchema::try_new_irregular(
            "line",
            vec![Attribute::scalar("v", ScalarType::Float64)],
            vec![Dimension::new("i", (0.0, 9.0))],
            ScalarType::Int64,
            CellOrder::RowMajor,
            1,
            10,
        )
        .unwrap();
        assert!(matches!(
            schema.transpose("t"),
            Err(TesseraError::InvalidArgument(..))
        ));
    }

    #[rstest]
    fn tile_order_mismatch(left: ArraySchema) {
        let other = tiled(
            "other",
            left.attributes().to_vec(),
            TileOrder::ColumnMajor,
            CellOrder::RowMajor,
        );
        assert_eq!(left.join_compatible(&other), Err(JoinMismatch::TileOrder));
        assert_eq!(
            JoinMismatch::TileOrder.to_string(),
            "Tile order mismatch."
        );
        assert!(matches!(
            left.join_result_schema(&other, "j"),
            Err(TesseraError::InvalidArgument(..))
        ));
    }

    #[rstest]
    fn compatibility_is_symmetric(left: ArraySchema, right: ArraySchema) {
        let attributes = vec![Attribute::scalar("x", ScalarType::Int32)];
        let irregular = ArraySchema::try_new_irregular(
            "irregular",
            attributes.clone(),
            left.dimensions().to_vec(),
            ScalarType::Int64,
            CellOrder::RowMajor,
            1,
            10,
        )
        .unwrap();
        let hilbert_cells = tiled("h", attributes.clone(), TileOrder::RowMajor, CellOrder::Hilbert);
        let float_coords = ArraySchema::try_new_regular(
            "f",
            attributes.clone(),
            left.dimensions().to_vec(),
            ScalarType::Float64,
            TileOrder::RowMajor,
            vec![5.0, 5.0],
            1,
            10,
            CellOrder::RowMajor,
        )
        .unwrap();
        let wider_tiles = ArraySchema::try_new_regular(
            "w",
            attributes,
            left.dimensions().to_vec(),
            ScalarType::Int64,
            TileOrder::RowMajor,
            vec![10.0, 5.0],
            1,
            10,
            CellOrder::RowMajor,
        )
        .unwrap();
        let transposed = left.transpose("t").unwrap();

        let cases = [
            (&right, Ok(())),
            (&irregular, Err(JoinMismatch::Tiling)),
            (&float_coords, Err(JoinMismatch::CoordinateType)),
            (&transposed, Err(JoinMismatch::Domain)),
            (&hilbert_cells, Err(JoinMismatch::CellOrder)),
            (&wider_tiles, Err(JoinMismatch::TileExtent)),
        ];
        for (other, expected) in cases {
            assert_eq!(left.join_compatible(other), expected, "{}", other.name());
            assert_eq!(other.join_compatible(&left), expected, "{}", other.name());
        }
    }

    #[rstest]
    fn join_renames_collisions(left: ArraySchema, right: ArraySchema) {
        let joined = left.join_result_schema(&right, "joined").unwrap();
        let names: Vec<&str> = joined.attributes().iter().map(|a| a.name().as_ref()).collect();
        assert_eq!(names, vec!["a", "b", "c", "a_2", "a_2_2", "d"]);
        assert_eq!(joined.scalar_type(3).unwrap(), ScalarType::Float64);
        assert_eq!(joined.compression(1).unwrap(), Compression::Rle);
        assert_eq!(joined.coordinates_type(), ScalarType::Int64);
        assert_eq!(joined.tile_extents(), left.tile_extents());
        assert_eq!(joined.capacity(), left.capacity());
        assert_eq!(joined.dimensions(), left.dimensions());
        assert!(joined.total_cell_byte_size().is_var());
    }

    #[rstest]
    fn join_suffixes_skip_taken_names(left: ArraySchema) {
        let right = tiled(
            "r",
            vec![
                Attribute::scalar("a_2", ScalarType::Int32),
                Attribute::scalar("a", ScalarType::Int32),
            ],
            TileOrder::RowMajor,
            CellOrder::RowMajor,
        );
        let joined = left.join_result_schema(&right, "j").unwrap();
        let names: Vec<&str> = joined.attributes().iter().map(|a| a.name().as_ref()).collect();
        assert_eq!(names, vec!["a", "b", "c", "a_2", "a_3"]);
    }
}
