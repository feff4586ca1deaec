use std::sync::Arc;

use itertools::Itertools;
use tessera_error::{TesseraResult, tessera_bail, tessera_err};
use tessera_hilbert::{MAX_INDEX_BITS, hilbert_index};

use crate::{ArraySchema, Coordinate, Dimension, TileOrder, Tiling};

/// The layout of regular, fixed-extent tiles over an array's domain.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularTiling {
    order: TileOrder,
    extents: Arc<[f64]>,
    hilbert_bits: u32,
    row_major_offsets: Arc<[i64]>,
    column_major_offsets: Arc<[i64]>,
}

impl RegularTiling {
    /// Derives the tile-id metadata. Extents must already be validated against `dimensions`.
    pub(crate) fn try_new(
        order: TileOrder,
        extents: Arc<[f64]>,
        dimensions: &[Dimension],
    ) -> TesseraResult<Self> {
        let ranges = dimensions
            .iter()
            .zip_eq(extents.iter())
            .map(|(dim, extent)| dim.domain().width() / extent)
            .collect_vec();
        let partitions = ranges.iter().map(|range| partition_count(*range)).collect_vec();
        let tile_bits = hilbert_bits(ranges.iter().copied().fold(0.0, f64::max));
        if order == TileOrder::Hilbert {
            check_hilbert_fits("tile", tile_bits, dimensions.len())?;
        }

        // Row-major offsets grow from the first dimension, column-major ones from the last.
        let row_major_offsets = prefix_products(partitions.iter().copied())?;
        let mut column_major_offsets = prefix_products(partitions.iter().rev().copied())?;
        column_major_offsets.reverse();

        Ok(Self {
            order,
            extents,
            hilbert_bits: tile_bits,
            row_major_offsets: row_major_offsets.into(),
            column_major_offsets: column_major_offsets.into(),
        })
    }

    /// The order of tiles within the array.
    pub fn order(&self) -> TileOrder {
        self.order
    }

    /// The per-dimension tile extents.
    pub fn extents(&self) -> &[f64] {
        &self.extents
    }

    /// The order of the Hilbert curve over the tile grid.
    pub fn hilbert_bits(&self) -> u32 {
        self.hilbert_bits
    }

    /// The per-dimension radix of row-major tile ids; the first dimension has offset 1.
    pub fn row_major_offsets(&self) -> &[i64] {
        &self.row_major_offsets
    }

    /// The per-dimension radix of column-major tile ids; the last dimension has offset 1.
    pub fn column_major_offsets(&self) -> &[i64] {
        &self.column_major_offsets
    }
}

#[allow(clippy::cast_possible_truncation)]
fn partition_count(range: f64) -> i64 {
    range.ceil() as i64
}

/// `[1, p0, p0*p1, ...]`, one entry per partition count.
fn prefix_products(partitions: impl ExactSizeIterator<Item = i64>) -> TesseraResult<Vec<i64>> {
    let mut offsets = Vec::with_capacity(partitions.len());
    let mut offset = 1i64;
    for partition in partitions {
        offsets.push(offset);
        offset = offset.checked_mul(partition).ok_or_else(
            || tessera_err!(InvalidSchema: "the tile grid has more tiles than fit an i64"),
        )?;
    }
    Ok(offsets)
}

/// The number of bits needed to index `max_range` cells along one side of a Hilbert curve.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn hilbert_bits(max_range: f64) -> u32 {
    let cells = (max_range + 0.5) as i64;
    if cells <= 1 {
        return 0;
    }
    (cells as f64).log2().ceil() as u32
}

/// Fails unless the ranks of a Hilbert curve of order `bits` over `dimension_count`
/// dimensions fit an `i64`.
pub(crate) fn check_hilbert_fits(
    level: &str,
    bits: u32,
    dimension_count: usize,
) -> TesseraResult<()> {
    let total_bits = u64::from(bits)
        .saturating_mul(u64::try_from(dimension_count).unwrap_or(u64::MAX));
    if total_bits > u64::from(MAX_INDEX_BITS) {
        tessera_bail!(
            InvalidSchema: "the {level} Hilbert curve of {dimension_count} dimensions at {bits} bits needs {total_bits} bits, at most {MAX_INDEX_BITS} are available"
        );
    }
    Ok(())
}

impl ArraySchema {
    /// Returns the regular tiling, after checking `coords` form a valid tile-id request.
    fn tile_request<T: Coordinate>(&self, coords: &[T]) -> TesseraResult<&RegularTiling> {
        let Tiling::Regular(tiling) = self.tiling() else {
            tessera_bail!(IrregularTiling: "array {} has irregular tiles", self.name());
        };
        self.check_coordinates(coords)?;
        if let Some(dim) = self.first_out_of_domain(coords) {
            tessera_bail!(
                InvalidCoordinates: "coordinate {} lies outside the domain {} of dimension {}",
                coords[dim],
                self.dimensions()[dim].domain(),
                self.dimensions()[dim].name()
            );
        }
        Ok(tiling)
    }

    /// The id of the tile containing `coords` when tiles are numbered in row-major order.
    ///
    /// Partitions are counted from zero rather than from the domain's lower bound, so ids are
    /// only unique per tile when every lower bound is a multiple of its tile extent. Over
    /// `[1,10]` x `[1,10]` with extents of 5, `(10, 1)` and `(1, 5)` share id 2.
    pub fn tile_id_row_major<T: Coordinate>(&self, coords: &[T]) -> TesseraResult<i64> {
        let tiling = self.tile_request(coords)?;
        Ok(tile_id(coords, tiling.extents(), tiling.row_major_offsets()))
    }

    /// The id of the tile containing `coords` when tiles are numbered in column-major order.
    ///
    /// Shares the partitioning of [`tile_id_row_major`](Self::tile_id_row_major), and with it the
    /// requirement on lower bounds for ids to be unique.
    pub fn tile_id_column_major<T: Coordinate>(&self, coords: &[T]) -> TesseraResult<i64> {
        let tiling = self.tile_request(coords)?;
        Ok(tile_id(coords, tiling.extents(), tiling.column_major_offsets()))
    }

    /// The rank along a Hilbert curve over the tile grid of the tile containing `coords`.
    ///
    /// Arrays with Hilbert tile order always have a grid whose ranks fit an `i64`. For other
    /// tile orders, fails with `InvalidArgument` when they would not.
    #[allow(clippy::cast_possible_truncation)]
    pub fn tile_id_hilbert<T: Coordinate>(&self, coords: &[T]) -> TesseraResult<i64> {
        let tiling = self.tile_request(coords)?;
        let tile_coords = coords
            .iter()
            .zip(tiling.extents())
            .map(|(coord, extent)| (coord.to_f64() / extent) as i64)
            .collect_vec();
        hilbert_index(&tile_coords, tiling.hilbert_bits())
    }

    /// The id of the tile containing `coords` under the array's tile order.
    pub fn tile_id<T: Coordinate>(&self, coords: &[T]) -> TesseraResult<i64> {
        match self.tile_order() {
            TileOrder::RowMajor => self.tile_id_row_major(coords),
            TileOrder::ColumnMajor => self.tile_id_column_major(coords),
            TileOrder::Hilbert => self.tile_id_hilbert(coords),
            TileOrder::None => {
                tessera_bail!(IrregularTiling: "array {} has irregular tiles", self.name())
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn tile_id<T: Coordinate>(coords: &[T], extents: &[f64], offsets: &[i64]) -> i64 {
    coords
        .iter()
        .zip(extents)
        .zip(offsets)
        .fold(0i64, |id, ((coord, extent), offset)| {
            let partition = (coord.to_f64() / extent).floor() as i64;
            id.saturating_add(partition.saturating_mul(*offset))
        })
}
