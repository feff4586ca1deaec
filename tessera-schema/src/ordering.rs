//! Ordering of cells by their coordinates.

use std::cmp::Ordering;

use itertools::Itertools;
use tessera_error::{TesseraResult, tessera_bail};
use tessera_hilbert::hilbert_index;

use crate::{ArraySchema, CellOrder, Coordinate, Tiling};

impl ArraySchema {
    /// Checks `coords` has the schema's coordinate type and one value per dimension.
    pub(crate) fn check_coordinates<T: Coordinate>(&self, coords: &[T]) -> TesseraResult<()> {
        if T::SCALAR_TYPE != self.coordinates_type() {
            tessera_bail!(
                InvalidCoordinates: "array {} has {} coordinates, got {}",
                self.name(),
                self.coordinates_type(),
                T::SCALAR_TYPE
            );
        }
        if coords.len() != self.dimension_count() {
            tessera_bail!(
                InvalidCoordinates: "array {} has {} dimensions, got {} coordinates",
                self.name(),
                self.dimension_count(),
                coords.len()
            );
        }
        Ok(())
    }

    /// The index of the first coordinate lying outside its dimension's domain.
    pub(crate) fn first_out_of_domain<T: Coordinate>(&self, coords: &[T]) -> Option<usize> {
        self.domains()
            .zip(coords)
            .position(|(domain, coord)| !domain.contains(coord.to_f64()))
    }

    /// The rank of a cell along the Hilbert curve used for cell ordering.
    ///
    /// With regular tiles the rank is local to the cell's tile: each coordinate is reduced
    /// modulo its tile extent. With irregular tiles the curve spans the whole domain.
    pub fn cell_id_hilbert<T: Coordinate>(&self, coords: &[T]) -> TesseraResult<i64> {
        self.check_coordinates(coords)?;
        if let Some(dim) = self.first_out_of_domain(coords) {
            tessera_bail!(
                OutOfDomain: "coordinate {} lies outside the domain {} of dimension {}",
                coords[dim],
                self.dimensions()[dim].domain(),
                self.dimensions()[dim].name()
            );
        }

        let int_coords = match self.tiling() {
            Tiling::Regular(tiling) => coords
                .iter()
                .zip(tiling.extents())
                .map(|(coord, extent)| coord.to_i64() % extent_cells(*extent))
                .collect_vec(),
            Tiling::Irregular => coords.iter().map(|coord| coord.to_i64()).collect_vec(),
        };

        hilbert_index(&int_coords, self.hilbert_cell_bits())
    }

    /// Compares two cells under the array's cell order.
    ///
    /// Under Hilbert order, cells sharing a Hilbert rank are compared in row-major order.
    /// Arrays without a cell order compare in row-major order.
    pub fn compare_cells<T: Coordinate>(&self, a: &[T], b: &[T]) -> TesseraResult<Ordering> {
        self.check_coordinates(a)?;
        self.check_coordinates(b)?;

        Ok(match self.cell_order() {
            CellOrder::RowMajor | CellOrder::None => row_major(a, b),
            CellOrder::ColumnMajor => column_major(a, b),
            CellOrder::Hilbert => self
                .cell_id_hilbert(a)?
                .cmp(&self.cell_id_hilbert(b)?)
                .then_with(|| row_major(a, b)),
        })
    }

    /// Whether the cell at `a` comes strictly before the cell at `b`.
    pub fn precedes<T: Coordinate>(&self, a: &[T], b: &[T]) -> TesseraResult<bool> {
        Ok(self.compare_cells(a, b)?.is_lt())
    }

    /// Whether the cell at `a` comes strictly after the cell at `b`.
    pub fn succeeds<T: Coordinate>(&self, a: &[T], b: &[T]) -> TesseraResult<bool> {
        Ok(self.compare_cells(a, b)?.is_gt())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn extent_cells(extent: f64) -> i64 {
    (extent as i64).max(1)
}

fn compare_coordinate<T: Coordinate>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

fn row_major<T: Coordinate>(a: &[T], b: &[T]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(a, b)| compare_coordinate(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn column_major<T: Coordinate>(a: &[T], b: &[T]) -> Ordering {
    a.iter()
        .zip(b)
        .rev()
        .map(|(a, b)| compare_coordinate(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}
