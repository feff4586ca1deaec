use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use itertools::Itertools;
use log::debug;
use tessera_error::{TesseraResult, tessera_bail, tessera_err};

use crate::tiling::{RegularTiling, check_hilbert_fits, hilbert_bits};
use crate::{
    Attribute, COORDINATES_NAME, CellOrder, CellSize, Compression, Dimension, Domain, ScalarType,
    TileOrder, ValuesPerCell,
};

/// How an array's coordinate space is chunked into tiles.
#[derive(Debug, Clone, PartialEq)]
pub enum Tiling {
    /// Tiles are formed by grouping `capacity` consecutive cells
    Irregular,
    /// The domain is partitioned into fixed-extent tiles
    Regular(RegularTiling),
}

/// The description of a multi-dimensional array: its dimensions, its attributes and the
/// physical layout of its cells and tiles.
///
/// A schema is immutable once built. Every derivation (projection, transpose, join...) produces
/// a new schema, validated and derived through the same path as construction and decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    name: Arc<str>,
    /// The user attributes followed by the coordinate pseudo-attribute.
    attributes: Arc<[Attribute]>,
    dimensions: Arc<[Dimension]>,
    cell_order: CellOrder,
    tiling: Tiling,
    capacity: u64,
    consolidation_step: u32,
    cell_sizes: Arc<[CellSize]>,
    cell_size: CellSize,
    hilbert_cell_bits: u32,
}

/// The explicit field list every schema is built from.
#[derive(Debug, Clone)]
pub(crate) struct SchemaParts {
    pub name: Arc<str>,
    pub attributes: Vec<Attribute>,
    pub coordinate_type: ScalarType,
    pub coordinate_compression: Compression,
    pub dimensions: Vec<Dimension>,
    pub cell_order: CellOrder,
    pub tile_order: TileOrder,
    /// Empty for irregular tiling.
    pub tile_extents: Vec<f64>,
    pub capacity: u64,
    pub consolidation_step: u32,
}

impl SchemaParts {
    /// Checks every schema invariant and computes the derived layout metadata.
    pub fn build(self) -> TesseraResult<ArraySchema> {
        self.validate()?;

        let Self {
            name,
            attributes,
            coordinate_type,
            coordinate_compression,
            dimensions,
            cell_order,
            tile_order,
            tile_extents,
            capacity,
            consolidation_step,
        } = self;

        let tiling = if tile_extents.is_empty() {
            Tiling::Irregular
        } else {
            Tiling::Regular(RegularTiling::try_new(
                tile_order,
                tile_extents.into(),
                &dimensions,
            )?)
        };

        let coordinates =
            Attribute::coordinates(coordinate_type, dimensions.len(), coordinate_compression);
        let attributes: Arc<[Attribute]> = attributes.into_iter().chain([coordinates]).collect();
        let cell_sizes: Arc<[CellSize]> = attributes.iter().map(Attribute::cell_size).collect();
        let cell_size = cell_sizes.iter().copied().sum();

        let max_range = dimensions
            .iter()
            .enumerate()
            .map(|(i, dim)| match &tiling {
                Tiling::Regular(regular) => regular.extents()[i],
                Tiling::Irregular => dim.domain().width(),
            })
            .fold(0.0, f64::max);
        let hilbert_cell_bits = hilbert_bits(max_range);
        check_hilbert_fits("cell", hilbert_cell_bits, dimensions.len())?;

        let schema = ArraySchema {
            name,
            attributes,
            dimensions: dimensions.into(),
            cell_order,
            tiling,
            capacity,
            consolidation_step,
            cell_sizes,
            cell_size,
            hilbert_cell_bits,
        };

        debug!(
            "built schema {} with {} attributes, {} dimensions, {} tiles",
            schema.name,
            schema.attribute_count(),
            schema.dimension_count(),
            if schema.has_regular_tiles() {
                "regular"
            } else {
                "irregular"
            }
        );

        Ok(schema)
    }

    fn validate(&self) -> TesseraResult<()> {
        check_name_length(&self.name)?;

        if self.attributes.is_empty() {
            tessera_bail!(InvalidSchema: "array {} must have at least one attribute", self.name);
        }
        if self.dimensions.is_empty() {
            tessera_bail!(InvalidSchema: "array {} must have at least one dimension", self.name);
        }
        if i32::try_from(self.attributes.len()).is_err()
            || i32::try_from(self.dimensions.len()).is_err()
        {
            tessera_bail!(InvalidSchema: "array {} has too many attributes or dimensions", self.name);
        }

        let mut attribute_names = HashSet::with_capacity(self.attributes.len());
        for attribute in &self.attributes {
            check_name_length(attribute.name())?;
            if attribute.name().as_ref() == COORDINATES_NAME {
                tessera_bail!(InvalidSchema: "attribute name {COORDINATES_NAME} is reserved");
            }
            if !attribute_names.insert(attribute.name()) {
                tessera_bail!(InvalidSchema: "duplicate attribute name {}", attribute.name());
            }
            if let ValuesPerCell::Fixed(n) = attribute.values_per_cell() {
                if n == 0 || i64::from(n) >= i64::from(ValuesPerCell::VAR_TAG) {
                    tessera_bail!(
                        InvalidSchema: "attribute {} has an invalid number of values per cell: {n}",
                        attribute.name()
                    );
                }
            }
        }

        if !self.coordinate_type.is_coordinate() {
            tessera_bail!(InvalidSchema: "{} cannot be used as a coordinate type", self.coordinate_type);
        }

        let mut dimension_names = HashSet::with_capacity(self.dimensions.len());
        for dimension in &self.dimensions {
            check_name_length(dimension.name())?;
            if !dimension_names.insert(dimension.name()) {
                tessera_bail!(InvalidSchema: "duplicate dimension name {}", dimension.name());
            }
            if !dimension.domain().is_valid() {
                tessera_bail!(
                    InvalidSchema: "dimension {} has an empty or unbounded domain {}",
                    dimension.name(),
                    dimension.domain()
                );
            }
        }

        if self.capacity == 0 || i64::try_from(self.capacity).is_err() {
            tessera_bail!(InvalidSchema: "capacity must be positive and fit an i64, got {}", self.capacity);
        }
        if self.consolidation_step == 0 || i32::try_from(self.consolidation_step).is_err() {
            tessera_bail!(
                InvalidSchema: "consolidation step must be positive and fit an i32, got {}",
                self.consolidation_step
            );
        }

        if self.tile_extents.is_empty() {
            if self.tile_order != TileOrder::None {
                tessera_bail!(InvalidSchema: "irregular tiles cannot have tile order {}", self.tile_order);
            }
            return Ok(());
        }

        if self.tile_order == TileOrder::None {
            tessera_bail!(InvalidSchema: "regular tiles require a tile order");
        }
        if self.tile_extents.len() != self.dimensions.len() {
            tessera_bail!(
                InvalidSchema: "expected one tile extent per dimension ({}), got {}",
                self.dimensions.len(),
                self.tile_extents.len()
            );
        }
        for (dimension, &extent) in self.dimensions.iter().zip_eq(&self.tile_extents) {
            // Written so that NaN fails both comparisons.
            if !(extent > 0.0 && extent <= dimension.domain().width()) {
                tessera_bail!(
                    InvalidSchema: "tile extent {extent} of dimension {} must be positive and at most its domain width {}",
                    dimension.name(),
                    dimension.domain().width()
                );
            }
        }

        Ok(())
    }
}

fn check_name_length(name: &str) -> TesseraResult<()> {
    if i32::try_from(name.len()).is_err() {
        tessera_bail!(InvalidSchema: "name of {} bytes is too long", name.len());
    }
    Ok(())
}

impl ArraySchema {
    /// Create a schema with irregular tiles.
    ///
    /// Fails with [`InvalidSchema`](tessera_error::TesseraError::InvalidSchema) if any schema
    /// invariant is violated.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new_irregular(
        name: impl Into<Arc<str>>,
        attributes: Vec<Attribute>,
        dimensions: Vec<Dimension>,
        coordinate_type: ScalarType,
        cell_order: CellOrder,
        consolidation_step: u32,
        capacity: u64,
    ) -> TesseraResult<Self> {
        SchemaParts {
            name: name.into(),
            attributes,
            coordinate_type,
            coordinate_compression: Compression::None,
            dimensions,
            cell_order,
            tile_order: TileOrder::None,
            tile_extents: Vec::new(),
            capacity,
            consolidation_step,
        }
        .build()
    }

    /// Create a schema with regular tiles of the given per-dimension extents.
    ///
    /// Fails with [`InvalidSchema`](tessera_error::TesseraError::InvalidSchema) if any schema
    /// invariant is violated, including an extent that is zero or wider than its domain.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new_regular(
        name: impl Into<Arc<str>>,
        attributes: Vec<Attribute>,
        dimensions: Vec<Dimension>,
        coordinate_type: ScalarType,
        tile_order: TileOrder,
        tile_extents: Vec<f64>,
        consolidation_step: u32,
        capacity: u64,
        cell_order: CellOrder,
    ) -> TesseraResult<Self> {
        if tile_extents.is_empty() {
            tessera_bail!(InvalidSchema: "regular tiles require one tile extent per dimension");
        }
        SchemaParts {
            name: name.into(),
            attributes,
            coordinate_type,
            coordinate_compression: Compression::None,
            dimensions,
            cell_order,
            tile_order,
            tile_extents,
            capacity,
            consolidation_step,
        }
        .build()
    }

    /// The explicit field list this schema was built from.
    pub(crate) fn to_parts(&self) -> SchemaParts {
        let coordinates = self.coordinates();
        SchemaParts {
            name: self.name.clone(),
            attributes: self.attributes().to_vec(),
            coordinate_type: coordinates.scalar_type(),
            coordinate_compression: coordinates.compression(),
            dimensions: self.dimensions.to_vec(),
            cell_order: self.cell_order,
            tile_order: self.tile_order(),
            tile_extents: self.tile_extents().to_vec(),
            capacity: self.capacity,
            consolidation_step: self.consolidation_step,
        }
    }

    /// The name of the array.
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The number of user attributes, excluding the coordinate pseudo-attribute.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len() - 1
    }

    /// The index of the coordinate pseudo-attribute, one past the last user attribute.
    pub fn coordinates_index(&self) -> usize {
        self.attribute_count()
    }

    /// The user attributes in declaration order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes[..self.attribute_count()]
    }

    /// The coordinate pseudo-attribute.
    pub fn coordinates(&self) -> &Attribute {
        &self.attributes[self.attribute_count()]
    }

    /// Every attribute index, the coordinate pseudo-attribute included.
    pub fn attribute_indices(&self) -> impl Iterator<Item = usize> {
        0..self.attributes.len()
    }

    /// The attribute at `idx`; `idx == attribute_count()` addresses the coordinates.
    pub fn attribute(&self, idx: usize) -> TesseraResult<&Attribute> {
        self.attributes.get(idx).ok_or_else(|| {
            tessera_err!(
                "attribute index {idx} out of range for array {} with {} attributes",
                self.name,
                self.attribute_count()
            )
        })
    }

    /// The name of the attribute at `idx`.
    pub fn attribute_name(&self, idx: usize) -> TesseraResult<&Arc<str>> {
        self.attribute(idx).map(Attribute::name)
    }

    /// The scalar kind of the attribute at `idx`.
    pub fn scalar_type(&self, idx: usize) -> TesseraResult<ScalarType> {
        self.attribute(idx).map(Attribute::scalar_type)
    }

    /// The number of values per cell of the attribute at `idx`.
    pub fn values_per_cell(&self, idx: usize) -> TesseraResult<ValuesPerCell> {
        self.attribute(idx).map(Attribute::values_per_cell)
    }

    /// The codec of the attribute at `idx`.
    pub fn compression(&self, idx: usize) -> TesseraResult<Compression> {
        self.attribute(idx).map(Attribute::compression)
    }

    /// The byte width of a single value of the attribute at `idx`.
    pub fn scalar_byte_width(&self, idx: usize) -> TesseraResult<usize> {
        self.scalar_type(idx).map(|scalar| scalar.byte_width())
    }

    /// The byte size of one cell of the attribute at `idx`.
    pub fn cell_byte_size(&self, idx: usize) -> TesseraResult<CellSize> {
        self.cell_sizes.get(idx).copied().ok_or_else(|| {
            tessera_err!(
                "attribute index {idx} out of range for array {} with {} attributes",
                self.name,
                self.attribute_count()
            )
        })
    }

    /// The byte size a cell occupies across the attributes at `indices`.
    ///
    /// The indices must be distinct and in range; the coordinate index may be included.
    pub fn cell_byte_size_of(&self, indices: &[usize]) -> TesseraResult<CellSize> {
        if !indices.iter().all_unique() {
            tessera_bail!("duplicate attribute index in {indices:?}");
        }
        indices
            .iter()
            .map(|&idx| self.cell_byte_size(idx))
            .sum::<TesseraResult<CellSize>>()
    }

    /// The byte size of a whole cell, coordinates included.
    pub fn total_cell_byte_size(&self) -> CellSize {
        self.cell_size
    }

    /// The byte size of a cell's coordinates.
    pub fn coordinates_byte_size(&self) -> usize {
        self.coordinates_type().byte_width() * self.dimension_count()
    }

    /// The scalar kind shared by all coordinates.
    pub fn coordinates_type(&self) -> ScalarType {
        self.coordinates().scalar_type()
    }

    /// The index of the user attribute with the smallest cell.
    ///
    /// If every attribute is variable-length, the attribute with the narrowest scalar kind is
    /// chosen instead. Ties go to the first attribute in declaration order.
    pub fn smallest_attribute(&self) -> usize {
        let attributes = self.attributes();
        attributes
            .iter()
            .enumerate()
            .filter_map(|(idx, attribute)| attribute.cell_size().fixed().map(|size| (size, idx)))
            .min()
            .or_else(|| {
                attributes
                    .iter()
                    .enumerate()
                    .map(|(idx, attribute)| (attribute.scalar_type().byte_width(), idx))
                    .min()
            })
            .map(|(_, idx)| idx)
            .unwrap_or(0)
    }

    /// The index of the user attribute called `name`.
    pub fn attribute_index_by_name(&self, name: &str) -> TesseraResult<usize> {
        self.attributes()
            .iter()
            .position(|attribute| attribute.name().as_ref() == name)
            .ok_or_else(|| tessera_err!(NotFound: "array {} has no attribute {name}", self.name))
    }

    /// Resolves `names` to attribute indices, returning them sorted together with every other
    /// index (the coordinates included).
    pub fn partition_attributes<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> TesseraResult<(Vec<usize>, Vec<usize>)> {
        let selected = names
            .into_iter()
            .map(|name| self.attribute_index_by_name(name))
            .collect::<TesseraResult<BTreeSet<usize>>>()?;
        let remaining = self
            .attribute_indices()
            .filter(|idx| !selected.contains(idx))
            .collect();
        Ok((selected.into_iter().collect(), remaining))
    }

    /// The number of dimensions.
    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// The dimensions in declaration order.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// The domain of every dimension, in dimension order.
    pub fn domains(&self) -> impl Iterator<Item = Domain> + '_ {
        self.dimensions.iter().map(Dimension::domain)
    }

    /// The index of the dimension called `name`.
    pub fn dimension_index_by_name(&self, name: &str) -> TesseraResult<usize> {
        self.dimensions
            .iter()
            .position(|dimension| dimension.name().as_ref() == name)
            .ok_or_else(|| tessera_err!(NotFound: "array {} has no dimension {name}", self.name))
    }

    /// The order of cells within a tile.
    pub fn cell_order(&self) -> CellOrder {
        self.cell_order
    }

    /// The order of tiles within the array, [`TileOrder::None`] for irregular tiles.
    pub fn tile_order(&self) -> TileOrder {
        match &self.tiling {
            Tiling::Regular(regular) => regular.order(),
            Tiling::Irregular => TileOrder::None,
        }
    }

    /// The tiling of the array.
    pub fn tiling(&self) -> &Tiling {
        &self.tiling
    }

    /// The per-dimension tile extents, empty for irregular tiles.
    pub fn tile_extents(&self) -> &[f64] {
        match &self.tiling {
            Tiling::Regular(regular) => regular.extents(),
            Tiling::Irregular => &[],
        }
    }

    /// Whether the domain is partitioned into fixed-extent tiles.
    pub fn has_regular_tiles(&self) -> bool {
        matches!(self.tiling, Tiling::Regular(_))
    }

    /// Whether tiles are formed by cell count rather than extents.
    pub fn has_irregular_tiles(&self) -> bool {
        matches!(self.tiling, Tiling::Irregular)
    }

    /// The target number of cells per tile.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// The number of fragments written between consolidations.
    pub fn consolidation_step(&self) -> u32 {
        self.consolidation_step
    }

    /// The order of the Hilbert curve used to order cells.
    ///
    /// Construction rejects schemas where this times the dimension count exceeds 63 bits, so
    /// every in-domain cell has a Hilbert rank.
    pub fn hilbert_cell_bits(&self) -> u32 {
        self.hilbert_cell_bits
    }
}
