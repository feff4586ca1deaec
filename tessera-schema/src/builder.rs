use std::sync::Arc;

use tessera_error::TesseraResult;

use crate::schema::SchemaParts;
use crate::{
    ArraySchema, Attribute, CellOrder, Compression, Dimension, ScalarType, TileOrder,
};

const DEFAULT_CAPACITY: u64 = 10_000;
const DEFAULT_CONSOLIDATION_STEP: u32 = 1;
const DEFAULT_COORDINATE_TYPE: ScalarType = ScalarType::Int64;

/// A struct for configuring an [`ArraySchema`] field by field.
///
/// Unless configured otherwise, a schema has irregular tiles, row-major cells, 64-bit integer
/// coordinates, a capacity of 10 000 cells and a consolidation step of 1. With the `serde`
/// feature, a builder can be read from a description holding the same fields, where every
/// field but the name is optional.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArraySchemaBuilder {
    name: Arc<str>,
    #[cfg_attr(feature = "serde", serde(default))]
    attributes: Vec<Attribute>,
    #[cfg_attr(feature = "serde", serde(default))]
    dimensions: Vec<Dimension>,
    #[cfg_attr(feature = "serde", serde(default = "default_coordinate_type"))]
    coordinate_type: ScalarType,
    #[cfg_attr(feature = "serde", serde(default))]
    coordinate_compression: Compression,
    #[cfg_attr(feature = "serde", serde(default))]
    cell_order: CellOrder,
    #[cfg_attr(feature = "serde", serde(default))]
    tile_order: TileOrder,
    #[cfg_attr(feature = "serde", serde(default))]
    tile_extents: Vec<f64>,
    #[cfg_attr(feature = "serde", serde(default = "default_capacity"))]
    capacity: u64,
    #[cfg_attr(feature = "serde", serde(default = "default_consolidation_step"))]
    consolidation_step: u32,
}

#[cfg(feature = "serde")]
fn default_coordinate_type() -> ScalarType {
    DEFAULT_COORDINATE_TYPE
}

#[cfg(feature = "serde")]
fn default_capacity() -> u64 {
    DEFAULT_CAPACITY
}

#[cfg(feature = "serde")]
fn default_consolidation_step() -> u32 {
    DEFAULT_CONSOLIDATION_STEP
}

impl ArraySchemaBuilder {
    /// Starts a schema for the array called `name`.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            dimensions: Vec::new(),
            coordinate_type: DEFAULT_COORDINATE_TYPE,
            coordinate_compression: Compression::None,
            cell_order: CellOrder::default(),
            tile_order: TileOrder::None,
            tile_extents: Vec::new(),
            capacity: DEFAULT_CAPACITY,
            consolidation_step: DEFAULT_CONSOLIDATION_STEP,
        }
    }

    /// Appends an attribute.
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Appends several attributes, in order.
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Appends a dimension.
    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    /// Appends several dimensions, in order.
    pub fn with_dimensions(mut self, dimensions: impl IntoIterator<Item = Dimension>) -> Self {
        self.dimensions.extend(dimensions);
        self
    }

    /// Sets the scalar type shared by every coordinate.
    pub fn with_coordinate_type(mut self, coordinate_type: ScalarType) -> Self {
        self.coordinate_type = coordinate_type;
        self
    }

    /// Sets the codec of the coordinates.
    pub fn with_coordinate_compression(mut self, compression: Compression) -> Self {
        self.coordinate_compression = compression;
        self
    }

    /// Sets the order of cells within a tile.
    pub fn with_cell_order(mut self, cell_order: CellOrder) -> Self {
        self.cell_order = cell_order;
        self
    }

    /// Partitions the domain into tiles of the given per-dimension extents, numbered in
    /// `tile_order`.
    pub fn with_regular_tiles(mut self, tile_order: TileOrder, extents: Vec<f64>) -> Self {
        self.tile_order = tile_order;
        self.tile_extents = extents;
        self
    }

    /// Forms tiles from `capacity` consecutive cells instead of fixed extents.
    pub fn with_irregular_tiles(mut self) -> Self {
        self.tile_order = TileOrder::None;
        self.tile_extents.clear();
        self
    }

    /// Sets the target number of cells per tile.
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the number of fragments written between consolidations.
    pub fn with_consolidation_step(mut self, consolidation_step: u32) -> Self {
        self.consolidation_step = consolidation_step;
        self
    }

    /// Validates the configuration and builds the schema.
    ///
    /// Fails with [`InvalidSchema`](tessera_error::TesseraError::InvalidSchema) exactly when
    /// [`ArraySchema::try_new_irregular`] or [`ArraySchema::try_new_regular`] would.
    pub fn build(self) -> TesseraResult<ArraySchema> {
        SchemaParts {
            name: self.name,
            attributes: self.attributes,
            coordinate_type: self.coordinate_type,
            coordinate_compression: self.coordinate_compression,
            dimensions: self.dimensions,
            cell_order: self.cell_order,
            tile_order: self.tile_order,
            tile_extents: self.tile_extents,
            capacity: self.capacity,
            consolidation_step: self.consolidation_step,
        }
        .build()
    }
}

impl From<&ArraySchema> for ArraySchemaBuilder {
    fn from(schema: &ArraySchema) -> Self {
        let parts = schema.to_parts();
        Self {
            name: parts.name,
            attributes: parts.attributes,
            dimensions: parts.dimensions,
            coordinate_type: parts.coordinate_type,
            coordinate_compression: parts.coordinate_compression,
            cell_order: parts.cell_order,
            tile_order: parts.tile_order,
            tile_extents: parts.tile_extents,
            capacity: parts.capacity,
            consolidation_step: parts.consolidation_step,
        }
    }
}
