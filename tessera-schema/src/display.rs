use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::{ArraySchema, Tiling};

impl Display for ArraySchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Array name: {}", self.name())?;
        writeln!(f, "Cell order: {}", self.cell_order())?;
        match self.tiling() {
            Tiling::Regular(tiling) => {
                writeln!(f, "Tile order: {}", tiling.order())?;
                writeln!(
                    f,
                    "Tile extents: [{}]",
                    tiling.extents().iter().format(", ")
                )?;
            }
            Tiling::Irregular => writeln!(f, "Tiles: irregular")?,
        }
        writeln!(f, "Capacity: {}", self.capacity())?;
        writeln!(f, "Consolidation step: {}", self.consolidation_step())?;

        writeln!(f, "Attributes ({}):", self.attribute_count())?;
        for (attribute, size) in self
            .attributes()
            .iter()
            .zip(self.attribute_indices().filter_map(|i| self.cell_byte_size(i).ok()))
        {
            writeln!(
                f,
                "  {attribute} compression={} cell_size={size}",
                attribute.compression()
            )?;
        }

        writeln!(f, "Dimensions ({}):", self.dimension_count())?;
        for dimension in self.dimensions() {
            writeln!(f, "  {dimension}")?;
        }

        let coordinates = self.coordinates();
        writeln!(
            f,
            "Coordinates: {} compression={} cell_size={}",
            coordinates.scalar_type(),
            coordinates.compression(),
            self.coordinates_byte_size()
        )?;
        write!(f, "Cell size: {}", self.total_cell_byte_size())
    }
}
