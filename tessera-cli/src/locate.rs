use std::error::Error;
use std::fmt::{Display, Formatter};

use anyhow::Context;
use tessera_schema::{ArraySchema, Coordinate, match_each_coordinate_type};

/// Where a cell sits in an array.
#[derive(Debug, PartialEq, Eq)]
pub struct Location {
    hilbert_cell_id: i64,
    tile_id: Option<i64>,
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Hilbert cell id: {}", self.hilbert_cell_id)?;
        match self.tile_id {
            Some(tile_id) => write!(f, "Tile id: {tile_id}"),
            None => write!(f, "Tile id: none, the array has irregular tiles"),
        }
    }
}

/// Parses `coordinates` as the schema's coordinate type and locates the cell.
pub fn exec_locate(schema: &ArraySchema, coordinates: &[String]) -> anyhow::Result<Location> {
    match_each_coordinate_type!(schema.coordinates_type(), |$T| {
        let coords = parse::<$T>(coordinates)?;
        locate(schema, &coords)
    })
}

fn parse<T>(coordinates: &[String]) -> anyhow::Result<Vec<T>>
where
    T: Coordinate,
    T::Err: Error + Send + Sync + 'static,
{
    coordinates
        .iter()
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("parsing coordinate {raw} as {}", T::SCALAR_TYPE))
        })
        .collect()
}

fn locate<T: Coordinate>(schema: &ArraySchema, coords: &[T]) -> anyhow::Result<Location> {
    let hilbert_cell_id = schema.cell_id_hilbert(coords)?;
    let tile_id = if schema.has_regular_tiles() {
        Some(schema.tile_id(coords)?)
    } else {
        None
    };
    Ok(Location {
        hilbert_cell_id,
        tile_id,
    })
}

#[cfg(test)]
mod test {
    use tessera_schema::{
        ArraySchemaBuilder, Attribute, CellOrder, Dimension, ScalarType, TileOrder,
    };

    use crate::locate::{Location, exec_locate};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn regular_tiles() {
        let schema = ArraySchemaBuilder::new("grid")
            .with_attribute(Attribute::scalar("a", ScalarType::Int32))
            .with_dimensions([
                Dimension::new("x", (0.0, 15.0)),
                Dimension::new("y", (0.0, 11.0)),
            ])
            .with_regular_tiles(TileOrder::RowMajor, vec![4.0, 4.0])
            .with_cell_order(CellOrder::Hilbert)
            .build()
            .unwrap();
        let location = exec_locate(&schema, &args(&["5", "9"])).unwrap();
        // Cell (1, 1) of tile (1, 2); the second-order curve ranks it 2.
        assert_eq!(
            location,
            Location {
                hilbert_cell_id: 2,
                tile_id: Some(9),
            }
        );
        assert_eq!(location.to_string(), "Hilbert cell id: 2\nTile id: 9");
    }

    #[test]
    fn irregular_float_coordinates() {
        let schema = ArraySchemaBuilder::new("points")
            .with_attribute(Attribute::scalar("a", ScalarType::Int32))
            .with_dimensions([Dimension::new("x", (-1.0, 1.0))])
            .with_coordinate_type(ScalarType::Float32)
            .build()
            .unwrap();
        let location = exec_locate(&schema, &args(&["-0.5"])).unwrap();
        assert_eq!(location.tile_id, None);
        assert!(exec_locate(&schema, &args(&["abc"])).is_err());
        assert!(exec_locate(&schema, &args(&["3"])).is_err());
        assert!(exec_locate(&schema, &args(&["0", "0"])).is_err());
    }
}
