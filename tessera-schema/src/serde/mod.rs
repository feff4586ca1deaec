//! The binary representation of an [`ArraySchema`].
//!
//! Fields are little-endian and written back to back without padding:
//!
//! | field                 | encoding                                         |
//! |-----------------------|--------------------------------------------------|
//! | array name            | `i32` length, UTF-8 bytes                        |
//! | tile order            | `u8` tag                                         |
//! | cell order            | `u8` tag                                         |
//! | capacity              | `i64`                                            |
//! | consolidation step    | `i32`                                            |
//! | attribute names       | `i32` count, then `i32` length and bytes each    |
//! | dimension names       | `i32` count, then `i32` length and bytes each    |
//! | domains               | `f64` low, `f64` high per dimension              |
//! | tile extents          | `i32` count (zero when irregular), `f64` each    |
//! | scalar types          | `u8` tag per attribute, coordinates last         |
//! | values per cell       | `i32` per attribute, `i32::MAX` for variable     |
//! | compression           | `u8` tag per attribute, coordinates last         |

mod codec;

use bytes::Bytes;
use log::{debug, warn};
use tessera_error::{TesseraError, TesseraResult, tessera_err};

use crate::schema::SchemaParts;
use crate::serde::codec::{SchemaReader, SchemaWriter};
use crate::{
    ArraySchema, Attribute, CellOrder, Compression, Dimension, Domain, ScalarType, TileOrder,
    ValuesPerCell,
};

const LEN_SIZE: usize = size_of::<i32>();
const TAG_SIZE: usize = size_of::<u8>();

impl ArraySchema {
    /// The exact number of bytes [`ArraySchema::serialize`] produces.
    pub fn serialized_size(&self) -> usize {
        let attribute_count = self.attribute_count();
        let dimension_count = self.dimension_count();

        LEN_SIZE
            + self.name().len()
            + 2 * TAG_SIZE
            + size_of::<i64>()
            + size_of::<i32>()
            + names_size(self.attributes().iter().map(|a| a.name().len()))
            + names_size(self.dimensions().iter().map(|d| d.name().len()))
            + 2 * size_of::<f64>() * dimension_count
            + LEN_SIZE
            + size_of::<f64>() * self.tile_extents().len()
            + TAG_SIZE * (attribute_count + 1)
            + size_of::<i32>() * attribute_count
            + TAG_SIZE * (attribute_count + 1)
    }

    /// Encodes the schema into its binary representation.
    pub fn serialize(&self) -> Bytes {
        let mut writer = SchemaWriter::with_capacity(self.serialized_size());

        writer.put_str(self.name());
        writer.put_tag(self.tile_order());
        writer.put_tag(self.cell_order());
        writer.put_i64(i64::try_from(self.capacity()).unwrap_or(i64::MAX));
        writer.put_i32(i32::try_from(self.consolidation_step()).unwrap_or(i32::MAX));

        writer.put_len(self.attribute_count());
        for attribute in self.attributes() {
            writer.put_str(attribute.name());
        }
        writer.put_len(self.dimension_count());
        for dimension in self.dimensions() {
            writer.put_str(dimension.name());
        }
        for domain in self.domains() {
            writer.put_f64(domain.low());
            writer.put_f64(domain.high());
        }

        writer.put_len(self.tile_extents().len());
        for extent in self.tile_extents() {
            writer.put_f64(*extent);
        }

        for attribute in self.attributes().iter().chain([self.coordinates()]) {
            writer.put_tag(attribute.scalar_type());
        }
        for attribute in self.attributes() {
            writer.put_i32(match attribute.values_per_cell() {
                ValuesPerCell::Fixed(n) => i32::try_from(n).unwrap_or(ValuesPerCell::VAR_TAG),
                ValuesPerCell::Var => ValuesPerCell::VAR_TAG,
            });
        }
        for attribute in self.attributes().iter().chain([self.coordinates()]) {
            writer.put_tag(attribute.compression());
        }

        debug_assert_eq!(writer.len(), self.serialized_size());
        writer.finish()
    }

    /// Decodes a schema from its binary representation.
    ///
    /// The decoded fields go through the same validation and derivation as construction. A
    /// truncated buffer, an unknown tag, trailing bytes or a decoded schema violating any
    /// schema invariant fail with [`CorruptSchema`](TesseraError::CorruptSchema).
    pub fn deserialize(bytes: &[u8]) -> TesseraResult<Self> {
        let schema = decode(bytes).and_then(|parts| {
            parts.build().map_err(|err| match err {
                TesseraError::InvalidSchema(msg, _) => tessera_err!(CorruptSchema: "{msg}"),
                other => other,
            })
        });

        match schema {
            Ok(schema) => {
                debug!(
                    "decoded schema {} from {} bytes",
                    schema.name(),
                    bytes.len()
                );
                Ok(schema)
            }
            Err(err) => {
                warn!("rejected serialized schema of {} bytes: {err}", bytes.len());
                Err(err)
            }
        }
    }
}

/// A count followed by length-prefixed names.
fn names_size(lens: impl Iterator<Item = usize>) -> usize {
    LEN_SIZE + lens.map(|len| LEN_SIZE + len).sum::<usize>()
}

fn decode(bytes: &[u8]) -> TesseraResult<SchemaParts> {
    let mut reader = SchemaReader::new(bytes);

    let name = reader.get_str("array name")?;
    let tile_order = decode_tag::<TileOrder>(reader.get_tag("tile order")?, "tile order")?;
    let cell_order = decode_tag::<CellOrder>(reader.get_tag("cell order")?, "cell order")?;
    let capacity = reader.get_i64("capacity")?;
    let capacity = u64::try_from(capacity)
        .map_err(|_| tessera_err!(CorruptSchema: "negative capacity {capacity}"))?;
    let consolidation_step = reader.get_i32("consolidation step")?;
    let consolidation_step = u32::try_from(consolidation_step).map_err(
        |_| tessera_err!(CorruptSchema: "negative consolidation step {consolidation_step}"),
    )?;

    // Counts come from untrusted input, so vectors grow with what is actually read.
    let attribute_count = reader.get_len("attribute count")?;
    let mut attribute_names = Vec::new();
    for _ in 0..attribute_count {
        attribute_names.push(reader.get_str("attribute name")?);
    }

    let dimension_count = reader.get_len("dimension count")?;
    let mut dimension_names = Vec::new();
    for _ in 0..dimension_count {
        dimension_names.push(reader.get_str("dimension name")?);
    }
    let mut dimensions = Vec::new();
    for name in dimension_names {
        let low = reader.get_f64("domain")?;
        let high = reader.get_f64("domain")?;
        dimensions.push(Dimension::new(name, Domain::new(low, high)));
    }

    let extent_count = reader.get_len("tile extent count")?;
    let mut tile_extents = Vec::new();
    for _ in 0..extent_count {
        tile_extents.push(reader.get_f64("tile extent")?);
    }

    let mut scalar_types = Vec::new();
    for _ in 0..=attribute_count {
        scalar_types.push(decode_tag::<ScalarType>(
            reader.get_tag("scalar type")?,
            "scalar type",
        )?);
    }
    let mut values_per_cell = Vec::new();
    for _ in 0..attribute_count {
        values_per_cell.push(decode_values_per_cell(reader.get_i32("values per cell")?)?);
    }
    let mut compressions = Vec::new();
    for _ in 0..=attribute_count {
        compressions.push(decode_tag::<Compression>(
            reader.get_tag("compression")?,
            "compression",
        )?);
    }
    reader.finish()?;

    // Both lists hold one trailing entry for the coordinates.
    let coordinate_type = scalar_types[attribute_count];
    let coordinate_compression = compressions[attribute_count];
    let attributes = attribute_names
        .into_iter()
        .zip(scalar_types)
        .zip(values_per_cell)
        .zip(compressions)
        .map(|(((name, scalar_type), values_per_cell), compression)| {
            Attribute::new(name, scalar_type, values_per_cell).with_compression(compression)
        })
        .collect();

    Ok(SchemaParts {
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
    })
}

fn decode_tag<T: TryFrom<u8>>(tag: u8, field: &str) -> TesseraResult<T> {
    T::try_from(tag).map_err(|_| tessera_err!(CorruptSchema: "unknown {field} tag {tag}"))
}

fn decode_values_per_cell(value: i32) -> TesseraResult<ValuesPerCell> {
    if value == ValuesPerCell::VAR_TAG {
        return Ok(ValuesPerCell::Var);
    }
    u32::try_from(value)
        .map(ValuesPerCell::Fixed)
        .map_err(|_| tessera_err!(CorruptSchema: "negative values per cell {value}"))
}

#[cfg(test)]
mod test {
    use rstest::{fixture, rstest};
    use tessera_error::TesseraError;

    use crate::{
        ArraySchema, Attribute, CellOrder, Compression, Dimension, ScalarType, TileOrder,
        ValuesPerCell,
    };

    fn tiny() -> ArraySchema {
        ArraySchema::try_new_irregular(
            "s",
            vec![Attribute::scalar("a", ScalarType::Int32)],
            vec![Dimension::new("d", (0.0, 3.0))],
            ScalarType::Int64,
            CellOrder::RowMajor,
            1,
            4,
        )
        .unwrap()
    }

    #[fixture]
    fn regular() -> ArraySchema {
        ArraySchema::try_new_regular(
            "weather",
            vec![
                Attribute::scalar("temp", ScalarType::Float32).with_compression(Compression::Zip),
                Attribute::var("station", ScalarType::Char).with_compression(Compression::Lz),
                Attribute::new("wind", ScalarType::Float64, ValuesPerCell::Fixed(3)),
            ],
            vec![
                Dimension::new("lat", (-90.0, 90.0)),
                Dimension::new("lon", (-180.0, 180.0)),
            ],
            ScalarType::Float64,
            TileOrder::Hilbert,
            vec![10.0, 20.0],
            5,
            1000,
            CellOrder::ColumnMajor,
        )
        .unwrap()
    }

    #[test]
    fn layout() {
        let mut expected = Vec::new();
        expected.extend_from_slice(&1i32.to_le_bytes());
        expected.push(b's');
        expected.push(3);
        expected.push(2);
        expected.extend_from_slice(&4i64.to_le_bytes());
        expected.extend_from_slice(&1i32.to_le_bytes());
        expected.extend_from_slice(&1i32.to_le_bytes());
        expected.extend_from_slice(&1i32.to_le_bytes());
        expected.push(b'a');
        expected.extend_from_slice(&1i32.to_le_bytes());
        expected.extend_from_slice(&1i32.to_le_bytes());
        expected.push(b'd');
        expected.extend_from_slice(&0f64.to_le_bytes());
        expected.extend_from_slice(&3f64.to_le_bytes());
        expected.extend_from_slice(&0i32.to_le_bytes());
        expected.extend_from_slice(&[1, 2]);
        expected.extend_from_slice(&1i32.to_le_bytes());
        expected.extend_from_slice(&[3, 3]);

        let schema = tiny();
        let bytes = schema.serialize();
        assert_eq!(bytes.as_ref(), expected.as_slice());
        assert_eq!(schema.serialized_size(), 65);
    }

    #[rstest]
    fn var_cells_use_sentinel(regular: ArraySchema) {
        let bytes = regular.serialize();
        let values_per_cell = &bytes[bytes.len() - 4 - 3 * 4..bytes.len() - 4];
        assert_eq!(&values_per_cell[..4], &1i32.to_le_bytes());
        assert_eq!(&values_per_cell[4..8], &i32::MAX.to_le_bytes());
        assert_eq!(&values_per_cell[8..], &3i32.to_le_bytes());
        assert_eq!(&bytes[bytes.len() - 4..], &[1, 2, 3, 3]);
    }

    #[rstest]
    fn round_trip(regular: ArraySchema) {
        for schema in [tiny(), regular] {
            let bytes = schema.serialize();
            assert_eq!(bytes.len(), schema.serialized_size());
            let decoded = ArraySchema::deserialize(&bytes).unwrap();
            assert_eq!(decoded, schema);
            assert_eq!(decoded.hilbert_cell_bits(), schema.hilbert_cell_bits());
            assert_eq!(decoded.total_cell_byte_size(), schema.total_cell_byte_size());
        }
    }

    #[rstest]
    fn every_truncation_is_corrupt(regular: ArraySchema) {
        let bytes = regular.serialize();
        for len in 0..bytes.len() {
            assert!(
                matches!(
                    ArraySchema::deserialize(&bytes[..len]),
                    Err(TesseraError::CorruptSchema(..))
                ),
                "prefix of {len} bytes"
            );
        }
    }

    #[test]
    fn trailing_bytes_are_corrupt() {
        let mut bytes = tiny().serialize().to_vec();
        bytes.push(0);
        assert!(matches!(
            ArraySchema::deserialize(&bytes),
            Err(TesseraError::CorruptSchema(..))
        ));
    }

    #[rstest]
    #[case::tile_order(5, 9)]
    #[case::cell_order(6, 4)]
    #[case::attribute_type(57, 7)]
    #[case::coordinate_type(58, 0)]
    #[case::compression(63, 4)]
    fn bad_tags_are_corrupt(#[case] offset: usize, #[case] tag: u8) {
        let mut bytes = tiny().serialize().to_vec();
        bytes[offset] = tag;
        assert!(matches!(
            ArraySchema::deserialize(&bytes),
            Err(TesseraError::CorruptSchema(..))
        ));
    }

    #[rstest]
    #[case::negative_capacity(7, (-1i64).to_le_bytes().to_vec())]
    #[case::zero_capacity(7, 0i64.to_le_bytes().to_vec())]
    #[case::zero_step(15, 0i32.to_le_bytes().to_vec())]
    #[case::negative_name(0, (-1i32).to_le_bytes().to_vec())]
    #[case::zero_values_per_cell(59, 0i32.to_le_bytes().to_vec())]
    #[case::bad_domain(37, 5f64.to_le_bytes().to_vec())]
    fn invalid_fields_are_corrupt(#[case] offset: usize, #[case] patch: Vec<u8>) {
        let mut bytes = tiny().serialize().to_vec();
        bytes[offset..offset + patch.len()].copy_from_slice(&patch);
        assert!(matches!(
            ArraySchema::deserialize(&bytes),
            Err(TesseraError::CorruptSchema(..))
        ));
    }

    #[rstest]
    #[case::two_dimensions(2, 4_294_967_295.0)]
    #[case::four_dimensions(4, 65_535.0)]
    fn curves_wider_than_i64_are_corrupt(#[case] count: usize, #[case] high: f64) {
        let schema = ArraySchema::try_new_irregular(
            "cube",
            vec![Attribute::scalar("a", ScalarType::Int32)],
            (0..count)
                .map(|i| Dimension::new(format!("d{i}"), (0.0, 3.0)))
                .collect(),
            ScalarType::Int64,
            CellOrder::Hilbert,
            1,
            4,
        )
        .unwrap();
        let mut bytes = schema.serialize().to_vec();
        assert_eq!(ArraySchema::deserialize(&bytes).unwrap(), schema);

        // Every upper bound is the only 3.0 in the image.
        let (narrow, wide) = (3f64.to_le_bytes(), high.to_le_bytes());
        let mut widened = 0;
        for at in 0..=bytes.len() - 8 {
            if bytes[at..at + 8] == narrow {
                bytes[at..at + 8].copy_from_slice(&wide);
                widened += 1;
            }
        }
        assert_eq!(widened, count);
        assert!(matches!(
            ArraySchema::deserialize(&bytes),
            Err(TesseraError::CorruptSchema(..))
        ));
    }

    #[test]
    fn reserved_attribute_name_is_corrupt() {
        let schema = tiny();
        let mut bytes = schema.serialize().to_vec();
        // Replace the name "a" by "__coords", keeping every other field in place.
        let at = 4 + 1 + 1 + 1 + 8 + 4 + 4;
        bytes.splice(at..at + 5, {
            let mut name = 8i32.to_le_bytes().to_vec();
            name.extend_from_slice(b"__coords");
            name
        });
        assert!(matches!(
            ArraySchema::deserialize(&bytes),
            Err(TesseraError::CorruptSchema(..))
        ));
    }
}

#[cfg(test)]
#[cfg(feature = "serde")]
mod json_test {
    use crate::{
        ArraySchemaBuilder, Attribute, CellOrder, Compression, Dimension, ScalarType, TileOrder,
        ValuesPerCell,
    };

    #[test]
    fn descriptor_types() {
        let attribute = Attribute::var("station", ScalarType::Char).with_compression(Compression::Lz);
        let json = serde_json::to_string(&attribute).unwrap();
        assert_eq!(
            json,
            r#"{"name":"station","scalar_type":"char","values_per_cell":"var","compression":"lz"}"#
        );
        assert_eq!(serde_json::from_str::<Attribute>(&json).unwrap(), attribute);

        let fixed: Attribute = serde_json::from_str(
            r#"{"name":"wind","scalar_type":"float64","values_per_cell":{"fixed":3}}"#,
        )
        .unwrap();
        assert_eq!(
            fixed,
            Attribute::new("wind", ScalarType::Float64, ValuesPerCell::Fixed(3))
        );

        let dimension: Dimension =
            serde_json::from_str(r#"{"name":"lat","domain":{"low":-90,"high":90.5}}"#).unwrap();
        assert_eq!(dimension, Dimension::new("lat", (-90.0, 90.5)));
    }

    #[test]
    fn builder_description() {
        let schema = serde_json::from_str::<ArraySchemaBuilder>(
            r#"{
                "name": "weather",
                "attributes": [
                    {"name": "temp", "scalar_type": "float32", "values_per_cell": {"fixed": 1}}
                ],
                "dimensions": [
                    {"name": "lat", "domain": {"low": -90, "high": 90}},
                    {"name": "lon", "domain": {"low": -180, "high": 180}}
                ],
                "coordinate_type": "float64",
                "cell_order": "column-major",
                "tile_order": "hilbert",
                "tile_extents": [10, 20]
            }"#,
        )
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(schema.cell_order(), CellOrder::ColumnMajor);
        assert_eq!(schema.tile_order(), TileOrder::Hilbert);
        assert_eq!(schema.tile_extents(), &[10.0, 20.0]);
        assert_eq!(schema.capacity(), 10_000);
        assert_eq!(schema.consolidation_step(), 1);
        assert_eq!(schema.coordinates_type(), ScalarType::Float64);
    }
}
