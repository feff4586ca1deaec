use tessera_schema::{ArraySchema, CellOrder};

/// The cell orders selectable on the command line.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CellOrderArg {
    RowMajor,
    ColumnMajor,
    Hilbert,
    None,
}

impl From<CellOrderArg> for CellOrder {
    fn from(value: CellOrderArg) -> Self {
        match value {
            CellOrderArg::RowMajor => CellOrder::RowMajor,
            CellOrderArg::ColumnMajor => CellOrder::ColumnMajor,
            CellOrderArg::Hilbert => CellOrder::Hilbert,
            CellOrderArg::None => CellOrder::None,
        }
    }
}

/// Projects `schema` onto the named attributes, kept in the given order.
pub fn exec_project(
    schema: &ArraySchema,
    name: String,
    attributes: &[String],
) -> anyhow::Result<ArraySchema> {
    let indices = attributes
        .iter()
        .map(|attribute| schema.attribute_index_by_name(attribute))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(schema.clone_with_attributes(name, &indices)?)
}

#[cfg(test)]
mod test {
    use tessera_schema::{ArraySchemaBuilder, Attribute, Dimension, ScalarType};

    use crate::derive::exec_project;

    #[test]
    fn project_by_name() {
        let schema = ArraySchemaBuilder::new("s")
            .with_attributes([
                Attribute::scalar("a", ScalarType::Int32),
                Attribute::scalar("b", ScalarType::Float64),
                Attribute::var("c", ScalarType::Char),
            ])
            .with_dimension(Dimension::new("x", (0.0, 9.0)))
            .build()
            .unwrap();

        let projected =
            exec_project(&schema, "p".to_string(), &["c".to_string(), "a".to_string()]).unwrap();
        let names: Vec<&str> = projected.attributes().iter().map(|a| a.name().as_ref()).collect();
        assert_eq!(names, vec!["c", "a"]);

        let err = exec_project(&schema, "p".to_string(), &["z".to_string()]).unwrap_err();
        assert!(err.to_string().contains("no attribute z"));
    }
}
