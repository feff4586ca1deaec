use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use tessera_schema::{ArraySchema, ArraySchemaBuilder};

/// Builds a schema from the JSON description at `path`.
pub fn exec_create(path: &Path) -> anyhow::Result<ArraySchema> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let builder: ArraySchemaBuilder = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing schema description {}", path.display()))?;
    Ok(builder.build()?)
}
