mod create;
mod derive;
mod join;
mod locate;
mod logging;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::info;
use tessera_schema::ArraySchema;

use crate::derive::CellOrderArg;
use crate::logging::init_logging;

#[derive(clap::Parser)]
#[command(version, about)]
struct Cli {
    /// Log schema operations; repeat for more detail.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Print a summary of a serialized schema.
    Show { file: PathBuf },
    /// Build a schema from a JSON description and serialize it.
    Create {
        /// JSON file holding the schema description
        description: PathBuf,
        out: PathBuf,
    },
    /// Keep a subset of a schema's attributes.
    Project {
        file: PathBuf,
        out: PathBuf,
        #[arg(long)]
        name: String,
        /// Comma separated attribute names, in the order to keep them
        #[arg(long, value_delimiter = ',', required = true)]
        attributes: Vec<String>,
    },
    /// Swap the domains of a two-dimensional schema.
    Transpose {
        file: PathBuf,
        out: PathBuf,
        #[arg(long)]
        name: String,
    },
    /// Change the cell order of a schema.
    Reorder {
        file: PathBuf,
        out: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        cell_order: CellOrderArg,
    },
    /// Change the tile capacity of a schema.
    Capacity {
        file: PathBuf,
        out: PathBuf,
        capacity: u64,
    },
    /// Check whether two schemas can be joined.
    JoinCheck { left: PathBuf, right: PathBuf },
    /// Write the schema of the join of two schemas.
    Join {
        left: PathBuf,
        right: PathBuf,
        out: PathBuf,
        #[arg(long)]
        name: String,
    },
    /// Print the Hilbert cell id and tile id of a cell.
    Locate {
        file: PathBuf,
        #[arg(required = true, allow_hyphen_values = true)]
        coordinates: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Show { file } => println!("{}", read_schema(&file)?),
        Commands::Create { description, out } => {
            write_schema(&create::exec_create(&description)?, &out)?
        }
        Commands::Project {
            file,
            out,
            name,
            attributes,
        } => write_schema(
            &derive::exec_project(&read_schema(&file)?, name, &attributes)?,
            &out,
        )?,
        Commands::Transpose { file, out, name } => {
            write_schema(&read_schema(&file)?.transpose(name)?, &out)?
        }
        Commands::Reorder {
            file,
            out,
            name,
            cell_order,
        } => write_schema(
            &read_schema(&file)?.clone_with_cell_order(name, cell_order.into())?,
            &out,
        )?,
        Commands::Capacity {
            file,
            out,
            capacity,
        } => write_schema(&read_schema(&file)?.clone_with_capacity(capacity)?, &out)?,
        Commands::JoinCheck { left, right } => {
            println!(
                "{}",
                join::exec_join_check(&read_schema(&left)?, &read_schema(&right)?)
            )
        }
        Commands::Join {
            left,
            right,
            out,
            name,
        } => write_schema(
            &read_schema(&left)?.join_result_schema(&read_schema(&right)?, name)?,
            &out,
        )?,
        Commands::Locate { file, coordinates } => {
            println!("{}", locate::exec_locate(&read_schema(&file)?, &coordinates)?)
        }
    };

    Ok(())
}

/// Reads and decodes a serialized schema.
pub(crate) fn read_schema(path: &Path) -> anyhow::Result<ArraySchema> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading schema {}", path.display()))?;
    ArraySchema::deserialize(&bytes).with_context(|| format!("decoding schema {}", path.display()))
}

/// Serializes a schema to `path`, replacing any existing file.
pub(crate) fn write_schema(schema: &ArraySchema, path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, schema.serialize())
        .with_context(|| format!("writing schema {}", path.display()))?;
    info!(
        "wrote schema {} ({} bytes) to {}",
        schema.name(),
        schema.serialized_size(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;
    use tessera_schema::{ArraySchemaBuilder, Attribute, Dimension, ScalarType};

    use crate::{Cli, read_schema, write_schema};

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.tsr");
        let schema = ArraySchemaBuilder::new("s")
            .with_attribute(Attribute::scalar("a", ScalarType::Int32))
            .with_dimension(Dimension::new("x", (0.0, 9.0)))
            .build()
            .unwrap();
        write_schema(&schema, &path).unwrap();
        assert_eq!(read_schema(&path).unwrap(), schema);
    }

    #[test]
    fn missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.tsr");
        assert!(read_schema(&missing).is_err());

        let corrupt = dir.path().join("corrupt.tsr");
        std::fs::write(&corrupt, [1, 2, 3]).unwrap();
        let err = read_schema(&corrupt).unwrap_err();
        assert!(format!("{err:#}").contains("corrupt schema"));
    }
}
