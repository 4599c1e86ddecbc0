//! Command execution implementations

use super::Commands;
use super::{codecs, convert, info, inspect};

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Inspect { file, json, strict } => inspect::execute(file, *json, *strict),
            Commands::Info { file, json } => info::execute(file, *json),
            Commands::Convert {
                source,
                destination,
                bits,
                float,
                quiet,
            } => convert::execute(source, destination, bits.parse()?, *float, *quiet),
            Commands::Codecs { json } => codecs::execute(*json),
        }
    }
}
