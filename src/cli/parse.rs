//! Parse subcommand - print the signature of a declaration.

use std::path::PathBuf;

use clap::Parser;

use crate::expression::parse_expression;

/// Parse a factory declaration.
#[derive(Parser)]
pub struct ParseCommand {
    /// Declaration text, e.g. "function service(logger, db) {}".
    pub expression: Option<String>,

    /// Read the declaration from a file instead.
    #[arg(short, long, conflicts_with = "expression")]
    pub file: Option<PathBuf>,
}

impl ParseCommand {
    /// Run the parse command.
    pub fn run(self) -> color_eyre::Result<()> {
        let source = super::read_expression(self.expression, self.file.as_deref())?;
        let signature = parse_expression(&source)?;
        println!("{}", serde_json::to_string_pretty(&signature)?);
        Ok(())
    }
}
