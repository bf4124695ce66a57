//! CLI module for wiring.
//!
//! Subcommands:
//! - `parse`: Print the signature of a factory declaration
//! - `describe`: Print how each dependency of a declaration would be injected

mod describe;
mod parse;

use clap::{Parser, Subcommand};

pub use describe::DescribeCommand;
pub use parse::ParseCommand;

/// wiring - signature-driven dependency injection
#[derive(Parser)]
#[command(name = "wiring")]
#[command(about = "Parse factory declarations and inspect their dependency wiring")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a factory declaration and print its signature as JSON
    Parse(ParseCommand),

    /// Classify each dependency of a factory declaration using the loaded configuration
    Describe(DescribeCommand),
}

impl App {
    /// Run the CLI application.
    pub fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Parse(cmd) => cmd.run(),
            Command::Describe(cmd) => cmd.run(),
        }
    }
}

/// Reads the declaration from the positional argument or `--file`.
fn read_expression(
    expression: Option<String>,
    file: Option<&std::path::Path>,
) -> color_eyre::Result<String> {
    match (expression, file) {
        (Some(expression), _) => Ok(expression),
        (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
        (None, None) => Err(color_eyre::eyre::eyre!(
            "Provide a declaration or --file <PATH>"
        )),
    }
}
