//! Describe subcommand - classify the dependencies of a declaration.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use crate::config::Config;
use crate::error::AppError;
use crate::expression::{parse_expression, FunctionSignature};
use crate::injection::DependencyDescriptor;
use crate::registry::DependencyRegistry;
use crate::resolver::Resolver;

/// Classify the dependencies of a factory declaration.
#[derive(Parser)]
pub struct DescribeCommand {
    /// Declaration text, e.g. "function service(logger, db) {}".
    pub expression: Option<String>,

    /// Read the declaration from a file instead.
    #[arg(short, long, conflicts_with = "expression")]
    pub file: Option<PathBuf>,

    /// Configuration file to use instead of the layered user/project lookup.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Description {
    #[serde(flatten)]
    signature: FunctionSignature,
    dependencies: Vec<DependencyDescriptor>,
}

impl DescribeCommand {
    /// Run the describe command.
    pub fn run(self) -> color_eyre::Result<()> {
        let source = super::read_expression(self.expression, self.file.as_deref())?;
        let config = match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
        .map_err(AppError::from)?;
        tracing::debug!("Loaded {} injection hints", config.injection.len());

        let description = describe(&source, &config)?;
        println!("{}", serde_json::to_string_pretty(&description)?);
        Ok(())
    }
}

fn describe(source: &str, config: &Config) -> Result<Description, AppError> {
    let signature = parse_expression(source)?;
    // No providers yet: classification only needs the configured hints.
    let registry = DependencyRegistry::new();
    let dependencies = Resolver::with_config(&registry, config).describe(&signature);

    Ok(Description {
        signature,
        dependencies,
    })
}
