//! Factory declaration parsing.
//!
//! Turns the textual declaration of a factory into a [`FunctionSignature`]:
//! its name plus the ordered names of the dependencies it asks for. Parameter
//! order matters because it fixes the positional order of constructor
//! injection.
//!
//! # Example
//!
//! ```
//! use wiring::expression::parse_expression;
//!
//! let signature = parse_expression("const service = (logger, db) => {}").unwrap();
//! assert_eq!(signature.name, "service");
//! assert_eq!(signature.parameter_names, vec!["logger", "db"]);
//! ```

mod parser;

use serde::Serialize;

pub use parser::{parse_expression, ParseError};

/// Name and ordered parameter names of a parsed factory declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionSignature {
    /// Declared name of the factory.
    pub name: String,
    /// Parameter names in declaration order.
    pub parameter_names: Vec<String>,
}

impl FunctionSignature {
    /// Builds a signature directly, bypassing text parsing.
    pub fn new<I, S>(name: impl Into<String>, parameter_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parameter_names: parameter_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.parameter_names.len()
    }
}

impl std::str::FromStr for FunctionSignature {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_expression(s)
    }
}
