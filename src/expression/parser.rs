//! Pest-backed parser for factory declarations.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use super::FunctionSignature;

#[derive(Parser)]
#[grammar = "expression/expression.pest"]
struct ExpressionParser;

/// Errors that can occur while parsing a factory declaration.
///
/// Every variant carries the verbatim input so a failure can be traced back
/// to the factory that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid expression parsing. Cannot recognize function name in expression '{expression}'")]
    UnrecognizedName { expression: String },

    #[error("Invalid expression parsing. Malformed parameter list of '{name}' in expression '{expression}'")]
    MalformedParameters { name: String, expression: String },

    #[error("Invalid expression parsing. Unsupported class heading of '{name}' in expression '{expression}'")]
    UnsupportedClassHeading { name: String, expression: String },

    #[error("Invalid expression parsing. Illegal parameter name '{parameter}' in expression '{expression}'")]
    InvalidParameter {
        parameter: String,
        expression: String,
    },
}

impl ParseError {
    /// The original input that failed to parse.
    pub fn expression(&self) -> &str {
        match self {
            ParseError::UnrecognizedName { expression }
            | ParseError::MalformedParameters { expression, .. }
            | ParseError::UnsupportedClassHeading { expression, .. }
            | ParseError::InvalidParameter { expression, .. } => expression,
        }
    }
}

/// Parses a factory declaration into its name and ordered parameter names.
///
/// The text is analysed lexically and never evaluated. Recognized shapes are
/// function declarations (plain, `async` and generator), `const`/`let`/`var`
/// bindings of function or arrow expressions, method shorthand
/// (`name(a, b)`), and classes, whose constructor supplies the parameters.
///
/// # Example
///
/// ```
/// use wiring::expression::parse_expression;
///
/// let signature = parse_expression("function greet(name, age) {}").unwrap();
/// assert_eq!(signature.name, "greet");
/// assert_eq!(signature.parameter_names, vec!["name", "age"]);
///
/// let err = parse_expression("arg = 0").unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "Invalid expression parsing. Cannot recognize function name in expression 'arg = 0'"
/// );
/// ```
pub fn parse_expression(source: &str) -> Result<FunctionSignature, ParseError> {
    let declaration = match ExpressionParser::parse(Rule::declaration, source) {
        Ok(mut pairs) => pairs.next(),
        Err(_) => return Err(classify_failure(source)),
    };

    let mut name = None;
    let mut parameter_names = Vec::new();

    for pair in declaration.into_iter().flat_map(|pair| pair.into_inner().flatten()) {
        match pair.as_rule() {
            // The first name is the declared one; class bodies never yield another.
            Rule::name if name.is_none() => name = Some(pair.as_str().to_string()),
            Rule::parameter | Rule::bare_parameter => {
                if let Some(parameter) = validate_parameter(pair, source)? {
                    parameter_names.push(parameter);
                }
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::UnrecognizedName {
        expression: source.to_string(),
    })?;

    tracing::debug!(
        "Parsed factory '{}' with parameters {:?}",
        name,
        parameter_names
    );

    Ok(FunctionSignature {
        name,
        parameter_names,
    })
}

/// Decides which error a failed declaration parse should report.
///
/// If a name and the opening of a parameter list are still recognizable the
/// list itself is broken. A class whose heading up to the body cannot be read
/// is reported as such. Otherwise the name could not be found.
fn classify_failure(source: &str) -> ParseError {
    let expression = source.to_string();

    if let Some(name) = find_name(Rule::declaration_head, source) {
        return ParseError::MalformedParameters { name, expression };
    }
    match find_name(Rule::class_head, source) {
        Some(name) => ParseError::UnsupportedClassHeading { name, expression },
        None => ParseError::UnrecognizedName { expression },
    }
}

fn find_name(rule: Rule, source: &str) -> Option<String> {
    ExpressionParser::parse(rule, source)
        .ok()
        .and_then(|pairs| pairs.flatten().find(|pair| pair.as_rule() == Rule::name))
        .map(|pair| pair.as_str().to_string())
}

/// Trims a raw parameter fragment and checks it is a legal identifier.
///
/// Returns `Ok(None)` for empty fragments so trailing separators are tolerated.
fn validate_parameter(pair: Pair<Rule>, source: &str) -> Result<Option<String>, ParseError> {
    let fragment = pair.as_str().trim();
    if fragment.is_empty() {
        return Ok(None);
    }

    ExpressionParser::parse(Rule::parameter_name, fragment)
        .map(|_| Some(fragment.to_string()))
        .map_err(|_| ParseError::InvalidParameter {
            parameter: fragment.to_string(),
            expression: source.to_string(),
        })
}
