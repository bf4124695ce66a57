//! wiring - signature-driven dependency injection.
//!
//! Factories are declared as text (`"function service(logger, db) {}"`); the
//! parameter names select which registered dependencies are injected, and
//! per-dependency metadata decides whether each arrives as a constructor
//! argument, a property assignment or a setter call.
//!
//! - [`expression`]: Parse declarations into [`FunctionSignature`]s
//! - [`injection`]: Classify and bind dependencies
//! - [`registry`]: Named providers (values, singletons, transients)
//! - [`resolver`]: Build wired instances
//! - [`config`]: Layered, immutable configuration
//! - [`logger`]: Memory-threshold logger

// Lets `#[derive(Component)]` expand to `::wiring::...` inside this crate too.
extern crate self as wiring;

pub mod cli;
pub mod component;
pub mod config;
pub mod error;
pub mod expression;
pub mod injection;
pub mod logger;
pub mod registry;
pub mod resolver;

pub use component::{Component, Instance, ResolvedInstance};
pub use error::{AppError, RegistryError, ResolveError};
pub use expression::{parse_expression, FunctionSignature, ParseError};
pub use registry::{DependencyRegistry, Provider};
pub use resolver::{resolve, Module, Resolver};
