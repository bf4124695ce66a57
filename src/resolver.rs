//! Resolution engine.
//!
//! Binds every parameter of a module's [`FunctionSignature`] to a registry
//! entry and builds the instance:
//!
//! 1. Look up each parameter name; a missing name is [`ResolveError::Unresolved`]
//! 2. Classify each dependency ([`DependencyDescriptor::describe`])
//! 3. Pass constructor dependencies positionally, in signature order, to the factory
//! 4. Apply property and method bindings, in signature order, to the new instance
//!
//! Errors raised by providers, the factory, or binding targets are returned as
//! [`ResolveError::Construction`] without added context.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wiring::component::Component;
//! use wiring::registry::{DependencyRegistry, Provider};
//! use wiring::resolver::{Module, Resolver};
//!
//! struct Logger;
//!
//! #[derive(Component)]
//! struct Service {
//!     logger: Arc<Logger>,
//! }
//!
//! let registry = DependencyRegistry::new();
//! registry.register("logger", Provider::value(Logger)).unwrap();
//!
//! let module = Module::new("function service(logger) {}", |args| {
//!     Ok(Service { logger: args.get("logger")? })
//! })
//! .unwrap();
//!
//! let instance = Resolver::new(&registry).resolve(&module).unwrap();
//! assert_eq!(instance.name(), "service");
//! assert!(instance.downcast_ref::<Service>().is_some());
//! ```

use std::any::{self, Any};
use std::sync::Arc;

use crate::component::{Component, FromInstance, Instance, ResolvedInstance};
use crate::config::Config;
use crate::error::ResolveError;
use crate::expression::{parse_expression, FunctionSignature, ParseError};
use crate::injection::{Bind, BindTarget, DependencyDescriptor, InjectionHint, InjectionMetadata};
use crate::registry::DependencyRegistry;

type ConstructFn = Arc<dyn Fn(Arguments) -> anyhow::Result<Box<dyn Component>> + Send + Sync>;

/// A factory together with the signature parsed from its declaration.
#[derive(Clone)]
pub struct Module {
    signature: FunctionSignature,
    construct: ConstructFn,
}

impl Module {
    /// Parses `source` and pairs the resulting signature with `factory`.
    pub fn new<C, F>(source: &str, factory: F) -> Result<Self, ParseError>
    where
        C: Component,
        F: Fn(Arguments) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        Ok(Self::from_signature(parse_expression(source)?, factory))
    }

    pub fn from_signature<C, F>(signature: FunctionSignature, factory: F) -> Self
    where
        C: Component,
        F: Fn(Arguments) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        Self {
            signature,
            construct: Arc::new(move |arguments| {
                factory(arguments).map(|component| Box::new(component) as Box<dyn Component>)
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Constructor-injected values handed to a factory, in signature order.
pub struct Arguments {
    function: String,
    names: Vec<String>,
    values: Vec<Instance>,
}

impl Arguments {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names of the constructor parameters, in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[Instance] {
        &self.values
    }

    /// Typed access by parameter name.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> anyhow::Result<Arc<T>> {
        let index = self
            .names
            .iter()
            .position(|candidate| candidate == name)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "'{}' is not a constructor argument of '{}'",
                    name,
                    self.function
                )
            })?;
        self.at(index)
    }

    /// Typed access by position.
    pub fn at<T: Any + Send + Sync>(&self, index: usize) -> anyhow::Result<Arc<T>> {
        let value = self.values.get(index).cloned().ok_or_else(|| {
            anyhow::anyhow!(
                "'{}' has no constructor argument at position {}",
                self.function,
                index
            )
        })?;
        Arc::<T>::from_instance(value).map_err(|_| {
            anyhow::anyhow!(
                "Constructor argument '{}' of '{}' is not of type '{}'",
                self.names[index],
                self.function,
                any::type_name::<T>()
            )
        })
    }
}

/// Resolves modules against a registry.
///
/// Holds no state between calls: resolving the same module twice yields two
/// independent instances, sharing only singleton and value dependencies.
pub struct Resolver<'a> {
    registry: &'a DependencyRegistry,
    defaults: InjectionMetadata,
}

impl<'a> Resolver<'a> {
    /// Resolver using only the hints given at registration.
    pub fn new(registry: &'a DependencyRegistry) -> Self {
        Self {
            registry,
            defaults: InjectionMetadata::new(),
        }
    }

    /// Resolver that falls back to the `injection` section of `config` for
    /// dependencies registered without a hint.
    pub fn with_config(registry: &'a DependencyRegistry, config: &Config) -> Self {
        Self {
            registry,
            defaults: InjectionMetadata::from_config(config),
        }
    }

    /// Descriptor for `name`. A registration hint wins over the configured one.
    fn descriptor(&self, name: &str, registered: Option<&InjectionHint>) -> DependencyDescriptor {
        DependencyDescriptor::from_hint(name, registered.or_else(|| self.defaults.get(name)))
    }

    /// Classifies every parameter of `signature` without resolving anything.
    pub fn describe(&self, signature: &FunctionSignature) -> Vec<DependencyDescriptor> {
        signature
            .parameter_names
            .iter()
            .map(|name| self.descriptor(name, self.registry.hint(name).as_ref()))
            .collect()
    }

    /// Builds a fully wired instance of `module`.
    pub fn resolve(&self, module: &Module) -> Result<ResolvedInstance, ResolveError> {
        let signature = module.signature();

        // Every name must be registered before anything is constructed.
        let registrations = signature
            .parameter_names
            .iter()
            .map(|name| {
                self.registry
                    .lookup(name)
                    .ok_or_else(|| ResolveError::Unresolved {
                        dependency: name.clone(),
                        function: signature.name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut bindings = Vec::with_capacity(registrations.len());
        for (name, registration) in signature.parameter_names.iter().zip(registrations) {
            let descriptor = self.descriptor(name, registration.hint.as_ref());
            let value = registration
                .provider
                .provide()
                .map_err(ResolveError::Construction)?;
            bindings.push((descriptor, value));
        }

        let (constructor, post): (Vec<_>, Vec<_>) = bindings
            .into_iter()
            .partition(|(descriptor, _)| !descriptor.injection_type.is_post_construction());

        let mut arguments = Arguments {
            function: signature.name.clone(),
            names: Vec::with_capacity(constructor.len()),
            values: Vec::with_capacity(constructor.len()),
        };
        for (descriptor, value) in constructor {
            descriptor
                .bind(BindTarget::Arguments(&mut arguments.values), value)
                .map_err(ResolveError::Construction)?;
            arguments.names.push(descriptor.name);
        }

        tracing::debug!(
            "Constructing '{}' with arguments {:?}",
            signature.name,
            arguments.names
        );
        let mut instance = (module.construct)(arguments).map_err(ResolveError::Construction)?;

        for (descriptor, value) in post {
            tracing::debug!(
                "Binding '{}' into '{}' via {} '{}'",
                descriptor.name,
                signature.name,
                descriptor.injection_type,
                descriptor.member
            );
            descriptor
                .bind(BindTarget::Instance(&mut *instance), value)
                .map_err(ResolveError::Construction)?;
        }

        Ok(ResolvedInstance::new(signature.name.clone(), instance))
    }

    /// Parses `source`, then resolves it with `factory`.
    pub fn resolve_source<C, F>(&self, source: &str, factory: F) -> Result<ResolvedInstance, ResolveError>
    where
        C: Component,
        F: Fn(Arguments) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        let module = Module::new(source, factory)?;
        self.resolve(&module)
    }
}

/// Resolves `module` against `registry` using registration hints only.
pub fn resolve(module: &Module, registry: &DependencyRegistry) -> Result<ResolvedInstance, ResolveError> {
    Resolver::new(registry).resolve(module)
}
