//! Injection type classification and binding.
//!
//! Every dependency reaches its module in exactly one way:
//!
//! - [`InjectionType::Constructor`]: positional argument of the factory call
//! - [`InjectionType::Property`]: assignment to a named field after construction
//! - [`InjectionType::Method`]: call of a named setter after construction
//!
//! [`classify`] picks the kind from [`InjectionMetadata`]; a
//! [`DependencyDescriptor`] carries the result and implements [`Bind`].

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::component::{BindResult, Component, Instance};
use crate::config::Config;

/// How a dependency is supplied to the instance that requests it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionType {
    /// Positional argument at construction time, in signature order.
    #[default]
    Constructor,
    /// Field assignment on the constructed instance.
    Property,
    /// Setter-style method call on the constructed instance.
    Method,
}

impl InjectionType {
    /// Returns a static slice of all injection types.
    pub fn all() -> &'static [InjectionType] {
        &[
            InjectionType::Constructor,
            InjectionType::Property,
            InjectionType::Method,
        ]
    }

    /// Whether the binding happens after the instance exists.
    pub fn is_post_construction(&self) -> bool {
        !matches!(self, InjectionType::Constructor)
    }
}

impl std::fmt::Display for InjectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for InjectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Constructor" | "constructor" => Ok(InjectionType::Constructor),
            "Property" | "property" => Ok(InjectionType::Property),
            "Method" | "method" => Ok(InjectionType::Method),
            _ => Err(format!(
                "Invalid injection type '{}'. Valid values: Constructor, Property, Method",
                s
            )),
        }
    }
}

/// Registry metadata describing how one dependency prefers to be supplied.
///
/// Deserializable so it can come from the `[injection.<name>]` config tables:
///
/// ```toml
/// [injection.db]
/// type = "property"
/// member = "database"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InjectionHint {
    #[serde(rename = "type", default)]
    pub kind: InjectionType,
    /// Field or method name; defaults per kind (see [`DependencyDescriptor`]).
    #[serde(default)]
    pub member: Option<String>,
}

impl InjectionHint {
    pub fn constructor() -> Self {
        Self::default()
    }

    pub fn property() -> Self {
        Self {
            kind: InjectionType::Property,
            member: None,
        }
    }

    pub fn method() -> Self {
        Self {
            kind: InjectionType::Method,
            member: None,
        }
    }

    /// Overrides the field or method name the dependency is bound to.
    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }
}

/// Injection hints keyed by dependency name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionMetadata {
    hints: HashMap<String, InjectionHint>,
}

impl InjectionMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds metadata from the `injection` section of the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            hints: config.injection.clone(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, hint: InjectionHint) {
        self.hints.insert(name.into(), hint);
    }

    pub fn get(&self, name: &str) -> Option<&InjectionHint> {
        self.hints.get(name)
    }
}

/// Decides how `dependency` must be injected.
///
/// Never fails: dependencies without a hint use constructor injection.
pub fn classify(dependency: &str, metadata: &InjectionMetadata) -> InjectionType {
    metadata
        .get(dependency)
        .map(|hint| hint.kind)
        .unwrap_or_default()
}

/// Where a binding delivers its value.
pub enum BindTarget<'a> {
    /// Positional arguments collected before the factory call.
    Arguments(&'a mut Vec<Instance>),
    /// An instance that already exists.
    Instance(&'a mut dyn Component),
}

/// Uniform capability for delivering a dependency value.
pub trait Bind {
    fn bind(&self, target: BindTarget<'_>, value: Instance) -> BindResult;
}

/// A named dependency together with its classified injection type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyDescriptor {
    pub name: String,
    pub injection_type: InjectionType,
    /// Field (property) or method (setter) receiving the value.
    ///
    /// Defaults to the dependency name for properties and `set_<name>` for
    /// methods. Constructor injection is positional, so the dependency name is
    /// kept for diagnostics only.
    pub member: String,
}

impl DependencyDescriptor {
    /// Classifies `name` against `metadata` and resolves its member name.
    pub fn describe(name: &str, metadata: &InjectionMetadata) -> Self {
        Self::from_hint(name, metadata.get(name))
    }

    /// Descriptor for `name` given the single hint that applies to it, if any.
    pub fn from_hint(name: &str, hint: Option<&InjectionHint>) -> Self {
        let injection_type = hint.map(|hint| hint.kind).unwrap_or_default();
        let member = hint
            .and_then(|hint| hint.member.clone())
            .unwrap_or_else(|| match injection_type {
                InjectionType::Method => format!("set_{}", name),
                InjectionType::Constructor | InjectionType::Property => name.to_string(),
            });

        Self {
            name: name.to_string(),
            injection_type,
            member,
        }
    }
}

impl Bind for DependencyDescriptor {
    fn bind(&self, target: BindTarget<'_>, value: Instance) -> BindResult {
        match (self.injection_type, target) {
            (InjectionType::Constructor, BindTarget::Arguments(arguments)) => {
                arguments.push(value);
                Ok(())
            }
            (InjectionType::Property, BindTarget::Instance(instance)) => {
                instance.set_property(&self.member, value)
            }
            (InjectionType::Method, BindTarget::Instance(instance)) => {
                instance.invoke(&self.member, value)
            }
            (InjectionType::Constructor, BindTarget::Instance(_)) => Err(anyhow::anyhow!(
                "Dependency '{}' is constructor-injected and cannot be bound after construction",
                self.name
            )),
            (kind, BindTarget::Arguments(_)) => Err(anyhow::anyhow!(
                "Dependency '{}' uses {} injection and cannot be passed to the constructor",
                self.name,
                kind
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::component::FromInstance;

    #[derive(Default)]
    struct Target {
        db: Option<Arc<&'static str>>,
        logger: Option<Arc<&'static str>>,
    }

    impl Component for Target {
        fn set_property(&mut self, field: &str, value: Instance) -> BindResult {
            match field {
                "db" => {
                    self.db = FromInstance::from_instance(value)?;
                    Ok(())
                }
                _ => Err(crate::component::unknown_property("Target", field)),
            }
        }

        fn invoke(&mut self, method: &str, value: Instance) -> BindResult {
            match method {
                "set_logger" => {
                    self.logger = FromInstance::from_instance(value)?;
                    Ok(())
                }
                _ => Err(crate::component::unknown_method("Target", method)),
            }
        }
    }

    #[test]
    fn test_classify_defaults_to_constructor() {
        let metadata = InjectionMetadata::new();
        assert_eq!(classify("anything", &metadata), InjectionType::Constructor);
    }

    #[test]
    fn test_classify_uses_hints() {
        let mut metadata = InjectionMetadata::new();
        metadata.insert("db", InjectionHint::property());
        metadata.insert("logger", InjectionHint::method());
        assert_eq!(classify("db", &metadata), InjectionType::Property);
        assert_eq!(classify("logger", &metadata), InjectionType::Method);
        assert_eq!(classify("cache", &metadata), InjectionType::Constructor);
    }

    #[test]
    fn test_descriptor_from_hint() {
        let hint = InjectionHint::method().with_member("attach");
        let descriptor = DependencyDescriptor::from_hint("metrics", Some(&hint));
        assert_eq!(descriptor.injection_type, InjectionType::Method);
        assert_eq!(descriptor.member, "attach");

        let descriptor = DependencyDescriptor::from_hint("metrics", None);
        assert_eq!(descriptor.injection_type, InjectionType::Constructor);
        assert_eq!(descriptor.member, "metrics");
    }

    #[test]
    fn test_descriptor_member_defaults() {
        let mut metadata = InjectionMetadata::new();
        metadata.insert("db", InjectionHint::property());
        metadata.insert("logger", InjectionHint::method());
        metadata.insert("cache", InjectionHint::property().with_member("store"));

        assert_eq!(DependencyDescriptor::describe("db", &metadata).member, "db");
        assert_eq!(
            DependencyDescriptor::describe("logger", &metadata).member,
            "set_logger"
        );
        assert_eq!(
            DependencyDescriptor::describe("cache", &metadata).member,
            "store"
        );
    }

    #[test]
    fn test_bind_each_variant() {
        let mut metadata = InjectionMetadata::new();
        metadata.insert("db", InjectionHint::property());
        metadata.insert("logger", InjectionHint::method());

        let mut arguments = Vec::new();
        DependencyDescriptor::describe("cache", &metadata)
            .bind(BindTarget::Arguments(&mut arguments), Arc::new("cache"))
            .unwrap();
        assert_eq!(arguments.len(), 1);

        let mut target = Target::default();
        DependencyDescriptor::describe("db", &metadata)
            .bind(BindTarget::Instance(&mut target), Arc::new("db"))
            .unwrap();
        DependencyDescriptor::describe("logger", &metadata)
            .bind(BindTarget::Instance(&mut target), Arc::new("logger"))
            .unwrap();
        assert_eq!(target.db.as_deref(), Some(&"db"));
        assert_eq!(target.logger.as_deref(), Some(&"logger"));
    }

    #[test]
    fn test_bind_rejects_mismatched_target() {
        let metadata = InjectionMetadata::new();
        let mut target = Target::default();
        let err = DependencyDescriptor::describe("cache", &metadata)
            .bind(BindTarget::Instance(&mut target), Arc::new("cache"))
            .unwrap_err();
        assert!(err.to_string().contains("constructor-injected"));
    }

    #[test]
    fn test_injection_type_from_str() {
        assert_eq!("property".parse(), Ok(InjectionType::Property));
        assert_eq!("Method".parse(), Ok(InjectionType::Method));
        assert!("field".parse::<InjectionType>().is_err());
    }
}
