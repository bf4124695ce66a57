//! Capability surface of constructed instances.
//!
//! Resolution hands dependencies around as type-erased [`Instance`] values.
//! Constructed modules implement [`Component`] so property and setter
//! injection can reach them by member name after construction.
//!
//! # Overview
//!
//! - [`Instance`]: Shared, type-erased dependency value
//! - [`Component`]: Accepts property assignments and setter calls by name
//! - [`FromInstance`]: Converts an [`Instance`] into a typed field value
//! - `#[derive(Component)]`: Generates the name dispatch from `#[inject]` fields
//!   and `#[component(setters(...))]` methods
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wiring::component::{Component, Instance};
//!
//! struct Db;
//!
//! #[derive(Component, Default)]
//! #[component(setters(set_cache))]
//! pub struct UserService {
//!     #[inject]
//!     db: Option<Arc<Db>>,
//!     cache_wired: bool,
//! }
//!
//! impl UserService {
//!     fn set_cache(&mut self, _cache: Instance) -> anyhow::Result<()> {
//!         self.cache_wired = true;
//!         Ok(())
//!     }
//! }
//!
//! let mut service = UserService::default();
//! service.set_property("db", Arc::new(Db)).unwrap();
//! service.invoke("set_cache", Arc::new(())).unwrap();
//! assert!(service.db.is_some() && service.cache_wired);
//! ```

use std::any::{self, Any};
use std::sync::Arc;

/// A shared, type-erased dependency value.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Result of a property assignment or setter call.
pub type BindResult = anyhow::Result<()>;

/// Type-erasure helpers implemented for every `'static` type.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

/// An instance that dependencies can be bound onto after construction.
///
/// Both methods fail by default; override the ones a type supports, or use
/// `#[derive(Component)]`. Errors returned here surface to the resolver's
/// caller unchanged.
pub trait Component: AsAny {
    /// Assigns `value` to the field named `field`.
    fn set_property(&mut self, field: &str, value: Instance) -> BindResult {
        let _ = value;
        Err(unknown_property(any::type_name::<Self>(), field))
    }

    /// Delivers `value` through the setter-style method named `method`.
    fn invoke(&mut self, method: &str, value: Instance) -> BindResult {
        let _ = value;
        Err(unknown_method(any::type_name::<Self>(), method))
    }
}

/// Error for a property name a component does not expose.
pub fn unknown_property(component: &str, field: &str) -> anyhow::Error {
    anyhow::anyhow!("Component '{}' has no injectable property '{}'", component, field)
}

/// Error for a method name a component does not expose.
pub fn unknown_method(component: &str, method: &str) -> anyhow::Error {
    anyhow::anyhow!("Component '{}' has no injectable method '{}'", component, method)
}

/// Conversion from a type-erased [`Instance`] into a concrete field value.
pub trait FromInstance: Sized {
    fn from_instance(value: Instance) -> anyhow::Result<Self>;
}

impl<T: Any + Send + Sync> FromInstance for Arc<T> {
    fn from_instance(value: Instance) -> anyhow::Result<Self> {
        value.downcast::<T>().map_err(|_| {
            anyhow::anyhow!(
                "Injected value is not of type '{}'",
                any::type_name::<T>()
            )
        })
    }
}

impl<T: Any + Send + Sync> FromInstance for Option<Arc<T>> {
    fn from_instance(value: Instance) -> anyhow::Result<Self> {
        Arc::<T>::from_instance(value).map(Some)
    }
}

/// A fully wired module returned by the resolver.
///
/// The caller owns it; the registry keeps no reference.
pub struct ResolvedInstance {
    name: String,
    inner: Box<dyn Component>,
}

impl ResolvedInstance {
    pub(crate) fn new(name: impl Into<String>, inner: Box<dyn Component>) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    /// Name of the factory that produced this instance.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        AsAny::as_any(&*self.inner).downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        AsAny::as_any_mut(&mut *self.inner).downcast_mut::<T>()
    }

    /// Unwraps the concrete component, or `None` if it is not a `T`.
    pub fn into_inner<T: Any>(self) -> Option<Box<T>> {
        AsAny::into_any(self.inner).downcast::<T>().ok()
    }

    pub fn as_component_mut(&mut self) -> &mut dyn Component {
        &mut *self.inner
    }
}

impl std::fmt::Debug for ResolvedInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedInstance")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// Re-export derive macro
pub use wiring_macros::Component;

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Component for Plain {}

    #[test]
    fn test_default_binding_fails() {
        let mut plain = Plain;
        let err = plain.set_property("db", Arc::new(1u8)).unwrap_err();
        assert!(err.to_string().contains("no injectable property 'db'"));

        let err = plain.invoke("set_db", Arc::new(1u8)).unwrap_err();
        assert!(err.to_string().contains("no injectable method 'set_db'"));
    }

    #[test]
    fn test_from_instance_downcasts() {
        let value: Instance = Arc::new(String::from("pool"));
        let typed = Arc::<String>::from_instance(value.clone()).unwrap();
        assert_eq!(typed.as_str(), "pool");
        assert!(Arc::<u32>::from_instance(value).is_err());
    }

    #[test]
    fn test_resolved_instance_downcast() {
        let mut resolved = ResolvedInstance::new("plain", Box::new(Plain));
        assert_eq!(resolved.name(), "plain");
        assert!(resolved.downcast_ref::<Plain>().is_some());
        assert!(resolved.downcast_mut::<Plain>().is_some());
        assert!(resolved.downcast_ref::<String>().is_none());
        assert!(resolved.into_inner::<Plain>().is_some());
    }
}
