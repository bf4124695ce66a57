//! Dependency registry.
//!
//! Maps dependency names to providers that produce instances on demand, plus
//! the injection hints given at registration time. Registration is expected
//! to finish before resolution starts. Late insertions are serialized by the
//! write lock and rejected for names that were already resolved.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::OnceCell;

use crate::component::Instance;
use crate::error::RegistryError;
use crate::injection::InjectionHint;

type ProviderFn = Arc<dyn Fn() -> anyhow::Result<Instance> + Send + Sync>;

/// Produces the value injected for one dependency name.
#[derive(Clone)]
pub enum Provider {
    /// A prebuilt value shared by every resolution.
    Value(Instance),
    /// A factory run at most once; its result is shared.
    Singleton {
        factory: ProviderFn,
        cell: Arc<OnceCell<Instance>>,
    },
    /// A factory run on every resolution.
    Transient(ProviderFn),
}

impl Provider {
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Provider::Value(Arc::new(value))
    }

    pub fn singleton<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Provider::Singleton {
            factory: erase(factory),
            cell: Arc::new(OnceCell::new()),
        }
    }

    pub fn transient<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Provider::Transient(erase(factory))
    }

    /// The lifetime this provider implements.
    pub fn lifetime(&self) -> Lifetime {
        match self {
            Provider::Value(_) => Lifetime::Value,
            Provider::Singleton { .. } => Lifetime::Singleton,
            Provider::Transient(_) => Lifetime::Transient,
        }
    }

    /// Produces an instance.
    ///
    /// Concurrent first calls on a singleton construct it exactly once. A
    /// failed construction leaves the singleton empty so a later call retries.
    /// Factory errors are returned unchanged.
    pub fn provide(&self) -> anyhow::Result<Instance> {
        match self {
            Provider::Value(value) => Ok(Arc::clone(value)),
            Provider::Singleton { factory, cell } => cell.get_or_try_init(|| factory()).cloned(),
            Provider::Transient(factory) => factory(),
        }
    }
}

fn erase<T, F>(factory: F) -> ProviderFn
where
    T: Send + Sync + 'static,
    F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
{
    Arc::new(move || factory().map(|value| Arc::new(value) as Instance))
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Provider::{:?}", self.lifetime())
    }
}

/// How long a provided instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    Value,
    Singleton,
    Transient,
}

/// A provider and the hint it was registered with.
#[derive(Debug, Clone)]
pub struct Registration {
    pub provider: Provider,
    pub hint: Option<InjectionHint>,
}

struct Entry {
    registration: Registration,
    resolved: AtomicBool,
}

/// Thread-safe registry of named dependencies.
#[derive(Clone, Default)]
pub struct DependencyRegistry {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under `name`.
    pub fn register(
        &self,
        name: impl Into<String>,
        provider: Provider,
    ) -> Result<(), RegistryError> {
        self.insert(name.into(), provider, None)
    }

    /// Registers a provider together with its preferred injection type.
    pub fn register_with(
        &self,
        name: impl Into<String>,
        provider: Provider,
        hint: InjectionHint,
    ) -> Result<(), RegistryError> {
        self.insert(name.into(), provider, Some(hint))
    }

    fn insert(
        &self,
        name: String,
        provider: Provider,
        hint: Option<InjectionHint>,
    ) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = entries.get(&name) {
            if existing.resolved.load(Ordering::Acquire) {
                return Err(RegistryError::AlreadyResolved(name));
            }
            tracing::warn!("Replacing registration for dependency '{}'", name);
        }

        tracing::debug!(
            "Registered dependency '{}' ({:?})",
            name,
            provider.lifetime()
        );
        entries.insert(
            name,
            Entry {
                registration: Registration { provider, hint },
                resolved: AtomicBool::new(false),
            },
        );
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Hint given when `name` was registered. Does not mark it resolved.
    pub fn hint(&self, name: &str) -> Option<InjectionHint> {
        self.read().get(name).and_then(|entry| entry.registration.hint.clone())
    }

    /// Looks up `name` and marks it resolved, closing it to re-registration.
    ///
    /// Returns `None` if the name is not registered. The flag is set while the
    /// read lock is held, so a concurrent `register` either replaces the entry
    /// before this lookup sees it or is rejected.
    pub fn lookup(&self, name: &str) -> Option<Registration> {
        let entries = self.read();
        let entry = entries.get(name)?;
        entry.resolved.store(true, Ordering::Release);
        Some(entry.registration.clone())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for DependencyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::injection::InjectionType;

    #[test]
    fn test_value_is_shared() {
        let provider = Provider::value(42u32);
        let a = provider.provide().unwrap();
        let b = provider.provide().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(provider.lifetime(), Lifetime::Value);
    }

    #[test]
    fn test_transient_builds_each_time() {
        let provider = Provider::transient(|| Ok(String::from("conn")));
        let a = provider.provide().unwrap();
        let b = provider.provide().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_singleton_retries_after_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let provider = Provider::singleton(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("pool not ready");
            }
            Ok(7u8)
        });

        assert_eq!(provider.provide().unwrap_err().to_string(), "pool not ready");
        let a = provider.provide().unwrap();
        let b = provider.provide().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reregister_before_resolution_replaces() {
        let registry = DependencyRegistry::new();
        registry.register("db", Provider::value(1u8)).unwrap();
        registry.register("db", Provider::value(2u8)).unwrap();

        let value = registry.lookup("db").unwrap().provider.provide().unwrap();
        assert_eq!(value.downcast_ref::<u8>(), Some(&2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reregister_after_resolution_fails() {
        let registry = DependencyRegistry::new();
        registry.register("db", Provider::value(1u8)).unwrap();
        registry.lookup("db").unwrap();

        let err = registry.register("db", Provider::value(2u8)).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyResolved("db".to_string()));
        // Other names stay open
        registry.register("cache", Provider::value(3u8)).unwrap();
    }

    #[test]
    fn test_lookup_missing() {
        let registry = DependencyRegistry::new();
        assert!(registry.lookup("nope").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_hints_are_kept_with_registration() {
        let registry = DependencyRegistry::new();
        registry
            .register_with("db", Provider::value(()), InjectionHint::property())
            .unwrap();
        registry.register("logger", Provider::value(())).unwrap();

        assert_eq!(registry.hint("db").map(|h| h.kind), Some(InjectionType::Property));
        assert!(registry.hint("logger").is_none());
        // Reading a hint leaves the name open
        registry.register("db", Provider::value(1u8)).unwrap();

        let registration = registry.lookup("db").unwrap();
        assert!(registration.hint.is_none());
        assert_eq!(registry.names(), vec!["db", "logger"]);
    }

    #[test]
    fn test_concurrent_register_and_lookup() {
        // Every lookup must observe a provider that is still registered:
        // once a lookup returns, the name is closed and no writer replaced it.
        for _ in 0..64 {
            let registry = DependencyRegistry::new();
            registry.register("db", Provider::value(0u8)).unwrap();

            let (seen, accepted) = std::thread::scope(|scope| {
                let writer = scope.spawn(|| {
                    (1..=8u8)
                        .filter(|i| registry.register("db", Provider::value(*i)).is_ok())
                        .last()
                        .unwrap_or(0)
                });
                let reader = scope.spawn(|| {
                    let registration = registry.lookup("db").unwrap();
                    *registration
                        .provider
                        .provide()
                        .unwrap()
                        .downcast_ref::<u8>()
                        .unwrap()
                });
                (reader.join().unwrap(), writer.join().unwrap())
            });

            // The last accepted registration is the one the lookup returned.
            assert_eq!(seen, accepted);
            assert!(registry.register("db", Provider::value(9u8)).is_err());
        }
    }
}
