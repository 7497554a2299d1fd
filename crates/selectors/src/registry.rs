//! Selector registry.
//!
//! Selectors are registered explicitly by [`register_selectors`] and looked
//! up by name. The process-wide registry from [`global`] is built once and
//! only read afterwards.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use ciselect_core::{Parameters, TaskGraph};

use crate::context::SelectionContext;
use crate::error::Result;

/// A named strategy picking target tasks out of the full graph.
#[async_trait]
pub trait TargetTaskSelector: Send + Sync {
    /// Labels to schedule.
    async fn select(
        &self,
        graph: &TaskGraph,
        parameters: &Parameters,
        ctx: &SelectionContext,
    ) -> Result<Vec<String>>;

    /// Identity used to tell re-registration apart from a name clash.
    fn id(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Signature of a synchronous selector function.
pub type SelectFn = fn(&TaskGraph, &Parameters, &SelectionContext) -> Result<Vec<String>>;

/// Selector backed by a plain function.
#[derive(Clone, Copy)]
pub struct FnSelector {
    id: &'static str,
    select: SelectFn,
}

impl FnSelector {
    /// Wrap a function. Prefer the `selector_fn!` macro, which derives `id`
    /// from the function path.
    pub fn new(id: &'static str, select: SelectFn) -> Self {
        Self { id, select }
    }
}

#[async_trait]
impl TargetTaskSelector for FnSelector {
    async fn select(
        &self,
        graph: &TaskGraph,
        parameters: &Parameters,
        ctx: &SelectionContext,
    ) -> Result<Vec<String>> {
        (self.select)(graph, parameters, ctx)
    }

    fn id(&self) -> &'static str {
        self.id
    }
}

macro_rules! selector_fn {
    ($f:path) => {
        std::sync::Arc::new($crate::registry::FnSelector::new(
            concat!(module_path!(), "::", stringify!($f)),
            $f,
        ))
    };
}
pub(crate) use selector_fn;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Nothing registered under the name
    #[error("unknown target tasks method '{0}'")]
    UnknownSelector(String),

    /// Name already taken by a different selector
    #[error("target tasks method '{name}' registered twice ({existing} and {new})")]
    DuplicateSelector {
        /// Selector name
        name: String,
        /// Identity already registered
        existing: &'static str,
        /// Identity being registered
        new: &'static str,
    },
}

/// Mapping from selector name to selector.
#[derive(Default)]
pub struct SelectorRegistry {
    selectors: BTreeMap<String, Arc<dyn TargetTaskSelector>>,
}

impl SelectorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a selector under `name`.
    ///
    /// Registering the same selector again is a no-op; registering a different
    /// one under a taken name fails.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        selector: Arc<dyn TargetTaskSelector>,
    ) -> std::result::Result<(), RegistryError> {
        let name = name.into();
        if let Some(existing) = self.selectors.get(&name) {
            if existing.id() == selector.id() {
                return Ok(());
            }
            return Err(RegistryError::DuplicateSelector {
                name,
                existing: existing.id(),
                new: selector.id(),
            });
        }
        self.selectors.insert(name, selector);
        Ok(())
    }

    /// Make `alias` resolve to the selector registered as `target`.
    pub fn alias(&mut self, alias: impl Into<String>, target: &str) -> std::result::Result<(), RegistryError> {
        let selector = self.get(target)?;
        self.register(alias, selector)
    }

    /// Look up a selector.
    pub fn get(&self, name: &str) -> std::result::Result<Arc<dyn TargetTaskSelector>, RegistryError> {
        self.selectors
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownSelector(name.to_string()))
    }

    /// Whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.selectors.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.selectors.keys().map(String::as_str)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

/// Register every built-in selector.
pub fn register_selectors(registry: &mut SelectorRegistry) -> std::result::Result<(), RegistryError> {
    crate::integration::register(registry)?;
    crate::release::register(registry)?;
    crate::phase::register(registry)?;
    crate::try_tasks::register(registry)?;
    crate::nightly::register(registry)?;
    crate::cron::register(registry)?;
    crate::perf::register(registry)?;
    crate::staging::register(registry)?;
    crate::backfill::register(registry)?;
    Ok(())
}

static GLOBAL: OnceLock<std::result::Result<SelectorRegistry, RegistryError>> = OnceLock::new();

/// The process-wide registry holding the built-in selectors.
pub fn global() -> std::result::Result<&'static SelectorRegistry, RegistryError> {
    GLOBAL
        .get_or_init(|| {
            let mut registry = SelectorRegistry::new();
            register_selectors(&mut registry).map(|()| registry)
        })
        .as_ref()
        .map_err(Clone::clone)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(graph: &TaskGraph, _: &Parameters, _: &SelectionContext) -> Result<Vec<String>> {
        Ok(graph.labels().take(1).map(String::from).collect())
    }

    fn none(_: &TaskGraph, _: &Parameters, _: &SelectionContext) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = SelectorRegistry::new();
        registry.register("first", selector_fn!(first)).unwrap();
        assert!(registry.contains("first"));
        assert!(registry.get("first").is_ok());
        assert!(matches!(
            registry.get("missing"),
            Err(RegistryError::UnknownSelector(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_same_selector_twice_is_noop() {
        let mut registry = SelectorRegistry::new();
        registry.register("first", selector_fn!(first)).unwrap();
        registry.register("first", selector_fn!(first)).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_different_selector_same_name_fails() {
        let mut registry = SelectorRegistry::new();
        registry.register("sel", selector_fn!(first)).unwrap();
        let err = registry.register("sel", selector_fn!(none)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateSelector { .. }));
    }

    #[test]
    fn test_alias() {
        let mut registry = SelectorRegistry::new();
        registry.register("long_name", selector_fn!(first)).unwrap();
        registry.alias("short", "long_name").unwrap();
        assert_eq!(registry.get("short").unwrap().id(), registry.get("long_name").unwrap().id());
        assert!(registry.alias("other", "missing").is_err());
    }

    #[test]
    fn test_global_has_builtins() {
        let registry = global().unwrap();
        for name in [
            "default",
            "autoland_tasks",
            "autoland",
            "mozilla_esr128_tasks",
            "ship_desktop",
            "try_tasks",
            "nightly_linux",
            "nightly_all",
            "searchfox_index",
            "backfill_all_browsertime",
            "os-integration",
            "codereview",
            "nothing",
        ] {
            assert!(registry.contains(name), "{name} not registered");
        }
        assert!(std::ptr::eq(registry, global().unwrap()));
    }
}
