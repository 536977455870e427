//! In-memory type registry with a cached classifier.
//!
//! ## Classification Order
//!
//! 1. Array signatures → array descriptor
//! 2. Wildcards, type variables and `Object` → value type `Object`
//! 3. Raw class is a known container name → map/list/set descriptor
//! 4. Built-in primitives and boxed scalars → primitive
//! 5. Registered entities, value objects, value types
//! 6. Anything else → value object with no declared properties
//!
//! Classifications are deterministic per registry state, so they are cached
//! by signature. Registering a class clears the cache.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::{ContainerShape, TypeName, TypeSignature};

use super::enumerable::EnumerableType;
use super::{ManagedClass, ManagedType, TypeMapper};

/// Scalar classes compared by value and stored as leaves.
const PRIMITIVE_CLASSES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
    "Boolean", "Byte", "Character", "Short", "Integer", "Long", "Float", "Double",
    "String", "BigDecimal", "BigInteger",
];

/// Raw container class names and the shape they normalize to.
const CONTAINER_CLASSES: &[(&str, ContainerShape)] = &[
    ("Map", ContainerShape::Map),
    ("HashMap", ContainerShape::Map),
    ("TreeMap", ContainerShape::Map),
    ("LinkedHashMap", ContainerShape::Map),
    ("List", ContainerShape::List),
    ("ArrayList", ContainerShape::List),
    ("LinkedList", ContainerShape::List),
    ("Collection", ContainerShape::List),
    ("Set", ContainerShape::Set),
    ("HashSet", ContainerShape::Set),
    ("TreeSet", ContainerShape::Set),
    ("LinkedHashSet", ContainerShape::Set),
];

/// Class name erased types classify as.
const OBJECT_CLASS: &str = "Object";

/// Configuration for the classification cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached classifications.
    pub max_entries: usize,
    /// Whether caching is enabled.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Config with caching turned off.
    pub fn disabled() -> Self {
        Self {
            max_entries: 0,
            enabled: false,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries in the cache.
    pub len: usize,
    /// Maximum capacity of the cache.
    pub cap: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to classify.
    pub misses: u64,
}

/// Type registry backed by in-memory maps.
///
/// Thread-safe: registration needs `&mut self`, classification only `&self`.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = InMemoryTypeRegistry::new();
/// registry.register_entity(
///     ManagedClass::new("Customer")
///         .with_id_property("id")
///         .with_property("orders", TypeSignature::parse("List<Order>")?),
/// );
/// let managed = registry.classify(&TypeSignature::class("Customer"));
/// ```
pub struct InMemoryTypeRegistry {
    entities: BTreeMap<TypeName, ManagedClass>,
    value_objects: BTreeMap<TypeName, ManagedClass>,
    value_types: BTreeMap<TypeName, TypeName>,
    cache: Option<Arc<RwLock<LruCache<TypeSignature, ManagedType>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for InMemoryTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTypeRegistry {
    /// Create an empty registry with the default cache.
    pub fn new() -> Self {
        Self::with_cache(CacheConfig::default())
    }

    /// Create an empty registry with the given cache configuration.
    pub fn with_cache(config: CacheConfig) -> Self {
        let cache = if config.enabled {
            NonZeroUsize::new(config.max_entries)
                .map(|size| Arc::new(RwLock::new(LruCache::new(size))))
        } else {
            None
        };

        Self {
            entities: BTreeMap::new(),
            value_objects: BTreeMap::new(),
            value_types: BTreeMap::new(),
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Register an Entity class. Its id property must be set.
    pub fn register_entity(&mut self, class: ManagedClass) -> &mut Self {
        if class.id_property().is_none() {
            tracing::warn!(type_name = %class.type_name(), "Entity registered without id property");
        }
        let name = class.type_name().clone();
        self.value_objects.remove(&name);
        self.value_types.remove(&name);
        self.entities.insert(name, class);
        self.clear_cache();
        self
    }

    /// Register a ValueObject class.
    pub fn register_value_object(&mut self, class: ManagedClass) -> &mut Self {
        let name = class.type_name().clone();
        self.entities.remove(&name);
        self.value_types.remove(&name);
        self.value_objects.insert(name, class);
        self.clear_cache();
        self
    }

    /// Register a user value type (compared by value, stored as a leaf).
    pub fn register_value_type(&mut self, type_name: impl Into<TypeName>) -> &mut Self {
        let name = type_name.into();
        self.entities.remove(&name);
        self.value_objects.remove(&name);
        self.value_types.insert(name.clone(), name);
        self.clear_cache();
        self
    }

    /// Get cache statistics.
    ///
    /// Returns `None` if caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| {
            let cache = cache.read();
            CacheStats {
                len: cache.len(),
                cap: cache.cap().get(),
                hits: self.hits.load(Ordering::Relaxed),
                misses: self.misses.load(Ordering::Relaxed),
            }
        })
    }

    /// Clear the classification cache.
    ///
    /// Does nothing if caching is disabled.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
    }

    fn classify_uncached(&self, signature: &TypeSignature) -> ManagedType {
        if signature.is_array() {
            return ManagedType::Enumerable(EnumerableType::new(
                ContainerShape::Array,
                signature.clone(),
            ));
        }

        let raw = match signature.raw_class() {
            Some(raw) if raw.as_str() != OBJECT_CLASS => raw,
            _ => return ManagedType::Value(TypeName::new(OBJECT_CLASS)),
        };

        if let Some((_, shape)) = CONTAINER_CLASSES.iter().find(|(name, _)| *name == raw.as_str()) {
            return ManagedType::Enumerable(EnumerableType::new(*shape, signature.clone()));
        }
        if PRIMITIVE_CLASSES.contains(&raw.as_str()) {
            return ManagedType::Primitive(raw.clone());
        }
        if let Some(class) = self.entities.get(raw) {
            return ManagedType::Entity(class.clone());
        }
        if let Some(class) = self.value_objects.get(raw) {
            return ManagedType::ValueObject(class.clone());
        }
        if let Some(name) = self.value_types.get(raw) {
            return ManagedType::Value(name.clone());
        }

        tracing::trace!(type_name = %raw, "Unregistered class mapped as value object");
        ManagedType::ValueObject(ManagedClass::new(raw.clone()))
    }
}

impl TypeMapper for InMemoryTypeRegistry {
    fn classify(&self, signature: &TypeSignature) -> ManagedType {
        if let Some(cache) = &self.cache {
            if let Some(managed) = cache.read().peek(signature) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return managed.clone();
            }
        }

        let managed = self.classify_uncached(signature);
        self.misses.fetch_add(1, Ordering::Relaxed);

        if let Some(cache) = &self.cache {
            cache.write().put(signature.clone(), managed.clone());
        }

        managed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::{Enumerable, TypeCategory};

    fn sig(s: &str) -> TypeSignature {
        TypeSignature::parse(s).unwrap()
    }

    fn registry() -> InMemoryTypeRegistry {
        let mut registry = InMemoryTypeRegistry::new();
        registry
            .register_entity(ManagedClass::new("Customer").with_id_property("id"))
            .register_value_object(ManagedClass::new("Address"))
            .register_value_type("Money");
        registry
    }

    #[test]
    fn test_builtin_categories() {
        let registry = registry();
        assert_eq!(registry.classify(&sig("int")).category(), TypeCategory::Primitive);
        assert_eq!(registry.classify(&sig("String")).category(), TypeCategory::Primitive);
        assert_eq!(registry.classify(&sig("Customer")).category(), TypeCategory::Entity);
        assert_eq!(registry.classify(&sig("Address")).category(), TypeCategory::ValueObject);
        assert_eq!(registry.classify(&sig("Money")).category(), TypeCategory::ValueType);
        assert_eq!(registry.classify(&sig("?")).category(), TypeCategory::ValueType);
        assert_eq!(registry.classify(&sig("Object")).category(), TypeCategory::ValueType);
    }

    #[test]
    fn test_containers_by_raw_name() {
        let registry = registry();
        let cases = [
            ("HashMap<String, Customer>", ContainerShape::Map),
            ("ArrayList<Customer>", ContainerShape::List),
            ("Collection<Address>", ContainerShape::List),
            ("TreeSet<String>", ContainerShape::Set),
            ("Customer[]", ContainerShape::Array),
        ];
        for (text, shape) in cases {
            let managed = registry.classify(&sig(text));
            let descriptor = managed.enumerable().expect("container");
            assert_eq!(descriptor.shape(), shape, "{}", text);
            assert!(descriptor.is_fully_parametrized(), "{}", text);
        }
    }

    #[test]
    fn test_unknown_class_defaults_to_value_object() {
        let registry = registry();
        let managed = registry.classify(&sig("Coordinates"));
        assert_eq!(managed.category(), TypeCategory::ValueObject);
        assert!(managed.managed_class().unwrap().properties().is_empty());
    }

    #[test]
    fn test_cache_hits_counted() {
        let registry = registry();
        registry.classify(&sig("Customer"));
        registry.classify(&sig("Customer"));
        registry.classify(&sig("List<Customer>"));

        let stats = registry.cache_stats().unwrap();
        assert_eq!(stats.len, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);

        registry.clear_cache();
        assert_eq!(registry.cache_stats().unwrap().len, 0);
    }

    #[test]
    fn test_registration_invalidates_cache() {
        let mut registry = registry();
        assert_eq!(registry.classify(&sig("Order")).category(), TypeCategory::ValueObject);

        registry.register_entity(ManagedClass::new("Order").with_id_property("number"));
        assert_eq!(registry.classify(&sig("Order")).category(), TypeCategory::Entity);
    }

    #[test]
    fn test_disabled_cache() {
        let registry = InMemoryTypeRegistry::with_cache(CacheConfig::disabled());
        assert!(registry.cache_stats().is_none());
        assert_eq!(registry.classify(&sig("long")).category(), TypeCategory::Primitive);
    }
}
