//! String-keyed property registration
//!
//! Tools and data files name animatable properties by string. The registry
//! maps those names to adapters and checks the requested holder and value
//! types on lookup, so a mismatch is reported instead of silently animating
//! the wrong thing.

use std::any::{type_name, Any, TypeId};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{PropertyError, Result};
use crate::property::{Property, SharedProperty};

struct Entry {
    /// Holds a `SharedProperty<H, V>`
    adapter: Box<dyn Any>,
    holder: TypeId,
    holder_name: &'static str,
    value: TypeId,
    value_name: &'static str,
}

/// Table of named property adapters
#[derive(Default)]
pub struct PropertyRegistry {
    entries: FxHashMap<String, Entry>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under `key`, replacing any previous registration
    pub fn register<P>(&mut self, key: impl Into<String>, property: P)
    where
        P: Property + 'static,
        P::Holder: 'static,
        P::Value: 'static,
    {
        let key = key.into();
        let shared: SharedProperty<P::Holder, P::Value> = Rc::new(property);
        let entry = Entry {
            adapter: Box::new(shared),
            holder: TypeId::of::<P::Holder>(),
            holder_name: type_name::<P::Holder>(),
            value: TypeId::of::<P::Value>(),
            value_name: type_name::<P::Value>(),
        };
        if self.entries.insert(key.clone(), entry).is_some() {
            tracing::debug!("Replaced property registration `{}`", key);
        }
    }

    /// Look up an adapter, checking its holder and value types
    pub fn get<H: 'static, V: 'static>(&self, key: &str) -> Result<SharedProperty<H, V>> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| PropertyError::Unknown(key.to_string()))?;

        if entry.holder != TypeId::of::<H>() {
            return Err(PropertyError::HolderMismatch {
                key: key.to_string(),
                expected: type_name::<H>(),
                found: entry.holder_name,
            });
        }
        if entry.value != TypeId::of::<V>() {
            return Err(PropertyError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<V>(),
                found: entry.value_name,
            });
        }

        entry
            .adapter
            .downcast_ref::<SharedProperty<H, V>>()
            .cloned()
            .ok_or_else(|| PropertyError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<V>(),
                found: entry.value_name,
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Registered keys, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{Accessor, Channel, Rgba};
    use std::cell::Cell;

    struct Panel {
        opacity: Cell<f32>,
        color: Cell<Rgba>,
    }

    struct Label;

    fn registry() -> PropertyRegistry {
        let mut registry = PropertyRegistry::new();
        registry.register(
            "opacity",
            Accessor::new(|p: &Panel| p.opacity.get(), |p: &Panel, v| p.opacity.set(v)),
        );
        registry.register(
            "color.a",
            Accessor::new(|p: &Panel| p.color.get(), |p: &Panel, v| p.color.set(v))
                .part(Channel::A),
        );
        registry
    }

    #[test]
    fn test_lookup() {
        let registry = registry();
        let panel = Panel {
            opacity: Cell::new(1.0),
            color: Cell::new(Rgba::BLACK),
        };

        let opacity = registry.get::<Panel, f32>("opacity").unwrap();
        opacity.set(&panel, 0.5);
        assert_eq!(panel.opacity.get(), 0.5);

        let alpha = registry.get::<Panel, f32>("color.a").unwrap();
        assert_eq!(alpha.get(&panel), 1.0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unknown_key() {
        let registry = registry();
        assert_eq!(
            registry.get::<Panel, f32>("scale").err(),
            Some(PropertyError::Unknown("scale".into()))
        );
    }

    #[test]
    fn test_type_mismatch() {
        let registry = registry();
        let err = registry.get::<Panel, Rgba>("opacity").err().unwrap();
        assert!(matches!(err, PropertyError::TypeMismatch { .. }));

        let err = registry.get::<Label, f32>("opacity").err().unwrap();
        assert!(matches!(err, PropertyError::HolderMismatch { .. }));
    }

    #[test]
    fn test_replace_and_remove() {
        let mut registry = registry();
        registry.register(
            "opacity",
            Accessor::new(|p: &Panel| p.opacity.get() * 2.0, |p: &Panel, v| p.opacity.set(v)),
        );
        assert_eq!(registry.len(), 2);
        assert!(registry.remove("opacity"));
        assert!(!registry.contains("opacity"));
    }
}
