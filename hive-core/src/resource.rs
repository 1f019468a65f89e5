//! Shared backend resources and the keys they are cached under.

use crate::memory::Memory;
use crate::model::ModelClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Identity under which a backend resource is cached.
///
/// Two configurations that derive the same key share one connection.
/// Keys of different variants never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceKey {
    /// A model connection.
    Model {
        /// Provider identifier.
        provider: String,
        /// Model identifier. `None` for providers that share one client
        /// across every model.
        model: Option<String>,
        /// Canonical JSON of the significant extra parameters.
        params: String,
    },
    /// A memory resource, identified by its declared name.
    Memory {
        /// Declared memory name.
        name: String,
    },
}

impl ResourceKey {
    /// Key for a model connection. `params` may be given in any order.
    pub fn model(
        provider: impl Into<String>,
        model: Option<String>,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let mut canonical = String::new();
        write_canonical(&serde_json::Value::Object(params.clone()), &mut canonical);
        ResourceKey::Model {
            provider: provider.into(),
            model,
            params: canonical,
        }
    }

    /// Key for a memory resource.
    pub fn memory(name: impl Into<String>) -> Self {
        ResourceKey::Memory { name: name.into() }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKey::Model {
                provider,
                model,
                params,
            } => {
                write!(f, "model:{provider}")?;
                if let Some(model) = model {
                    write!(f, "/{model}")?;
                }
                if params != "{}" {
                    write!(f, "{params}")?;
                }
                Ok(())
            }
            ResourceKey::Memory { name } => write!(f, "memory:{name}"),
        }
    }
}

/// Serialize with object keys sorted, independent of map ordering features.
fn write_canonical(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// A shared backend resource.
///
/// Cloning a handle shares the underlying resource; it never opens a new
/// connection. Only the factory that created a handle may close the
/// resource behind it.
///
/// A handle derefs to the whole resource, `close` included. Holders such as
/// agents must never call it: the owning factory closes each resource once,
/// when it is torn down, and a handle closed early breaks every other
/// holder of the same key.
pub struct Handle<T: ?Sized> {
    key: ResourceKey,
    inner: Arc<T>,
}

/// A shared model connection.
pub type ModelHandle = Handle<dyn ModelClient>;

/// A shared memory resource.
pub type MemoryHandle = Handle<dyn Memory>;

impl<T: ?Sized> Handle<T> {
    /// Wrap a resource under its cache key.
    pub fn new(key: ResourceKey, inner: Arc<T>) -> Self {
        Self { key, inner }
    }

    /// The key this resource is cached under.
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// The shared resource.
    pub fn resource(&self) -> &Arc<T> {
        &self.inner
    }

    /// Whether two handles refer to the same underlying resource.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Number of live references to the resource, including this one.
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("key", &self.key).finish()
    }
}
