//! Immutable request-scoped values attached to a [`Context`](super::Context).

use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

/// Key under which a value is attached to a context.
///
/// Keys compare by name, so each attachment site should declare its key once
/// as a constant and share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(&'static str);

impl Key {
    /// Declare a new key.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The key's name.
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Errors returned by value lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// No value was attached under the key.
    #[error("no value attached for key `{0}`")]
    NotFound(Key),

    /// A value exists but has a different type than requested.
    #[error("value for key `{key}` is not a `{expected}`")]
    WrongType { key: Key, expected: &'static str },
}

/// One link in the chain of attached values. Newest entries shadow older ones.
pub(crate) struct Entry {
    key: Key,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<Entry>>,
}

impl Entry {
    pub(crate) fn push<T>(parent: Option<Arc<Entry>>, key: Key, value: T) -> Arc<Entry>
    where
        T: Any + Send + Sync,
    {
        Arc::new(Entry {
            key,
            value: Arc::new(value),
            parent,
        })
    }

    pub(crate) fn lookup<T>(mut entry: Option<&Entry>, key: Key) -> Result<&T, ValueError>
    where
        T: Any + Send + Sync,
    {
        while let Some(current) = entry {
            if current.key == key {
                return current
                    .value
                    .downcast_ref::<T>()
                    .ok_or(ValueError::WrongType {
                        key,
                        expected: std::any::type_name::<T>(),
                    });
            }
            entry = current.parent.as_deref();
        }
        Err(ValueError::NotFound(key))
    }
}
