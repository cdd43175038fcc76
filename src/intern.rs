//! Identity-interned names for type and member identifiers.
//!
//! Identifiers extracted from type-name strings and attribute blobs are
//! interned through a [`NamePool`] so that equal strings share one allocation
//! and compare by pointer. The pool is an explicit capability passed into the
//! scanner and decoders, not a process-wide singleton: independent decode
//! sessions can keep separate pools, and sessions that share one (for
//! example, concurrent loads of modules in the same universe) get thread-safe
//! lookup-or-create semantics from the underlying [`dashmap::DashMap`].

use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    sync::Arc,
};

use dashmap::DashMap;

/// An interned identifier.
///
/// Two `Name`s are equal when they came from the same [`NamePool`] entry;
/// equality and hashing work on the pointer, not the characters. Names from
/// different pools never compare equal even when their text matches - compare
/// [`Name::as_str`] when crossing pool boundaries.
#[derive(Clone)]
pub struct Name(Arc<str>);

impl Name {
    /// The interned text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Name {}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// A lookup-or-create table of interned [`Name`]s.
///
/// Interning is idempotent: `get_or_intern` for the same text always returns
/// the same `Name` for the lifetime of the pool. Concurrent calls are safe;
/// the map serializes racing inserts so only one allocation wins.
#[derive(Default)]
pub struct NamePool {
    table: DashMap<String, Name>,
}

impl NamePool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        NamePool {
            table: DashMap::new(),
        }
    }

    /// Intern `text`, returning the canonical [`Name`] for it.
    pub fn get_or_intern(&self, text: &str) -> Name {
        if let Some(existing) = self.table.get(text) {
            return existing.value().clone();
        }

        self.table
            .entry(text.to_string())
            .or_insert_with(|| Name(Arc::from(text)))
            .value()
            .clone()
    }

    /// Number of distinct names interned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if nothing has been interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
