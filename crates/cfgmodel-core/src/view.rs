//! Read-only projections over a store's [`RecordMap`].
//!
//! [`KeySet`] and [`CurrentValues`] borrow the backing map instead of copying
//! it: building one is O(1), lookups delegate to the map, and iteration
//! projects each [`ConfigRecord`] to the requested field on the fly. The
//! views expose no mutators, and the borrow they hold keeps the store from
//! being mutated while they are alive.

use std::collections::btree_map;
use std::fmt;
use std::iter::FusedIterator;

use cfgmodel_types::ConfigKey;

use crate::record::{ConfigRecord, RecordMap};

/// The keys of a store.
#[derive(Clone, Copy)]
pub struct KeySet<'a> {
    records: &'a RecordMap,
}

impl<'a> KeySet<'a> {
    pub fn new(records: &'a RecordMap) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Keys in ascending name order.
    pub fn iter(&self) -> btree_map::Keys<'a, ConfigKey, ConfigRecord> {
        self.records.keys()
    }
}

impl<'a> IntoIterator for KeySet<'a> {
    type Item = &'a ConfigKey;
    type IntoIter = btree_map::Keys<'a, ConfigKey, ConfigRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.keys()
    }
}

impl fmt::Debug for KeySet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Key -> current value projection of a store.
#[derive(Clone, Copy)]
pub struct CurrentValues<'a> {
    records: &'a RecordMap,
}

impl<'a> CurrentValues<'a> {
    pub fn new(records: &'a RecordMap) -> Self {
        Self { records }
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.records.get(key).map(ConfigRecord::current_value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> KeySet<'a> {
        KeySet::new(self.records)
    }

    pub fn values(&self) -> Values<'a> {
        Values {
            inner: self.records.values(),
        }
    }

    pub fn iter(&self) -> Iter<'a> {
        Iter {
            inner: self.records.iter(),
        }
    }
}

impl<'a> IntoIterator for CurrentValues<'a> {
    type Item = (&'a ConfigKey, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for CurrentValues<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Current values in key order. Created by [`CurrentValues::values`].
#[derive(Clone)]
pub struct Values<'a> {
    inner: btree_map::Values<'a, ConfigKey, ConfigRecord>,
}

impl<'a> Iterator for Values<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(ConfigRecord::current_value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Values<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(ConfigRecord::current_value)
    }
}

impl ExactSizeIterator for Values<'_> {}
impl FusedIterator for Values<'_> {}

/// `(key, current value)` pairs in key order. Created by
/// [`CurrentValues::iter`].
#[derive(Clone)]
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, ConfigKey, ConfigRecord>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a ConfigKey, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(key, record)| (key, record.current_value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner
            .next_back()
            .map(|(key, record)| (key, record.current_value()))
    }
}

impl ExactSizeIterator for Iter<'_> {}
impl FusedIterator for Iter<'_> {}
