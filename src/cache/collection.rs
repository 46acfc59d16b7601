use std::collections::HashMap;
use std::future::Future;

use crate::cloudfoundry::{self, Resource};
use crate::error::ResultOkLogExt;

/// The most recently fetched snapshot of a single resource type.
///
/// Lookups by GUID and by name go through separate indices that are rebuilt
/// from scratch whenever a fetch succeeds. A failed fetch keeps the previous
/// snapshot and marks the collection invalid.
#[derive(Debug)]
pub struct ResourceCollection<T> {
    valid: bool,
    items: Vec<T>,
    by_guid: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl<T> Default for ResourceCollection<T> {
    fn default() -> Self {
        Self {
            valid: false,
            items: Vec::new(),
            by_guid: HashMap::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T: Resource> ResourceCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if the most recent fetch succeeded.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// All resources, in the order the controller returned them.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_by_guid(&self, guid: &str) -> Option<&T> {
        self.by_guid.get(guid).map(|&idx| &self.items[idx])
    }

    /// Looks up a resource by name. Only populated for resource types that
    /// have a name; on duplicate names the last resource wins.
    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.by_name.get(name).map(|&idx| &self.items[idx])
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterates over the names in the name index.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Awaits `fetch` and applies its result.
    pub async fn refresh<F>(&mut self, fetch: F)
    where
        F: Future<Output = cloudfoundry::Result<Vec<T>>>,
    {
        self.apply(fetch.await);
    }

    /// Replaces the snapshot on success. On failure the previous snapshot is
    /// kept untouched and the collection is marked invalid.
    pub fn apply(&mut self, result: cloudfoundry::Result<Vec<T>>) {
        let Some(items) = result.ok_log("cache", format_args!("failed refreshing {}", T::KIND))
        else {
            self.valid = false;
            return;
        };

        let mut by_guid = HashMap::with_capacity(items.len());
        let mut by_name = HashMap::new();
        for (idx, item) in items.iter().enumerate() {
            by_guid.insert(item.guid().to_owned(), idx);
            if let Some(name) = item.name() {
                by_name.insert(name.to_owned(), idx);
            }
        }

        self.items = items;
        self.by_guid = by_guid;
        self.by_name = by_name;
        self.valid = true;
    }
}
