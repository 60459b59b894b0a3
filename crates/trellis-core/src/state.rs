//! Shared state store
//!
//! Flat key/value store with per-key change watchers. Watchers fire
//! synchronously, in registration order, after the entry mutates and only
//! when the value actually changed. No guarantee exists across different
//! keys' watcher batches.

use std::collections::BTreeMap;

/// A single state change, handed to watchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange<V> {
    /// The key that changed.
    pub key: String,
    /// Previous value. `None` when the entry was created.
    pub old_value: Option<V>,
    /// New value. `None` when the entry was deleted.
    pub new_value: Option<V>,
}

type Watcher<V> = Box<dyn FnMut(&StateChange<V>) + Send>;

/// Identifies a registered watcher, for [`StateManager::unwatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle(u64);

/// Key/value store with change notification, generic over the value type.
///
/// Entries are created on first [`StateManager::set`] and updated
/// thereafter. Change detection requires `V: PartialEq`; an unchanged set
/// is a no-op.
pub struct StateManager<V> {
    entries: BTreeMap<String, V>,
    watchers: BTreeMap<String, Vec<(u64, Watcher<V>)>>,
    next_watcher: u64,
}

impl<V: std::fmt::Debug> std::fmt::Debug for StateManager<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("entries", &self.entries)
            .field("watched_keys", &self.watchers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<V> Default for StateManager<V> {
    fn default() -> Self {
        Self { entries: BTreeMap::new(), watchers: BTreeMap::new(), next_watcher: 0 }
    }
}

impl<V: Clone + PartialEq> StateManager<V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with initial entries. Watchers do not fire.
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            watchers: BTreeMap::new(),
            next_watcher: 0,
        }
    }

    /// Value for `key`, or `default` when absent.
    pub fn get(&self, key: &str, default: V) -> V {
        self.entries.get(key).cloned().unwrap_or(default)
    }

    /// Value for `key`, if present.
    pub fn try_get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Whether `key` has an entry.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Copy of the full entry map.
    pub fn snapshot(&self) -> BTreeMap<String, V> {
        self.entries.clone()
    }

    /// Set `key` to `value`.
    ///
    /// Watchers for `key` run to completion, in registration order, before
    /// this returns. A set to the current value is a no-op and fires
    /// nothing.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();

        let old_value = self.entries.get(&key).cloned();
        if old_value.as_ref() == Some(&value) {
            return;
        }

        self.entries.insert(key.clone(), value.clone());
        self.notify(StateChange { key, old_value, new_value: Some(value) });
    }

    /// Apply every entry of `updates`, firing each affected key's watchers
    /// once.
    pub fn update<I, K>(&mut self, updates: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        for (key, value) in updates {
            self.set(key, value);
        }
    }

    /// Remove `key`, firing its watchers with `new_value: None`.
    pub fn delete(&mut self, key: &str) {
        let Some(old_value) = self.entries.remove(key) else {
            return;
        };
        self.notify(StateChange {
            key: key.to_owned(),
            old_value: Some(old_value),
            new_value: None,
        });
    }

    /// Replace the entire store, firing watchers for every key that
    /// changes, appears, or disappears.
    pub fn replace(&mut self, entries: BTreeMap<String, V>) {
        let removed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| !entries.contains_key(*key))
            .cloned()
            .collect();
        for key in removed {
            self.delete(&key);
        }
        self.update(entries);
    }

    /// Remove every entry, firing each key's watchers with
    /// `new_value: None`, as [`StateManager::delete`] would.
    pub fn clear(&mut self) {
        let keys: Vec<String> = self.entries.keys().cloned().collect();
        for key in keys {
            self.delete(&key);
        }
    }

    /// Register a watcher for `key`. The handle deregisters it later.
    pub fn watch(
        &mut self,
        key: impl Into<String>,
        watcher: impl FnMut(&StateChange<V>) + Send + 'static,
    ) -> WatchHandle {
        let handle = WatchHandle(self.next_watcher);
        self.next_watcher += 1;
        self.watchers.entry(key.into()).or_default().push((handle.0, Box::new(watcher)));
        handle
    }

    /// Deregister the watcher behind `handle`. Returns whether it was still
    /// registered.
    pub fn unwatch(&mut self, handle: WatchHandle) -> bool {
        for watchers in self.watchers.values_mut() {
            if let Some(position) = watchers.iter().position(|(id, _)| *id == handle.0) {
                let _ = watchers.remove(position);
                return true;
            }
        }
        false
    }

    fn notify(&mut self, change: StateChange<V>) {
        if let Some(watchers) = self.watchers.get_mut(&change.key) {
            for (_, watcher) in watchers.iter_mut() {
                watcher(&change);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Seen = Arc<Mutex<Vec<StateChange<String>>>>;

    fn recorder() -> (Seen, impl FnMut(&StateChange<String>) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let watcher = move |change: &StateChange<String>| {
            if let Ok(mut seen) = sink.lock() {
                seen.push(change.clone());
            }
        };
        (seen, watcher)
    }

    fn drain(seen: &Seen) -> Vec<StateChange<String>> {
        seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    #[test]
    fn set_then_get_returns_value() {
        let mut state = StateManager::new();
        state.set("current_layer", "core".to_owned());
        assert_eq!(state.get("current_layer", String::new()), "core");
        assert_eq!(state.try_get("missing"), None);
        assert_eq!(state.get("missing", "fallback".to_owned()), "fallback");
    }

    #[test]
    fn watcher_fires_once_with_old_and_new() {
        let mut state = StateManager::new();
        let (seen, watcher) = recorder();
        state.watch("current_layer", watcher);

        state.set("current_layer", "core".to_owned());
        state.set("current_layer", "api".to_owned());

        assert_eq!(drain(&seen), vec![
            StateChange {
                key: "current_layer".into(),
                old_value: None,
                new_value: Some("core".into())
            },
            StateChange {
                key: "current_layer".into(),
                old_value: Some("core".into()),
                new_value: Some("api".into())
            },
        ]);
    }

    #[test]
    fn unchanged_set_fires_nothing() {
        let mut state = StateManager::new();
        let (seen, watcher) = recorder();
        state.watch("k", watcher);

        state.set("k", "v".to_owned());
        state.set("k", "v".to_owned());

        assert_eq!(drain(&seen).len(), 1);
    }

    #[test]
    fn watchers_fire_in_registration_order() {
        let mut state: StateManager<String> = StateManager::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            state.watch("k", move |_| {
                if let Ok(mut order) = order.lock() {
                    order.push(tag);
                }
            });
        }

        state.set("k", "v".to_owned());
        assert_eq!(
            order.lock().map(|o| o.clone()).unwrap_or_default(),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn update_fires_each_touched_key_once() {
        let mut state = StateManager::new();
        let (seen_a, watcher_a) = recorder();
        let (seen_b, watcher_b) = recorder();
        state.watch("a", watcher_a);
        state.watch("b", watcher_b);

        state.update([("a", "1".to_owned()), ("b", "2".to_owned())]);

        assert_eq!(drain(&seen_a).len(), 1);
        assert_eq!(drain(&seen_b).len(), 1);
    }

    #[test]
    fn delete_fires_with_none_new_value() {
        let mut state = StateManager::new();
        let (seen, watcher) = recorder();
        state.watch("k", watcher);

        state.set("k", "v".to_owned());
        state.delete("k");
        state.delete("k"); // absent, no event

        let seen = drain(&seen);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].new_value, None);
        assert!(!state.has("k"));
    }

    #[test]
    fn unwatch_stops_notifications() {
        let mut state = StateManager::new();
        let (seen, watcher) = recorder();
        let handle = state.watch("k", watcher);

        state.set("k", "v".to_owned());
        assert!(state.unwatch(handle));
        assert!(!state.unwatch(handle));
        state.set("k", "w".to_owned());

        assert_eq!(drain(&seen).len(), 1);
    }

    #[test]
    fn unwatch_leaves_other_watchers_registered() {
        let mut state = StateManager::new();
        let (seen_first, watcher_first) = recorder();
        let (seen_second, watcher_second) = recorder();
        let first = state.watch("k", watcher_first);
        let _second = state.watch("k", watcher_second);

        state.unwatch(first);
        state.set("k", "v".to_owned());

        assert!(drain(&seen_first).is_empty());
        assert_eq!(drain(&seen_second).len(), 1);
    }

    #[test]
    fn clear_fires_delete_events_and_empties_the_store() {
        let mut state =
            StateManager::with_entries([("a", "1".to_owned()), ("b", "2".to_owned())]);
        let (seen, watcher) = recorder();
        state.watch("a", watcher);

        state.clear();

        assert_eq!(state.keys().count(), 0);
        let seen = drain(&seen);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].old_value, Some("1".to_owned()));
        assert_eq!(seen[0].new_value, None);
    }

    #[test]
    fn replace_reconciles_added_changed_and_removed_keys() {
        let mut state =
            StateManager::with_entries([("stale", "x".to_owned()), ("kept", "old".to_owned())]);
        let (seen, watcher) = recorder();
        state.watch("stale", watcher);

        state.replace(BTreeMap::from([
            ("kept".to_owned(), "new".to_owned()),
            ("added".to_owned(), "1".to_owned()),
        ]));

        assert!(!state.has("stale"));
        assert_eq!(state.get("kept", String::new()), "new");
        assert_eq!(state.get("added", String::new()), "1");
        let seen = drain(&seen);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].new_value, None);
    }
}
