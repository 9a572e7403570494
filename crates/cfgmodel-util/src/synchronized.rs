//! Thread-safe shared handle over a store.
//!
//! [`SynchronizedConfigModel`] puts a store behind one `RwLock`. Every read
//! holds the read lock for the duration of the call and returns owned data;
//! every mutation holds the write lock. Batch operations run under a single
//! write lock, so other threads never observe them half-applied, provided the
//! store catches observer panics (the default). With
//! `ModelConfig::propagate_panics()` a panicking observer unwinds out of the
//! batch and poisons the lock with only part of the batch applied.
//!
//! Callers that need several operations to be atomic with respect to other
//! writers take a guard with [`SynchronizedConfigModel::read`] or
//! [`SynchronizedConfigModel::write`] and use the store directly through it.
//!
//! Observers run while the write lock is held. An observer that calls back
//! into the same handle will deadlock.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

use cfgmodel_core::{
    ConfigError, ConfigModel, ConfigObserver, ConfigRecord, ExconfigModel, ObserverFailure, Result,
    SubscriptionId,
};
use cfgmodel_types::{ConfigEntry, ConfigFirmProps, ConfigKey, ParsedValue, SharedParser, TypeError};

/// Cloneable, `Send + Sync` handle to a shared store.
///
/// Clones share the same store and the same lock.
pub struct SynchronizedConfigModel<M> {
    inner: Arc<RwLock<M>>,
}

impl<M> Clone for SynchronizedConfigModel<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: fmt::Debug> fmt::Debug for SynchronizedConfigModel<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Ok(model) => f
                .debug_tuple("SynchronizedConfigModel")
                .field(&*model)
                .finish(),
            Err(_) => f.write_str("SynchronizedConfigModel(<locked>)"),
        }
    }
}

impl<M: Default> Default for SynchronizedConfigModel<M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

impl<M> SynchronizedConfigModel<M> {
    pub fn new(model: M) -> Self {
        Self {
            inner: Arc::new(RwLock::new(model)),
        }
    }

    /// Acquire the read lock, blocking until no writer holds it.
    ///
    /// A lock poisoned by a panicking writer is recovered for reading. Single
    /// mutations are applied before observers run, so they are complete; a
    /// batch interrupted by a propagated observer panic is visible as
    /// partially applied.
    pub fn read(&self) -> RwLockReadGuard<'_, M> {
        self.inner.read().unwrap_or_else(|poisoned| {
            warn!("config model lock poisoned; reading recovered state");
            poisoned.into_inner()
        })
    }

    /// Acquire the write lock, blocking until every other holder releases
    /// it.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, M>> {
        self.inner
            .write()
            .map_err(|e| ConfigError::LockPoisoned(format!("config model write lock: {e}")))
    }

    /// Number of handles sharing the store.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Take the store back if this is the last handle, otherwise return the
    /// handle unchanged.
    pub fn into_inner(self) -> std::result::Result<M, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(lock) => Ok(lock.into_inner().unwrap_or_else(|p| p.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }
}

impl<M: ConfigModel> SynchronizedConfigModel<M> {
    // ---- reads ----

    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the key set, in key order.
    pub fn keys(&self) -> Vec<ConfigKey> {
        self.read().key_set().iter().cloned().collect()
    }

    /// Copy of every current value, taken under one read lock.
    pub fn current_values(&self) -> BTreeMap<ConfigKey, String> {
        self.read()
            .current_values()
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    pub fn record(&self, key: &str) -> Option<ConfigRecord> {
        self.read().record(key).cloned()
    }

    pub fn firm_props(&self, key: &str) -> Option<ConfigFirmProps> {
        self.read().firm_props(key).cloned()
    }

    pub fn current_value(&self, key: &str) -> Option<String> {
        self.read().current_value(key).map(str::to_string)
    }

    pub fn valid_value(&self, key: &str) -> Option<String> {
        self.read().valid_value(key).map(str::to_string)
    }

    pub fn is_value_valid(&self, key: &str, value: &str) -> bool {
        self.read().is_value_valid(key, value)
    }

    pub fn is_current_value_valid(&self, key: &str) -> bool {
        self.read().is_current_value_valid(key)
    }

    pub fn observer_failures(&self) -> Vec<ObserverFailure> {
        self.read().observer_failures()
    }

    // ---- mutations ----

    pub fn add(&self, entry: ConfigEntry) -> Result<bool> {
        self.write()?.add(entry)
    }

    pub fn add_all<I>(&self, entries: I) -> Result<bool>
    where
        I: IntoIterator<Item = ConfigEntry>,
    {
        self.write()?.add_all(entries)
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        self.write()?.remove(key)
    }

    pub fn remove_all<I, K>(&self, keys: I) -> Result<bool>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.write()?.remove_all(keys)
    }

    pub fn retain_all<I, K>(&self, keys: I) -> Result<bool>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.write()?.retain_all(keys)
    }

    pub fn clear(&self) -> Result<bool> {
        self.write()?.clear()
    }

    pub fn set_firm_props(&self, key: &str, firm_props: ConfigFirmProps) -> Result<bool> {
        self.write()?.set_firm_props(key, firm_props)
    }

    pub fn set_current_value(&self, key: &str, value: &str) -> Result<bool> {
        self.write()?.set_current_value(key, value)
    }

    pub fn set_all_current_value<I, K, V>(&self, values: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.write()?.set_all_current_value(values)
    }

    pub fn reset_current_value(&self, key: &str) -> Result<bool> {
        self.write()?.reset_current_value(key)
    }

    pub fn reset_all_current_value(&self) -> Result<bool> {
        self.write()?.reset_all_current_value()
    }

    pub fn subscribe(&self, observer: Arc<dyn ConfigObserver>) -> Result<SubscriptionId> {
        self.write()?.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        self.write()?.unsubscribe(id)
    }

    pub fn drain_observer_failures(&self) -> Result<Vec<ObserverFailure>> {
        self.write()?.drain_observer_failures()
    }
}

impl<M: ExconfigModel> SynchronizedConfigModel<M> {
    pub fn value_parser(&self, key: &str) -> Option<SharedParser> {
        self.read().value_parser(key).cloned()
    }

    pub fn set_value_parser(&self, key: &str, parser: Option<SharedParser>) -> Result<bool> {
        self.write()?.set_value_parser(key, parser)
    }

    pub fn parsed_value(&self, key: &str) -> Result<Option<ParsedValue>> {
        self.read().parsed_value(key)
    }

    pub fn parsed_value_as<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: TryFrom<ParsedValue, Error = TypeError>,
    {
        self.read().parsed_value_as(key)
    }

    pub fn set_parsed_value(&self, key: &str, value: &ParsedValue) -> Result<bool> {
        self.write()?.set_parsed_value(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use cfgmodel_core::{DefaultConfigModel, ModelConfig, ObserverResult};
    use cfgmodel_types::{AnyValue, IntegerParser, IntegerRange};

    fn shared() -> SynchronizedConfigModel<DefaultConfigModel> {
        let model = DefaultConfigModel::from_entries(vec![ConfigEntry::new(
            "server.port",
            ConfigFirmProps::with_checker("8080", IntegerRange::port()).unwrap(),
        )
        .with_parser(Arc::new(IntegerParser))]);
        SynchronizedConfigModel::new(model)
    }

    fn counter_entry(name: &str) -> ConfigEntry {
        ConfigEntry::new(
            name,
            ConfigFirmProps::with_checker("0", IntegerRange::any()).unwrap(),
        )
    }

    #[test]
    fn operations_forward_through_the_lock() {
        let model = shared();
        assert_eq!(model.len(), 1);
        assert!(model.set_current_value("server.port", "99999").unwrap());
        assert_eq!(model.current_value("server.port").as_deref(), Some("99999"));
        assert_eq!(model.valid_value("server.port").as_deref(), Some("8080"));
        assert!(!model.is_current_value_valid("server.port"));
        assert!(model.reset_current_value("server.port").unwrap());
        assert_eq!(model.parsed_value_as::<u16>("server.port").unwrap(), Some(8080));
        assert!(model
            .set_parsed_value("server.port", &ParsedValue::Int(443))
            .unwrap());
        assert_eq!(model.current_values()[&ConfigKey::new("server.port")], "443");
        assert!(!model.remove("missing").unwrap());
    }

    #[test]
    fn clones_share_one_store() {
        let a = shared();
        let b = a.clone();
        assert_eq!(a.handle_count(), 2);
        b.add(counter_entry("hits")).unwrap();
        assert!(a.contains_key("hits"));
        assert_eq!(a.keys(), vec![ConfigKey::new("hits"), ConfigKey::new("server.port")]);

        let a = a.into_inner().unwrap_err();
        drop(b);
        let model = a.into_inner().unwrap();
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn concurrent_writers_are_serialized() {
        let model = shared();
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let model = model.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let name = format!("t{t}.k{i}");
                        model.add(counter_entry(&name)).unwrap();
                        model.set_current_value(&name, &i.to_string()).unwrap();
                    }
                })
            })
            .collect();
        for handle in threads {
            handle.join().unwrap();
        }

        assert_eq!(model.len(), 8 * 50 + 1);
        assert_eq!(model.current_value("t3.k49").as_deref(), Some("49"));
    }

    #[test]
    fn guard_makes_multi_step_reads_atomic() {
        let model = shared();
        model
            .add_all((0..10).map(|i| counter_entry(&format!("k{i}"))))
            .unwrap();

        let writer = {
            let model = model.clone();
            thread::spawn(move || {
                for round in 0..100 {
                    let value = round.to_string();
                    let keys: Vec<String> = (0..10).map(|i| format!("k{i}")).collect();
                    model
                        .set_all_current_value(keys.iter().map(|k| (k.as_str(), value.as_str())))
                        .unwrap();
                }
            })
        };

        for _ in 0..100 {
            let guard = model.read();
            let values: Vec<&str> = guard
                .key_set()
                .iter()
                .filter(|k| k.starts_with('k'))
                .filter_map(|k| guard.current_value(k))
                .collect();
            assert_eq!(values.len(), 10);
            assert!(values.iter().all(|v| *v == values[0]), "torn read: {values:?}");
        }
        writer.join().unwrap();
    }

    #[test]
    fn observers_run_under_the_write_lock() {
        struct Counting(AtomicUsize);

        impl ConfigObserver for Counting {
            fn current_value_changed(
                &self,
                _: &ConfigKey,
                _: &str,
                _: &str,
                _: &str,
            ) -> ObserverResult {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let model = shared();
        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        let id = model.subscribe(counter.clone()).unwrap();

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let model = model.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        model.set_current_value("server.port", "9090").unwrap();
                    }
                })
            })
            .collect();
        for handle in threads {
            handle.join().unwrap();
        }

        assert_eq!(counter.0.load(Ordering::SeqCst), 100);
        assert!(model.unsubscribe(id).unwrap());
    }

    #[test]
    fn poisoned_lock_fails_writes_but_not_reads() {
        struct Exploding;

        impl ConfigObserver for Exploding {
            fn config_key_added(&self, _: &ConfigRecord) -> ObserverResult {
                panic!("observer exploded");
            }
        }

        let mut inner = DefaultConfigModel::with_config(ModelConfig::propagate_panics());
        inner.subscribe(Arc::new(Exploding)).unwrap();
        let model = SynchronizedConfigModel::new(inner);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = model.add(ConfigEntry::new(
                "x",
                ConfigFirmProps::with_checker("1", AnyValue).unwrap(),
            ));
        }));
        assert!(result.is_err());

        assert!(model.contains_key("x"));
        assert_eq!(model.current_value("x").as_deref(), Some("1"));
        assert!(matches!(
            model.set_current_value("x", "2"),
            Err(ConfigError::LockPoisoned(_))
        ));
    }

    #[test]
    fn propagated_panic_leaves_batch_partially_applied() {
        struct Exploding;

        impl ConfigObserver for Exploding {
            fn config_key_added(&self, _: &ConfigRecord) -> ObserverResult {
                panic!("observer exploded");
            }
        }

        let mut inner = DefaultConfigModel::with_config(ModelConfig::propagate_panics());
        inner.subscribe(Arc::new(Exploding)).unwrap();
        let model = SynchronizedConfigModel::new(inner);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = model.add_all(["a", "b", "c"].map(counter_entry));
        }));
        assert!(result.is_err());
        assert_eq!(model.keys(), vec![ConfigKey::new("a")]);
    }

    #[test]
    fn caught_panics_keep_batches_whole() {
        struct Exploding;

        impl ConfigObserver for Exploding {
            fn config_key_added(&self, _: &ConfigRecord) -> ObserverResult {
                panic!("observer exploded");
            }
        }

        let model = SynchronizedConfigModel::new(DefaultConfigModel::new());
        model.subscribe(Arc::new(Exploding)).unwrap();
        assert!(model.add_all(["a", "b", "c"].map(counter_entry)).unwrap());
        assert_eq!(model.len(), 3);
        assert_eq!(model.observer_failures().len(), 3);
        assert!(model.write().is_ok());
    }

    #[test]
    fn handle_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SynchronizedConfigModel<DefaultConfigModel>>();
    }
}
