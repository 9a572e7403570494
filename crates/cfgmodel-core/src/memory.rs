//! In-memory configuration store.
//!
//! [`DefaultConfigModel`] keeps one [`ConfigRecord`] per key in a `BTreeMap`
//! and notifies observers through an [`ObserverRegistry`]. It provides no
//! internal synchronization: share it across threads through
//! `cfgmodel_util::SynchronizedConfigModel`.

use std::fmt;
use std::mem;
use std::sync::Arc;

use tracing::debug;

use cfgmodel_types::{ConfigEntry, ConfigFirmProps, SharedParser};

use crate::config::ModelConfig;
use crate::error::Result;
use crate::observer::{
    ConfigEventKind, ConfigObserver, ObserverFailure, ObserverRegistry, SubscriptionId,
};
use crate::record::{ConfigRecord, RecordMap};
use crate::traits::{ConfigModel, ExconfigModel};
use crate::view::{CurrentValues, KeySet};

/// The standard [`ConfigModel`] / [`ExconfigModel`] implementation.
pub struct DefaultConfigModel {
    records: RecordMap,
    observers: ObserverRegistry,
    config: ModelConfig,
}

impl DefaultConfigModel {
    /// Create an empty store with the default [`ModelConfig`].
    pub fn new() -> Self {
        Self::with_config(ModelConfig::default())
    }

    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            records: RecordMap::new(),
            observers: ObserverRegistry::new(&config),
            config,
        }
    }

    /// Create a store pre-populated with `entries`. Later duplicates of a key
    /// are ignored, as with [`ConfigModel::add`].
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ConfigEntry>,
    {
        let mut model = Self::new();
        for entry in entries {
            if !model.records.contains_key(&*entry.key) {
                let record = ConfigRecord::from_entry(entry);
                model.records.insert(record.key.clone(), record);
            }
        }
        model
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Number of active subscriptions.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl Default for DefaultConfigModel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultConfigModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultConfigModel")
            .field("records", &self.records.values().collect::<Vec<_>>())
            .field("observers", &self.observers)
            .finish()
    }
}

impl ConfigModel for DefaultConfigModel {
    fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn key_set(&self) -> KeySet<'_> {
        KeySet::new(&self.records)
    }

    fn current_values(&self) -> CurrentValues<'_> {
        CurrentValues::new(&self.records)
    }

    fn record(&self, key: &str) -> Option<&ConfigRecord> {
        self.records.get(key)
    }

    fn add(&mut self, entry: ConfigEntry) -> Result<bool> {
        if self.records.contains_key(&*entry.key) {
            debug!(key = %entry.key, "config key already present");
            return Ok(false);
        }
        let record = ConfigRecord::from_entry(entry);
        let key = record.key.clone();
        let record = &*self.records.entry(key).or_insert(record);

        debug!(key = %record.key, "config key added");
        self.observers.notify(ConfigEventKind::KeyAdded, Some(&record.key), |o| {
            o.config_key_added(record)
        });
        Ok(true)
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        let Some(record) = self.records.remove(key) else {
            return Ok(false);
        };

        debug!(key = %record.key, "config key removed");
        self.observers.notify(ConfigEventKind::KeyRemoved, Some(&record.key), |o| {
            o.config_key_removed(&record)
        });
        Ok(true)
    }

    fn clear(&mut self) -> Result<bool> {
        if self.records.is_empty() {
            return Ok(false);
        }
        let removed = self.records.len();
        self.records.clear();

        debug!(removed, "config keys cleared");
        self.observers
            .notify(ConfigEventKind::KeyCleared, None, |o| o.config_key_cleared());
        Ok(true)
    }

    fn set_firm_props(&mut self, key: &str, firm_props: ConfigFirmProps) -> Result<bool> {
        let Some(record) = self.records.get_mut(key) else {
            return Ok(false);
        };
        let old = mem::replace(&mut record.firm_props, firm_props);

        debug!(
            key = %record.key,
            default = record.firm_props.default_value(),
            "firm props replaced"
        );
        self.observers
            .notify(ConfigEventKind::FirmPropsChanged, Some(&record.key), |o| {
                o.firm_props_changed(&record.key, &old, &record.firm_props)
            });
        Ok(true)
    }

    fn set_current_value(&mut self, key: &str, value: &str) -> Result<bool> {
        let Some(record) = self.records.get_mut(key) else {
            return Ok(false);
        };
        let old = mem::replace(&mut record.current_value, value.to_string());
        let valid = record.valid_value();

        debug!(key = %record.key, value, valid, "current value set");
        self.observers
            .notify(ConfigEventKind::CurrentValueChanged, Some(&record.key), |o| {
                o.current_value_changed(&record.key, &old, &record.current_value, valid)
            });
        Ok(true)
    }

    fn reset_current_value(&mut self, key: &str) -> Result<bool> {
        let Some(default) = self
            .records
            .get(key)
            .map(|r| r.firm_props.default_value().to_string())
        else {
            return Ok(false);
        };
        self.set_current_value(key, &default)
    }

    fn subscribe(&mut self, observer: Arc<dyn ConfigObserver>) -> Result<SubscriptionId> {
        let id = self.observers.subscribe(observer);
        debug!(subscription = %id, "observer subscribed");
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> Result<bool> {
        let removed = self.observers.unsubscribe(id);
        if removed {
            debug!(subscription = %id, "observer unsubscribed");
        }
        Ok(removed)
    }

    fn observer_failures(&self) -> Vec<ObserverFailure> {
        self.observers.failures()
    }

    fn drain_observer_failures(&mut self) -> Result<Vec<ObserverFailure>> {
        Ok(self.observers.drain_failures())
    }
}

impl ExconfigModel for DefaultConfigModel {
    fn set_value_parser(&mut self, key: &str, parser: Option<SharedParser>) -> Result<bool> {
        let Some(record) = self.records.get_mut(key) else {
            return Ok(false);
        };
        let old = mem::replace(&mut record.parser, parser);

        debug!(
            key = %record.key,
            parser = record.parser.as_ref().map(|p| p.name()),
            "value parser replaced"
        );
        self.observers
            .notify(ConfigEventKind::ValueParserChanged, Some(&record.key), |o| {
                o.value_parser_changed(&record.key, old.as_ref(), record.parser.as_ref())
            });
        Ok(true)
    }
}
