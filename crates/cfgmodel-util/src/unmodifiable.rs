//! Read-only decorator.

use std::fmt;
use std::sync::Arc;

use cfgmodel_core::{
    ConfigError, ConfigModel, ConfigObserver, ConfigRecord, CurrentValues, ExconfigModel, KeySet,
    ObserverFailure, Result, SubscriptionId,
};
use cfgmodel_types::{ConfigEntry, ConfigFirmProps, ParsedValue, SharedParser};

/// Borrows a store and rejects every mutation.
///
/// Reads are forwarded unchanged. Every mutating call, including batch
/// operations with nothing to do, fails with [`ConfigError::Unsupported`]
/// before touching the wrapped store.
pub struct UnmodifiableConfigModel<'a, M: ?Sized> {
    inner: &'a M,
}

impl<'a, M: ConfigModel + ?Sized> UnmodifiableConfigModel<'a, M> {
    pub fn new(inner: &'a M) -> Self {
        Self { inner }
    }

    /// The wrapped store.
    pub fn get_ref(&self) -> &'a M {
        self.inner
    }
}

/// Wrap `model` in an [`UnmodifiableConfigModel`].
pub fn unmodifiable<M: ConfigModel + ?Sized>(model: &M) -> UnmodifiableConfigModel<'_, M> {
    UnmodifiableConfigModel::new(model)
}

impl<M: ?Sized> Clone for UnmodifiableConfigModel<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: ?Sized> Copy for UnmodifiableConfigModel<'_, M> {}

impl<M: fmt::Debug + ?Sized> fmt::Debug for UnmodifiableConfigModel<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnmodifiableConfigModel")
            .field(&self.inner)
            .finish()
    }
}

impl<M: ConfigModel + ?Sized> ConfigModel for UnmodifiableConfigModel<'_, M> {
    fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn key_set(&self) -> KeySet<'_> {
        self.inner.key_set()
    }

    fn current_values(&self) -> CurrentValues<'_> {
        self.inner.current_values()
    }

    fn record(&self, key: &str) -> Option<&ConfigRecord> {
        self.inner.record(key)
    }

    fn firm_props(&self, key: &str) -> Option<&ConfigFirmProps> {
        self.inner.firm_props(key)
    }

    fn current_value(&self, key: &str) -> Option<&str> {
        self.inner.current_value(key)
    }

    fn valid_value(&self, key: &str) -> Option<&str> {
        self.inner.valid_value(key)
    }

    fn is_value_valid(&self, key: &str, value: &str) -> bool {
        self.inner.is_value_valid(key, value)
    }

    fn is_current_value_valid(&self, key: &str) -> bool {
        self.inner.is_current_value_valid(key)
    }

    fn add(&mut self, _entry: ConfigEntry) -> Result<bool> {
        Err(ConfigError::unsupported("add"))
    }

    fn add_all<I>(&mut self, _entries: I) -> Result<bool>
    where
        I: IntoIterator<Item = ConfigEntry>,
        Self: Sized,
    {
        Err(ConfigError::unsupported("add_all"))
    }

    fn remove(&mut self, _key: &str) -> Result<bool> {
        Err(ConfigError::unsupported("remove"))
    }

    fn remove_all<I, K>(&mut self, _keys: I) -> Result<bool>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
        Self: Sized,
    {
        Err(ConfigError::unsupported("remove_all"))
    }

    fn retain_all<I, K>(&mut self, _keys: I) -> Result<bool>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
        Self: Sized,
    {
        Err(ConfigError::unsupported("retain_all"))
    }

    fn clear(&mut self) -> Result<bool> {
        Err(ConfigError::unsupported("clear"))
    }

    fn set_firm_props(&mut self, _key: &str, _firm_props: ConfigFirmProps) -> Result<bool> {
        Err(ConfigError::unsupported("set_firm_props"))
    }

    fn set_current_value(&mut self, _key: &str, _value: &str) -> Result<bool> {
        Err(ConfigError::unsupported("set_current_value"))
    }

    fn set_all_current_value<I, K, V>(&mut self, _values: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
        Self: Sized,
    {
        Err(ConfigError::unsupported("set_all_current_value"))
    }

    fn reset_current_value(&mut self, _key: &str) -> Result<bool> {
        Err(ConfigError::unsupported("reset_current_value"))
    }

    fn reset_all_current_value(&mut self) -> Result<bool>
    where
        Self: Sized,
    {
        Err(ConfigError::unsupported("reset_all_current_value"))
    }

    fn subscribe(&mut self, _observer: Arc<dyn ConfigObserver>) -> Result<SubscriptionId> {
        Err(ConfigError::unsupported("subscribe"))
    }

    fn unsubscribe(&mut self, _id: SubscriptionId) -> Result<bool> {
        Err(ConfigError::unsupported("unsubscribe"))
    }

    fn observer_failures(&self) -> Vec<ObserverFailure> {
        self.inner.observer_failures()
    }

    fn drain_observer_failures(&mut self) -> Result<Vec<ObserverFailure>> {
        Err(ConfigError::unsupported("drain_observer_failures"))
    }
}

impl<M: ExconfigModel + ?Sized> ExconfigModel for UnmodifiableConfigModel<'_, M> {
    fn value_parser(&self, key: &str) -> Option<&SharedParser> {
        self.inner.value_parser(key)
    }

    fn set_value_parser(&mut self, _key: &str, _parser: Option<SharedParser>) -> Result<bool> {
        Err(ConfigError::unsupported("set_value_parser"))
    }

    fn parsed_value(&self, key: &str) -> Result<Option<ParsedValue>> {
        self.inner.parsed_value(key)
    }

    fn set_parsed_value(&mut self, _key: &str, _value: &ParsedValue) -> Result<bool> {
        Err(ConfigError::unsupported("set_parsed_value"))
    }
}
