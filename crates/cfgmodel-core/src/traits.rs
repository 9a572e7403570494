//! The [`ConfigModel`] and [`ExconfigModel`] traits defining the store
//! contract.
//!
//! Stores and decorators implement these traits. Reads take `&self` and never
//! fail; mutations take `&mut self` and return `Result<bool>`, where
//! `Ok(false)` means "nothing changed" and `Err` means misuse (for example a
//! mutation through a read-only handle).

use std::collections::HashSet;
use std::sync::Arc;

use cfgmodel_types::{ConfigEntry, ConfigFirmProps, ParsedValue, SharedParser, TypeError};

use crate::error::{ConfigError, Result};
use crate::observer::{ConfigObserver, ObserverFailure, SubscriptionId};
use crate::record::ConfigRecord;
use crate::view::{CurrentValues, KeySet};

/// Key/value store separating immutable firm properties from a mutable
/// current value.
///
/// All implementations must satisfy these invariants:
/// - A key is present iff it has firm properties.
/// - [`Self::valid_value`] is a pure function of the current value and the
///   firm properties: the current value if it passes the checker, else the
///   default.
/// - Adding a present key is a no-op, never an overwrite.
/// - Current values are stored as written; the checker is applied on read.
/// - Every successful mutation notifies each subscribed observer once, and a
///   failing observer never fails the mutation.
pub trait ConfigModel {
    // ---- queries ----

    fn contains_key(&self, key: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-only view of the keys.
    fn key_set(&self) -> KeySet<'_>;

    /// Read-only key -> current value view.
    fn current_values(&self) -> CurrentValues<'_>;

    /// Everything stored for `key`.
    fn record(&self, key: &str) -> Option<&ConfigRecord>;

    fn firm_props(&self, key: &str) -> Option<&ConfigFirmProps> {
        self.record(key).map(ConfigRecord::firm_props)
    }

    /// The stored current value, valid or not.
    fn current_value(&self, key: &str) -> Option<&str> {
        self.record(key).map(ConfigRecord::current_value)
    }

    /// The current value if it passes the key's checker, otherwise the
    /// default value. `None` if the key is absent.
    fn valid_value(&self, key: &str) -> Option<&str> {
        self.record(key).map(ConfigRecord::valid_value)
    }

    /// Whether `value` would be accepted by the key's checker. `false` if the
    /// key is absent.
    fn is_value_valid(&self, key: &str, value: &str) -> bool {
        self.firm_props(key).is_some_and(|p| p.is_valid(value))
    }

    /// Whether the stored current value passes the key's checker. `false` if
    /// the key is absent.
    fn is_current_value_valid(&self, key: &str) -> bool {
        self.record(key)
            .is_some_and(ConfigRecord::is_current_value_valid)
    }

    // ---- structure ----

    /// Add a key. Returns `Ok(false)` if the key is already present.
    fn add(&mut self, entry: ConfigEntry) -> Result<bool>;

    /// Add each entry in turn. Returns `Ok(true)` iff at least one was added.
    /// Each addition is notified separately.
    fn add_all<I>(&mut self, entries: I) -> Result<bool>
    where
        I: IntoIterator<Item = ConfigEntry>,
        Self: Sized,
    {
        let mut changed = false;
        for entry in entries {
            changed |= self.add(entry)?;
        }
        Ok(changed)
    }

    /// Remove a key and everything stored for it.
    fn remove(&mut self, key: &str) -> Result<bool>;

    fn remove_all<I, K>(&mut self, keys: I) -> Result<bool>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
        Self: Sized,
    {
        let mut changed = false;
        for key in keys {
            changed |= self.remove(key.as_ref())?;
        }
        Ok(changed)
    }

    /// Remove every key not named in `keys`.
    fn retain_all<I, K>(&mut self, keys: I) -> Result<bool>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
        Self: Sized,
    {
        let keep: HashSet<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
        let doomed: Vec<String> = self
            .key_set()
            .iter()
            .filter(|k| !keep.contains(k.name()))
            .map(|k| k.name().to_string())
            .collect();
        self.remove_all(doomed)
    }

    /// Remove every key, notifying a single "cleared" event. Returns
    /// `Ok(false)` if the store was already empty.
    fn clear(&mut self) -> Result<bool>;

    /// Replace the firm properties of a present key. The current value is
    /// kept, though its validity may change under the new checker.
    fn set_firm_props(&mut self, key: &str, firm_props: ConfigFirmProps) -> Result<bool>;

    // ---- current values ----

    /// Store `value` as the current value, whether or not it is valid.
    /// Notifies on every successful call, even if the value is unchanged.
    fn set_current_value(&mut self, key: &str, value: &str) -> Result<bool>;

    fn set_all_current_value<I, K, V>(&mut self, values: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
        Self: Sized,
    {
        let mut changed = false;
        for (key, value) in values {
            changed |= self.set_current_value(key.as_ref(), value.as_ref())?;
        }
        Ok(changed)
    }

    /// Equivalent to setting the current value to the default.
    fn reset_current_value(&mut self, key: &str) -> Result<bool>;

    fn reset_all_current_value(&mut self) -> Result<bool>
    where
        Self: Sized,
    {
        let keys: Vec<String> = self.key_set().iter().map(|k| k.name().to_string()).collect();
        let mut changed = false;
        for key in keys {
            changed |= self.reset_current_value(&key)?;
        }
        Ok(changed)
    }

    // ---- observers ----

    fn subscribe(&mut self, observer: Arc<dyn ConfigObserver>) -> Result<SubscriptionId>;

    fn unsubscribe(&mut self, id: SubscriptionId) -> Result<bool>;

    /// Observer failures recorded so far, oldest first.
    fn observer_failures(&self) -> Vec<ObserverFailure>;

    /// Take the recorded observer failures, leaving the log empty.
    fn drain_observer_failures(&mut self) -> Result<Vec<ObserverFailure>>;
}

/// A [`ConfigModel`] whose keys may carry a [`ValueParser`] for typed access.
///
/// [`ValueParser`]: cfgmodel_types::ValueParser
pub trait ExconfigModel: ConfigModel {
    fn value_parser(&self, key: &str) -> Option<&SharedParser> {
        self.record(key).and_then(ConfigRecord::parser)
    }

    /// Replace (or clear, with `None`) the parser of a present key.
    fn set_value_parser(&mut self, key: &str, parser: Option<SharedParser>) -> Result<bool>;

    /// Parse the valid value of `key`.
    ///
    /// The checker is applied first, so only a value that satisfies it is
    /// ever parsed. `Ok(None)` if the key is absent.
    fn parsed_value(&self, key: &str) -> Result<Option<ParsedValue>> {
        let Some(record) = self.record(key) else {
            return Ok(None);
        };
        let parser = record
            .parser()
            .ok_or_else(|| ConfigError::MissingParser(record.key().clone()))?;
        Ok(Some(parser.parse_value(record.valid_value())?))
    }

    /// Parse the valid value of `key` and convert it to `T`.
    ///
    /// Fails with [`ConfigError::TypeMismatch`] if the parsed value is not a
    /// `T`.
    fn parsed_value_as<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: TryFrom<ParsedValue, Error = TypeError>,
        Self: Sized,
    {
        let Some(value) = self.parsed_value(key)? else {
            return Ok(None);
        };
        match T::try_from(value) {
            Ok(typed) => Ok(Some(typed)),
            Err(TypeError::Mismatch { expected, actual }) => Err(ConfigError::TypeMismatch {
                key: key.into(),
                expected,
                actual,
            }),
            Err(other) => Err(other.into()),
        }
    }

    /// Render `value` with the key's parser and store it as the current
    /// value. `Ok(false)` if the key is absent.
    fn set_parsed_value(&mut self, key: &str, value: &ParsedValue) -> Result<bool> {
        let text = match self.record(key) {
            None => return Ok(false),
            Some(record) => {
                let parser = record
                    .parser()
                    .ok_or_else(|| ConfigError::MissingParser(record.key().clone()))?;
                parser.parse_object(value)?
            }
        };
        self.set_current_value(key, &text)
    }
}
