//! Loading current values into a store and saving them back out.
//!
//! A [`Loader`] pushes externally sourced values into an existing store; a
//! [`Saver`] captures a store's values. Both are consumed by use. The
//! in-tree implementations work on a plain [`ConfigSnapshot`]; file formats
//! are left to callers, who can serialize a snapshot with serde.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::error::{ConfigError, Result};
use crate::traits::ConfigModel;

/// Key name -> value text, in key order.
pub type ConfigSnapshot = BTreeMap<String, String>;

/// Pushes values into a store.
pub trait Loader<T: ?Sized> {
    /// Load every value, stopping at the first error. Values applied before
    /// the error stay applied.
    fn load(self, target: &mut T) -> Result<()>;

    /// Load every value that can be loaded and return the errors for the
    /// rest.
    fn continuous_load(self, target: &mut T) -> Vec<ConfigError>;
}

/// Captures values out of a store.
pub trait Saver<T: ?Sized> {
    type Output;

    /// Save every value, stopping at the first error.
    fn save(self, source: &T) -> Result<Self::Output>;

    /// Save what can be saved and return the errors for the rest.
    fn continuous_save(self, source: &T) -> (Self::Output, Vec<ConfigError>);
}

/// Loads a [`ConfigSnapshot`] as current values.
///
/// Keys missing from the store are errors: a loader never adds keys. By
/// default invalid values are stored as written, like any other
/// `set_current_value`; [`MapLoader::require_valid`] rejects them instead.
#[derive(Clone, Debug, Default)]
pub struct MapLoader {
    values: ConfigSnapshot,
    require_valid: bool,
}

impl MapLoader {
    pub fn new(values: ConfigSnapshot) -> Self {
        Self {
            values,
            require_valid: false,
        }
    }

    /// Reject values that fail the key's checker.
    pub fn require_valid(mut self) -> Self {
        self.require_valid = true;
        self
    }

    fn apply<M: ConfigModel + ?Sized>(
        &self,
        target: &mut M,
        key: &str,
        value: &str,
    ) -> Result<()> {
        if !target.contains_key(key) {
            return Err(ConfigError::Load {
                key: key.to_string(),
                reason: "unknown key".to_string(),
            });
        }
        if self.require_valid && !target.is_value_valid(key, value) {
            return Err(ConfigError::Load {
                key: key.to_string(),
                reason: format!("value {value:?} rejected by checker"),
            });
        }
        target.set_current_value(key, value)?;
        Ok(())
    }
}

impl<M: ConfigModel + ?Sized> Loader<M> for MapLoader {
    fn load(self, target: &mut M) -> Result<()> {
        for (key, value) in &self.values {
            self.apply(target, key, value)?;
        }
        info!(loaded = self.values.len(), "config values loaded");
        Ok(())
    }

    fn continuous_load(self, target: &mut M) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        for (key, value) in &self.values {
            if let Err(e) = self.apply(target, key, value) {
                warn!(key = %key, error = %e, "config value skipped");
                errors.push(e);
            }
        }
        info!(
            loaded = self.values.len() - errors.len(),
            failed = errors.len(),
            "config values loaded"
        );
        errors
    }
}

/// Which value a [`MapSaver`] captures for each key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SaveMode {
    /// The stored current value, valid or not.
    #[default]
    Current,
    /// The reconciled valid value.
    Valid,
    /// The current value; an invalid one is an error.
    Strict,
}

/// Captures a store's values as a [`ConfigSnapshot`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MapSaver {
    mode: SaveMode,
}

impl MapSaver {
    /// Capture current values as stored.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture valid values, substituting defaults for invalid current
    /// values.
    pub fn valid_values() -> Self {
        Self {
            mode: SaveMode::Valid,
        }
    }

    /// Refuse to save an invalid current value. With
    /// [`Saver::continuous_save`] the key's default is written in its place.
    pub fn strict() -> Self {
        Self {
            mode: SaveMode::Strict,
        }
    }

    fn capture<M: ConfigModel + ?Sized>(&self, source: &M) -> (ConfigSnapshot, Vec<ConfigError>) {
        let mut snapshot = ConfigSnapshot::new();
        let mut errors = Vec::new();
        for key in source.key_set() {
            let Some(record) = source.record(key) else {
                continue;
            };
            let value = match self.mode {
                SaveMode::Current => record.current_value(),
                SaveMode::Valid => record.valid_value(),
                SaveMode::Strict if record.is_current_value_valid() => record.current_value(),
                SaveMode::Strict => {
                    errors.push(ConfigError::Save {
                        key: key.to_string(),
                        reason: format!(
                            "current value {:?} rejected by checker",
                            record.current_value()
                        ),
                    });
                    record.firm_props().default_value()
                }
            };
            snapshot.insert(key.to_string(), value.to_string());
        }
        (snapshot, errors)
    }
}

impl<M: ConfigModel + ?Sized> Saver<M> for MapSaver {
    type Output = ConfigSnapshot;

    fn save(self, source: &M) -> Result<ConfigSnapshot> {
        let (snapshot, mut errors) = self.capture(source);
        if errors.is_empty() {
            info!(saved = snapshot.len(), "config values saved");
            Ok(snapshot)
        } else {
            Err(errors.swap_remove(0))
        }
    }

    fn continuous_save(self, source: &M) -> (ConfigSnapshot, Vec<ConfigError>) {
        let (snapshot, errors) = self.capture(source);
        for e in &errors {
            warn!(error = %e, "config value saved as default");
        }
        info!(saved = snapshot.len(), failed = errors.len(), "config values saved");
        (snapshot, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::DefaultConfigModel;
    use cfgmodel_types::{AnyValue, ConfigEntry, ConfigFirmProps, IntegerRange};

    fn model() -> DefaultConfigModel {
        DefaultConfigModel::from_entries(vec![
            ConfigEntry::new(
                "server.port",
                ConfigFirmProps::with_checker("8080", IntegerRange::port()).unwrap(),
            ),
            ConfigEntry::new(
                "server.host",
                ConfigFirmProps::with_checker("localhost", AnyValue).unwrap(),
            ),
        ])
    }

    fn snapshot(pairs: &[(&str, &str)]) -> ConfigSnapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn load_sets_current_values() {
        let mut m = model();
        MapLoader::new(snapshot(&[("server.port", "99999"), ("server.host", "0.0.0.0")]))
            .load(&mut m)
            .unwrap();
        assert_eq!(m.current_value("server.port"), Some("99999"));
        assert_eq!(m.valid_value("server.port"), Some("8080"));
        assert_eq!(m.current_value("server.host"), Some("0.0.0.0"));
    }

    #[test]
    fn load_rejects_unknown_keys() {
        let mut m = model();
        let err = MapLoader::new(snapshot(&[("nope", "1")]))
            .load(&mut m)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Load { ref key, .. } if key == "nope"));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn require_valid_rejects_invalid_values() {
        let mut m = model();
        let err = MapLoader::new(snapshot(&[("server.port", "99999")]))
            .require_valid()
            .load(&mut m)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
        assert_eq!(m.current_value("server.port"), Some("8080"));
    }

    #[test]
    fn continuous_load_collects_errors() {
        let mut m = model();
        let errors = MapLoader::new(snapshot(&[
            ("a.unknown", "1"),
            ("server.host", "example.org"),
            ("server.port", "70000"),
        ]))
        .require_valid()
        .continuous_load(&mut m);
        assert_eq!(errors.len(), 2);
        assert_eq!(m.current_value("server.host"), Some("example.org"));
        assert_eq!(m.current_value("server.port"), Some("8080"));
    }

    #[test]
    fn save_modes() {
        let mut m = model();
        m.set_current_value("server.port", "bogus").unwrap();

        let current = MapSaver::new().save(&m).unwrap();
        assert_eq!(current["server.port"], "bogus");
        assert_eq!(current["server.host"], "localhost");

        let valid = MapSaver::valid_values().save(&m).unwrap();
        assert_eq!(valid["server.port"], "8080");

        let err = MapSaver::strict().save(&m).unwrap_err();
        assert!(matches!(err, ConfigError::Save { ref key, .. } if key == "server.port"));

        let (partial, errors) = MapSaver::strict().continuous_save(&m);
        assert_eq!(errors.len(), 1);
        assert_eq!(partial["server.port"], "8080");
    }

    #[test]
    fn save_then_load_restores_values() {
        let mut source = model();
        source.set_current_value("server.port", "9090").unwrap();
        let saved = MapSaver::new().save(&source).unwrap();

        let mut target = model();
        MapLoader::new(saved).load(&mut target).unwrap();
        assert_eq!(target.current_value("server.port"), Some("9090"));
    }

    #[test]
    fn loader_works_through_trait_objects() {
        let mut m = model();
        let target: &mut dyn ConfigModel = &mut m;
        MapLoader::new(snapshot(&[("server.port", "1")]))
            .load(target)
            .unwrap();
        assert_eq!(m.current_value("server.port"), Some("1"));
    }
}
