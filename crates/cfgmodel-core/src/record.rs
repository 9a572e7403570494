use std::collections::BTreeMap;
use std::fmt;

use cfgmodel_types::{ConfigEntry, ConfigFirmProps, ConfigKey, SharedParser};

/// Backing map of a store: one record per key, ordered by key name.
pub type RecordMap = BTreeMap<ConfigKey, ConfigRecord>;

/// Everything a store holds for one key.
///
/// The record is the single source of truth for the key: its firm
/// properties, its current value (which may fail the checker), and its
/// optional parser. Removing the record removes all of it at once.
#[derive(Clone)]
pub struct ConfigRecord {
    pub(crate) key: ConfigKey,
    pub(crate) firm_props: ConfigFirmProps,
    pub(crate) current_value: String,
    pub(crate) parser: Option<SharedParser>,
}

impl ConfigRecord {
    /// Build the record a store keeps for `entry`.
    pub fn from_entry(entry: ConfigEntry) -> Self {
        let current_value = entry.initial_value().to_string();
        Self {
            key: entry.key,
            firm_props: entry.firm_props,
            current_value,
            parser: entry.parser,
        }
    }

    pub fn key(&self) -> &ConfigKey {
        &self.key
    }

    pub fn firm_props(&self) -> &ConfigFirmProps {
        &self.firm_props
    }

    pub fn current_value(&self) -> &str {
        &self.current_value
    }

    pub fn parser(&self) -> Option<&SharedParser> {
        self.parser.as_ref()
    }

    /// The current value if it passes the checker, otherwise the default.
    pub fn valid_value(&self) -> &str {
        self.firm_props.reconcile(&self.current_value)
    }

    pub fn is_current_value_valid(&self) -> bool {
        self.firm_props.is_valid(&self.current_value)
    }
}

impl fmt::Debug for ConfigRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRecord")
            .field("key", &self.key)
            .field("firm_props", &self.firm_props)
            .field("current_value", &self.current_value)
            .field("parser", &self.parser.as_ref().map(|p| p.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgmodel_types::{IntegerParser, IntegerRange};
    use std::sync::Arc;

    #[test]
    fn record_from_entry_uses_default_when_unset() {
        let props = ConfigFirmProps::with_checker("8080", IntegerRange::port()).unwrap();
        let record = ConfigRecord::from_entry(ConfigEntry::new("server.port", props));
        assert_eq!(record.key().name(), "server.port");
        assert_eq!(record.current_value(), "8080");
        assert!(record.parser().is_none());
    }

    #[test]
    fn valid_value_reconciles() {
        let props = ConfigFirmProps::with_checker("8080", IntegerRange::port()).unwrap();
        let record = ConfigRecord::from_entry(
            ConfigEntry::new("server.port", props)
                .with_parser(Arc::new(IntegerParser))
                .with_current_value("99999"),
        );
        assert_eq!(record.current_value(), "99999");
        assert!(!record.is_current_value_valid());
        assert_eq!(record.valid_value(), "8080");
    }
}
