use std::fmt;

use crate::firm::ConfigFirmProps;
use crate::key::ConfigKey;
use crate::parser::SharedParser;

/// Assembly tuple used to add a key to a store.
///
/// An entry is always well-formed: the key is present and the firm
/// properties were validated at construction. The parser and the initial
/// current value are optional; a store initialises a missing current value
/// to the default.
#[derive(Clone)]
pub struct ConfigEntry {
    pub key: ConfigKey,
    pub firm_props: ConfigFirmProps,
    pub parser: Option<SharedParser>,
    pub current_value: Option<String>,
}

impl ConfigEntry {
    pub fn new(key: impl Into<ConfigKey>, firm_props: ConfigFirmProps) -> Self {
        Self {
            key: key.into(),
            firm_props,
            parser: None,
            current_value: None,
        }
    }

    /// Attach a value parser.
    pub fn with_parser(mut self, parser: SharedParser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Set the initial current value. It is not checked.
    pub fn with_current_value(mut self, value: impl Into<String>) -> Self {
        self.current_value = Some(value.into());
        self
    }

    /// The current value a store starts with for this entry.
    pub fn initial_value(&self) -> &str {
        self.current_value
            .as_deref()
            .unwrap_or(self.firm_props.default_value())
    }
}

impl fmt::Debug for ConfigEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigEntry")
            .field("key", &self.key)
            .field("firm_props", &self.firm_props)
            .field("parser", &self.parser.as_ref().map(|p| p.name()))
            .field("current_value", &self.current_value)
            .finish()
    }
}
