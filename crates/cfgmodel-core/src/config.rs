use serde::{Deserialize, Serialize};

/// Tuning knobs for a [`DefaultConfigModel`](crate::DefaultConfigModel).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Maximum number of observer failures retained for inspection. When the
    /// log is full the oldest failure is dropped. Zero disables retention;
    /// failures are still logged.
    pub failure_log_capacity: usize,
    /// Whether a panicking observer is isolated like one returning an error.
    /// When `false`, the panic propagates to the caller of the mutation.
    pub catch_observer_panics: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            failure_log_capacity: 64,
            catch_observer_panics: true,
        }
    }
}

impl ModelConfig {
    /// Let observer panics propagate to the mutating caller.
    pub fn propagate_panics() -> Self {
        Self {
            catch_observer_panics: false,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ModelConfig::default();
        assert_eq!(c.failure_log_capacity, 64);
        assert!(c.catch_observer_panics);
        assert!(!ModelConfig::propagate_panics().catch_observer_panics);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let c: ModelConfig = serde_json::from_str(r#"{"failure_log_capacity": 8}"#).unwrap();
        assert_eq!(c.failure_log_capacity, 8);
        assert!(c.catch_observer_panics);
    }
}
