//! Change notification for configuration stores.
//!
//! Observers register explicitly with [`ObserverRegistry::subscribe`] and are
//! removed with [`ObserverRegistry::unsubscribe`]; nothing depends on drop
//! timing. Every state change is delivered to every observer in
//! subscription order. A failing observer (error or, by default, panic) is
//! isolated: the failure is logged, appended to a bounded failure log, and
//! delivery continues with the next observer. The mutation that triggered
//! the event is never rolled back or failed because of an observer.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use cfgmodel_types::{ConfigFirmProps, ConfigKey, SharedParser};

use crate::config::ModelConfig;
use crate::record::ConfigRecord;

/// Error returned by an observer callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ObserverError {
    message: String,
}

impl ObserverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type of observer callbacks.
pub type ObserverResult = std::result::Result<(), ObserverError>;

/// Receives state changes from a store.
///
/// Callbacks run synchronously inside the mutating call, under whatever lock
/// that call holds. An observer must not mutate the store that notifies it.
/// Every method defaults to a no-op so implementors only override what they
/// care about.
pub trait ConfigObserver: Send + Sync {
    /// A key was added. `record` is the state it was added with.
    fn config_key_added(&self, record: &ConfigRecord) -> ObserverResult {
        let _ = record;
        Ok(())
    }

    /// A key was removed. `record` is the state it held when removed.
    fn config_key_removed(&self, record: &ConfigRecord) -> ObserverResult {
        let _ = record;
        Ok(())
    }

    /// Every key was removed at once.
    fn config_key_cleared(&self) -> ObserverResult {
        Ok(())
    }

    fn firm_props_changed(
        &self,
        key: &ConfigKey,
        old: &ConfigFirmProps,
        new: &ConfigFirmProps,
    ) -> ObserverResult {
        let _ = (key, old, new);
        Ok(())
    }

    /// The current value was written. `valid` is the reconciled value after
    /// the write, so observers need not re-run the checker.
    fn current_value_changed(
        &self,
        key: &ConfigKey,
        old: &str,
        new: &str,
        valid: &str,
    ) -> ObserverResult {
        let _ = (key, old, new, valid);
        Ok(())
    }

    fn value_parser_changed(
        &self,
        key: &ConfigKey,
        old: Option<&SharedParser>,
        new: Option<&SharedParser>,
    ) -> ObserverResult {
        let _ = (key, old, new);
        Ok(())
    }
}

/// Handle identifying one subscription on one store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Classification of store events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigEventKind {
    KeyAdded,
    KeyRemoved,
    KeyCleared,
    FirmPropsChanged,
    CurrentValueChanged,
    ValueParserChanged,
}

impl fmt::Display for ConfigEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::KeyAdded => "KeyAdded",
            Self::KeyRemoved => "KeyRemoved",
            Self::KeyCleared => "KeyCleared",
            Self::FirmPropsChanged => "FirmPropsChanged",
            Self::CurrentValueChanged => "CurrentValueChanged",
            Self::ValueParserChanged => "ValueParserChanged",
        };
        write!(f, "{s}")
    }
}

/// A recorded observer failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObserverFailure {
    /// The subscription whose callback failed.
    pub subscription: SubscriptionId,
    /// The event being delivered.
    pub event: ConfigEventKind,
    /// The key the event concerned, if any.
    pub key: Option<ConfigKey>,
    /// Error message, or the panic payload if it was a string.
    pub message: String,
    /// Whether the callback panicked rather than returning an error.
    pub panicked: bool,
}

impl fmt::Display for ObserverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = if self.panicked { "panicked" } else { "failed" };
        match &self.key {
            Some(key) => write!(
                f,
                "observer {} {what} on {} for {key}: {}",
                self.subscription, self.event, self.message
            ),
            None => write!(
                f,
                "observer {} {what} on {}: {}",
                self.subscription, self.event, self.message
            ),
        }
    }
}

/// Subscription set and fan-out for a single store.
pub struct ObserverRegistry {
    observers: Vec<(SubscriptionId, Arc<dyn ConfigObserver>)>,
    next_id: u64,
    failures: VecDeque<ObserverFailure>,
    failure_capacity: usize,
    catch_panics: bool,
}

impl ObserverRegistry {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            observers: Vec::new(),
            next_id: 1,
            failures: VecDeque::new(),
            failure_capacity: config.failure_log_capacity,
            catch_panics: config.catch_observer_panics,
        }
    }

    /// Register an observer. The same observer may be registered more than
    /// once; each registration receives its own id and its own deliveries.
    pub fn subscribe(&mut self, observer: Arc<dyn ConfigObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Remove a registration. Returns `false` if `id` is not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Recorded failures, oldest first.
    pub fn failures(&self) -> Vec<ObserverFailure> {
        self.failures.iter().cloned().collect()
    }

    /// Take every recorded failure, leaving the log empty.
    pub fn drain_failures(&mut self) -> Vec<ObserverFailure> {
        self.failures.drain(..).collect()
    }

    /// Deliver one event to every observer.
    ///
    /// `deliver` invokes the matching callback on one observer. Returns the
    /// number of observers that failed.
    pub fn notify<F>(
        &mut self,
        event: ConfigEventKind,
        key: Option<&ConfigKey>,
        deliver: F,
    ) -> usize
    where
        F: Fn(&dyn ConfigObserver) -> ObserverResult,
    {
        let mut failed = Vec::new();

        for (id, observer) in &self.observers {
            let outcome = if self.catch_panics {
                match panic::catch_unwind(AssertUnwindSafe(|| deliver(observer.as_ref()))) {
                    Ok(result) => result.map_err(|e| (e.message, false)),
                    Err(payload) => Err((panic_message(payload.as_ref()), true)),
                }
            } else {
                deliver(observer.as_ref()).map_err(|e| (e.message, false))
            };
            if let Err((message, panicked)) = outcome {
                failed.push((*id, message, panicked));
            }
        }

        let count = failed.len();
        for (subscription, message, panicked) in failed {
            self.record(ObserverFailure {
                subscription,
                event,
                key: key.cloned(),
                message,
                panicked,
            });
        }
        count
    }

    fn record(&mut self, failure: ObserverFailure) {
        warn!(
            subscription = %failure.subscription,
            event = %failure.event,
            key = ?failure.key,
            panicked = failure.panicked,
            "observer failed: {}",
            failure.message
        );
        if self.failure_capacity == 0 {
            return;
        }
        if self.failures.len() == self.failure_capacity {
            self.failures.pop_front();
        }
        self.failures.push_back(failure);
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new(&ModelConfig::default())
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .field("failures", &self.failures.len())
            .field("failure_capacity", &self.failure_capacity)
            .field("catch_panics", &self.catch_panics)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "observer panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        cleared: AtomicUsize,
    }

    impl ConfigObserver for Counter {
        fn config_key_cleared(&self) -> ObserverResult {
            self.cleared.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    impl ConfigObserver for Failing {
        fn config_key_cleared(&self) -> ObserverResult {
            Err(ObserverError::new("disk full"))
        }
    }

    struct Panicking;

    impl ConfigObserver for Panicking {
        fn config_key_cleared(&self) -> ObserverResult {
            panic!("observer blew up");
        }
    }

    fn clear(registry: &mut ObserverRegistry) -> usize {
        registry.notify(ConfigEventKind::KeyCleared, None, |o| o.config_key_cleared())
    }

    #[test]
    fn subscribe_and_unsubscribe_are_deterministic() {
        let mut registry = ObserverRegistry::default();
        let counter = Arc::new(Counter::default());
        let a = registry.subscribe(counter.clone());
        let b = registry.subscribe(counter.clone());
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        clear(&mut registry);
        assert_eq!(counter.cleared.load(Ordering::SeqCst), 2);

        assert!(registry.unsubscribe(a));
        assert!(!registry.unsubscribe(a));
        clear(&mut registry);
        assert_eq!(counter.cleared.load(Ordering::SeqCst), 3);

        assert!(registry.unsubscribe(b));
        assert!(registry.is_empty());
    }

    #[test]
    fn failures_are_isolated_and_recorded() {
        let mut registry = ObserverRegistry::default();
        let failing = registry.subscribe(Arc::new(Failing));
        let panicking = registry.subscribe(Arc::new(Panicking));
        let counter = Arc::new(Counter::default());
        registry.subscribe(counter.clone());

        assert_eq!(clear(&mut registry), 2);
        assert_eq!(counter.cleared.load(Ordering::SeqCst), 1);

        let failures = registry.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].subscription, failing);
        assert_eq!(failures[0].message, "disk full");
        assert!(!failures[0].panicked);
        assert_eq!(failures[1].subscription, panicking);
        assert_eq!(failures[1].message, "observer blew up");
        assert!(failures[1].panicked);
        assert_eq!(failures[1].event, ConfigEventKind::KeyCleared);

        assert_eq!(registry.drain_failures().len(), 2);
        assert!(registry.failures().is_empty());
    }

    #[test]
    fn failure_log_is_bounded() {
        let config = ModelConfig {
            failure_log_capacity: 2,
            ..Default::default()
        };
        let mut registry = ObserverRegistry::new(&config);
        registry.subscribe(Arc::new(Failing));
        for _ in 0..5 {
            clear(&mut registry);
        }
        assert_eq!(registry.failures().len(), 2);
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        let config = ModelConfig {
            failure_log_capacity: 0,
            ..Default::default()
        };
        let mut registry = ObserverRegistry::new(&config);
        registry.subscribe(Arc::new(Failing));
        assert_eq!(clear(&mut registry), 1);
        assert!(registry.failures().is_empty());
    }

    #[test]
    #[should_panic(expected = "observer blew up")]
    fn panics_propagate_when_not_caught() {
        let mut registry = ObserverRegistry::new(&ModelConfig::propagate_panics());
        registry.subscribe(Arc::new(Panicking));
        clear(&mut registry);
    }

    #[test]
    fn failure_display() {
        let failure = ObserverFailure {
            subscription: SubscriptionId(3),
            event: ConfigEventKind::CurrentValueChanged,
            key: Some(ConfigKey::new("server.port")),
            message: "boom".into(),
            panicked: false,
        };
        assert_eq!(
            failure.to_string(),
            "observer sub#3 failed on CurrentValueChanged for server.port: boom"
        );
    }
}
