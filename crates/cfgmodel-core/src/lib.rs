//! Managed key/value configuration model.
//!
//! A store maps each [`ConfigKey`](cfgmodel_types::ConfigKey) to immutable
//! firm properties (a default value and a checker) and a mutable current
//! value. Current values are stored exactly as written; readers ask for the
//! *valid value*, which is the current value if the checker accepts it and
//! the default otherwise.
//!
//! # Architecture
//!
//! - **Stores** implement [`ConfigModel`]. [`ExconfigModel`] adds an optional
//!   per-key [`ValueParser`](cfgmodel_types::ValueParser) for typed access.
//! - **Observers** subscribe to a store and hear about every successful
//!   mutation. A failing or panicking observer is isolated and recorded; it
//!   never fails the mutation.
//! - **Views** ([`KeySet`], [`CurrentValues`]) borrow the store's records
//!   and reflect its state without copying.
//!
//! # Modules
//!
//! - [`error`] — Error types for store operations
//! - [`traits`] — The [`ConfigModel`] and [`ExconfigModel`] contracts
//! - [`memory`] — [`DefaultConfigModel`], the in-memory store
//! - [`record`] — Per-key [`ConfigRecord`]
//! - [`observer`] — Observer trait, registry and failure log
//! - [`view`] — Read-only live views
//! - [`config`] — [`ModelConfig`] tuning knobs
//! - [`persist`] — [`Loader`] / [`Saver`] over plain snapshots

pub mod config;
pub mod error;
pub mod memory;
pub mod observer;
pub mod persist;
pub mod record;
pub mod traits;
pub mod view;

pub use config::ModelConfig;
pub use error::{ConfigError, Result};
pub use memory::DefaultConfigModel;
pub use observer::{
    ConfigEventKind, ConfigObserver, ObserverError, ObserverFailure, ObserverRegistry,
    ObserverResult, SubscriptionId,
};
pub use persist::{ConfigSnapshot, Loader, MapLoader, MapSaver, Saver};
pub use record::{ConfigRecord, RecordMap};
pub use traits::{ConfigModel, ExconfigModel};
pub use view::{CurrentValues, KeySet};
