//! Decorators over cfgmodel stores.
//!
//! Both decorators are written purely against the
//! [`ConfigModel`](cfgmodel_core::ConfigModel) /
//! [`ExconfigModel`](cfgmodel_core::ExconfigModel) contracts, so they wrap
//! any conforming store.
//!
//! - [`UnmodifiableConfigModel`] — borrowed read-only view; every mutation
//!   fails with `ConfigError::Unsupported`
//! - [`SynchronizedConfigModel`] — shared `RwLock` handle for multi-threaded
//!   use

pub mod synchronized;
pub mod unmodifiable;

pub use synchronized::SynchronizedConfigModel;
pub use unmodifiable::{unmodifiable, UnmodifiableConfigModel};
