//! Foundation types for cfgmodel.
//!
//! This crate provides the value-level building blocks of a configuration
//! model. Every other cfgmodel crate depends on `cfgmodel-types`.
//!
//! # Key Types
//!
//! - [`ConfigKey`] — Immutable, name-based identity of an entry
//! - [`ConfigChecker`] — Validity predicate over string values
//! - [`ValueParser`] — Bidirectional string <-> [`ParsedValue`] conversion
//! - [`ConfigFirmProps`] — Validated `(default value, checker)` pair
//! - [`ConfigEntry`] — Assembly tuple used to add a key to a store

pub mod checker;
pub mod entry;
pub mod error;
pub mod firm;
pub mod key;
pub mod parser;
pub mod value;

pub use checker::{
    AllOf, AnyOf, AnyValue, BooleanValue, ConfigChecker, FloatRange, IntegerRange, NonEmpty, Not,
    OneOf, SharedChecker,
};
pub use entry::ConfigEntry;
pub use error::{TypeError, TypeResult};
pub use firm::ConfigFirmProps;
pub use key::ConfigKey;
pub use parser::{
    BooleanParser, FloatParser, IntegerParser, JsonParser, ListParser, SharedParser, TextParser,
    ValueParser,
};
pub use value::ParsedValue;
