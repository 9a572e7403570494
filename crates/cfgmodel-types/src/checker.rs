//! Validity checkers for configuration values.
//!
//! A [`ConfigChecker`] decides whether a string is an acceptable value for a
//! key. Checkers are shared between firm properties via [`SharedChecker`], so
//! they must be `Send + Sync` and free of interior state that changes their
//! verdict over time.
//!
//! Any `Fn(&str) -> bool + Send + Sync` closure is a checker.

use std::fmt;
use std::sync::Arc;

/// Predicate capability over string values.
pub trait ConfigChecker: Send + Sync {
    /// Returns `true` if `value` is acceptable.
    fn is_valid(&self, value: &str) -> bool;

    /// Logical complement of [`Self::is_valid`].
    fn non_valid(&self, value: &str) -> bool {
        !self.is_valid(value)
    }

    /// Short human-readable description, used in diagnostics.
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

/// Reference-counted checker, as stored in firm properties.
pub type SharedChecker = Arc<dyn ConfigChecker>;

impl<F> ConfigChecker for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, value: &str) -> bool {
        self(value)
    }
}

impl fmt::Debug for dyn ConfigChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigChecker({})", self.describe())
    }
}

/// Accepts every value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnyValue;

impl ConfigChecker for AnyValue {
    fn is_valid(&self, _value: &str) -> bool {
        true
    }

    fn describe(&self) -> String {
        "any".to_string()
    }
}

/// Accepts values with at least one non-whitespace character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NonEmpty;

impl ConfigChecker for NonEmpty {
    fn is_valid(&self, value: &str) -> bool {
        !value.trim().is_empty()
    }

    fn describe(&self) -> String {
        "non-empty".to_string()
    }
}

/// Accepts decimal integers within `[min, max]` (inclusive).
///
/// Surrounding whitespace is not tolerated: `" 80"` is invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntegerRange {
    pub min: i64,
    pub max: i64,
}

impl IntegerRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Any value representable as `i64`.
    pub fn any() -> Self {
        Self::new(i64::MIN, i64::MAX)
    }

    /// TCP/UDP port numbers: `[0, 65535]`.
    pub fn port() -> Self {
        Self::new(0, 65535)
    }
}

impl ConfigChecker for IntegerRange {
    fn is_valid(&self, value: &str) -> bool {
        value
            .parse::<i64>()
            .map(|n| n >= self.min && n <= self.max)
            .unwrap_or(false)
    }

    fn describe(&self) -> String {
        format!("integer in [{}, {}]", self.min, self.max)
    }
}

/// Accepts finite floating-point numbers within `[min, max]` (inclusive).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
}

impl FloatRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl ConfigChecker for FloatRange {
    fn is_valid(&self, value: &str) -> bool {
        match value.parse::<f64>() {
            Ok(n) => n.is_finite() && n >= self.min && n <= self.max,
            Err(_) => false,
        }
    }

    fn describe(&self) -> String {
        format!("number in [{}, {}]", self.min, self.max)
    }
}

/// Accepts `true` or `false`, ignoring ASCII case.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BooleanValue;

impl ConfigChecker for BooleanValue {
    fn is_valid(&self, value: &str) -> bool {
        value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
    }

    fn describe(&self) -> String {
        "boolean".to_string()
    }
}

/// Accepts exactly one of a fixed set of values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OneOf {
    allowed: Vec<String>,
}

impl OneOf {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }
}

impl ConfigChecker for OneOf {
    fn is_valid(&self, value: &str) -> bool {
        self.allowed.iter().any(|a| a == value)
    }

    fn describe(&self) -> String {
        format!("one of [{}]", self.allowed.join(", "))
    }
}

/// Accepts a value only if every inner checker does. Empty means "accept".
#[derive(Clone, Default)]
pub struct AllOf(pub Vec<SharedChecker>);

impl ConfigChecker for AllOf {
    fn is_valid(&self, value: &str) -> bool {
        self.0.iter().all(|c| c.is_valid(value))
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.0.iter().map(|c| c.describe()).collect();
        format!("all of ({})", parts.join(" and "))
    }
}

/// Accepts a value if any inner checker does. Empty means "reject".
#[derive(Clone, Default)]
pub struct AnyOf(pub Vec<SharedChecker>);

impl ConfigChecker for AnyOf {
    fn is_valid(&self, value: &str) -> bool {
        self.0.iter().any(|c| c.is_valid(value))
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.0.iter().map(|c| c.describe()).collect();
        format!("any of ({})", parts.join(" or "))
    }
}

/// Inverts an inner checker.
#[derive(Clone)]
pub struct Not(pub SharedChecker);

impl ConfigChecker for Not {
    fn is_valid(&self, value: &str) -> bool {
        self.0.non_valid(value)
    }

    fn describe(&self) -> String {
        format!("not ({})", self.0.describe())
    }
}
