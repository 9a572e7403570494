use std::fmt;
use std::sync::Arc;

use crate::checker::{ConfigChecker, SharedChecker};
use crate::error::{TypeError, TypeResult};

/// Immutable `(default value, checker)` pair attached to a key.
///
/// Construction is validated: the default value must satisfy the checker, so
/// every `ConfigFirmProps` in existence has a valid default. A store may
/// replace the firm properties of a key, but never mutates an instance.
#[derive(Clone)]
pub struct ConfigFirmProps {
    default_value: String,
    checker: SharedChecker,
}

impl ConfigFirmProps {
    /// Create firm properties, failing with [`TypeError::InvalidDefault`] if
    /// `checker` rejects `default_value`.
    pub fn new(default_value: impl Into<String>, checker: SharedChecker) -> TypeResult<Self> {
        let default_value = default_value.into();
        if checker.non_valid(&default_value) {
            return Err(TypeError::InvalidDefault {
                value: default_value,
                reason: checker.describe(),
            });
        }
        Ok(Self {
            default_value,
            checker,
        })
    }

    /// Same as [`Self::new`], wrapping a concrete checker.
    pub fn with_checker<C>(default_value: impl Into<String>, checker: C) -> TypeResult<Self>
    where
        C: ConfigChecker + 'static,
    {
        Self::new(default_value, Arc::new(checker))
    }

    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    pub fn checker(&self) -> &SharedChecker {
        &self.checker
    }

    /// Whether `value` satisfies this key's checker.
    pub fn is_valid(&self, value: &str) -> bool {
        self.checker.is_valid(value)
    }

    /// The valid value for `current`: `current` itself if it passes the
    /// checker, otherwise the default.
    pub fn reconcile<'a>(&'a self, current: &'a str) -> &'a str {
        if self.checker.is_valid(current) {
            current
        } else {
            &self.default_value
        }
    }
}

impl fmt::Debug for ConfigFirmProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFirmProps")
            .field("default_value", &self.default_value)
            .field("checker", &self.checker.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{AnyValue, IntegerRange, OneOf};
    use proptest::prelude::*;

    #[test]
    fn default_must_pass_checker() {
        let err = ConfigFirmProps::with_checker("99999", IntegerRange::port()).unwrap_err();
        assert!(matches!(err, TypeError::InvalidDefault { ref value, .. } if value == "99999"));

        let props = ConfigFirmProps::with_checker("8080", IntegerRange::port()).unwrap();
        assert_eq!(props.default_value(), "8080");
    }

    #[test]
    fn reconcile_falls_back_to_default() {
        let props = ConfigFirmProps::with_checker("info", OneOf::new(["info", "debug"])).unwrap();
        assert_eq!(props.reconcile("debug"), "debug");
        assert_eq!(props.reconcile("loud"), "info");
    }

    #[test]
    fn debug_shows_checker_description() {
        let props = ConfigFirmProps::with_checker("", AnyValue).unwrap();
        assert_eq!(
            format!("{props:?}"),
            "ConfigFirmProps { default_value: \"\", checker: \"any\" }"
        );
    }

    proptest! {
        #[test]
        fn construction_succeeds_iff_checker_accepts(
            min in -1000i64..1000,
            span in 0i64..1000,
            value in prop_oneof![
                (-3000i64..3000).prop_map(|n| n.to_string()),
                "[a-z0-9 -]{0,6}",
            ],
        ) {
            let checker = IntegerRange::new(min, min + span);
            let accepted = checker.is_valid(&value);
            let built = ConfigFirmProps::with_checker(value.clone(), checker);
            prop_assert_eq!(built.is_ok(), accepted);
        }

        #[test]
        fn reconciled_value_always_passes(current in ".{0,8}") {
            let props = ConfigFirmProps::with_checker("5", IntegerRange::new(0, 9)).unwrap();
            let valid = props.reconcile(&current);
            prop_assert!(props.is_valid(valid));
            if props.is_valid(&current) {
                prop_assert_eq!(valid, current.as_str());
            } else {
                prop_assert_eq!(valid, "5");
            }
        }
    }
}
