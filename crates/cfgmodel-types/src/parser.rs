//! Bidirectional string <-> [`ParsedValue`] conversion.
//!
//! A parser is attached to a key so callers can read and write typed values
//! while the store keeps holding plain strings. Parsers are pure: the same
//! input always yields the same output.

use std::fmt;
use std::sync::Arc;

use crate::error::{TypeError, TypeResult};
use crate::value::ParsedValue;

/// Converts between a key's string representation and a typed value.
pub trait ValueParser: Send + Sync {
    /// Short name of the parser, used in diagnostics.
    fn name(&self) -> &str;

    /// Parse text into a typed value.
    ///
    /// Returns [`TypeError::Parse`] when the text is not in this parser's
    /// format.
    fn parse_value(&self, text: &str) -> TypeResult<ParsedValue>;

    /// Render a typed value back to text. Inverse of [`Self::parse_value`].
    ///
    /// Returns [`TypeError::Unrepresentable`] when the value is of a kind
    /// this parser does not handle.
    fn parse_object(&self, value: &ParsedValue) -> TypeResult<String>;
}

/// Reference-counted parser, as stored per key.
pub type SharedParser = Arc<dyn ValueParser>;

impl fmt::Debug for dyn ValueParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueParser({})", self.name())
    }
}

fn parse_error(text: &str, reason: impl fmt::Display) -> TypeError {
    TypeError::Parse {
        value: text.to_string(),
        reason: reason.to_string(),
    }
}

fn unrepresentable(parser: &str, value: &ParsedValue) -> TypeError {
    TypeError::Unrepresentable {
        reason: format!("{parser} parser cannot render a {} value", value.kind()),
    }
}

/// Identity parser: text in, text out.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextParser;

impl ValueParser for TextParser {
    fn name(&self) -> &str {
        "text"
    }

    fn parse_value(&self, text: &str) -> TypeResult<ParsedValue> {
        Ok(ParsedValue::Text(text.to_string()))
    }

    fn parse_object(&self, value: &ParsedValue) -> TypeResult<String> {
        match value {
            ParsedValue::Text(s) => Ok(s.clone()),
            other => Err(unrepresentable(self.name(), other)),
        }
    }
}

/// Decimal `i64`.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntegerParser;

impl ValueParser for IntegerParser {
    fn name(&self) -> &str {
        "integer"
    }

    fn parse_value(&self, text: &str) -> TypeResult<ParsedValue> {
        text.parse::<i64>()
            .map(ParsedValue::Int)
            .map_err(|e| parse_error(text, e))
    }

    fn parse_object(&self, value: &ParsedValue) -> TypeResult<String> {
        match value {
            ParsedValue::Int(n) => Ok(n.to_string()),
            other => Err(unrepresentable(self.name(), other)),
        }
    }
}

/// `f64`. Integers are accepted on the way out.
#[derive(Clone, Copy, Debug, Default)]
pub struct FloatParser;

impl ValueParser for FloatParser {
    fn name(&self) -> &str {
        "float"
    }

    fn parse_value(&self, text: &str) -> TypeResult<ParsedValue> {
        text.parse::<f64>()
            .map(ParsedValue::Float)
            .map_err(|e| parse_error(text, e))
    }

    fn parse_object(&self, value: &ParsedValue) -> TypeResult<String> {
        match value {
            ParsedValue::Float(n) => Ok(n.to_string()),
            ParsedValue::Int(n) => Ok(n.to_string()),
            other => Err(unrepresentable(self.name(), other)),
        }
    }
}

/// `true` / `false`, ignoring ASCII case on input.
#[derive(Clone, Copy, Debug, Default)]
pub struct BooleanParser;

impl ValueParser for BooleanParser {
    fn name(&self) -> &str {
        "boolean"
    }

    fn parse_value(&self, text: &str) -> TypeResult<ParsedValue> {
        if text.eq_ignore_ascii_case("true") {
            Ok(ParsedValue::Bool(true))
        } else if text.eq_ignore_ascii_case("false") {
            Ok(ParsedValue::Bool(false))
        } else {
            Err(parse_error(text, "expected true or false"))
        }
    }

    fn parse_object(&self, value: &ParsedValue) -> TypeResult<String> {
        match value {
            ParsedValue::Bool(b) => Ok(b.to_string()),
            other => Err(unrepresentable(self.name(), other)),
        }
    }
}

/// Separator-delimited list whose items are handled by an element parser.
///
/// The empty string is the empty list. Items are not trimmed.
#[derive(Clone)]
pub struct ListParser {
    separator: String,
    element: SharedParser,
}

impl ListParser {
    pub fn new(separator: impl Into<String>, element: SharedParser) -> Self {
        Self {
            separator: separator.into(),
            element,
        }
    }

    /// Comma-separated list.
    pub fn comma(element: SharedParser) -> Self {
        Self::new(",", element)
    }
}

impl fmt::Debug for ListParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListParser")
            .field("separator", &self.separator)
            .field("element", &self.element.name())
            .finish()
    }
}

impl ValueParser for ListParser {
    fn name(&self) -> &str {
        "list"
    }

    fn parse_value(&self, text: &str) -> TypeResult<ParsedValue> {
        if text.is_empty() {
            return Ok(ParsedValue::List(Vec::new()));
        }
        text.split(self.separator.as_str())
            .map(|item| self.element.parse_value(item))
            .collect::<TypeResult<Vec<_>>>()
            .map(ParsedValue::List)
    }

    fn parse_object(&self, value: &ParsedValue) -> TypeResult<String> {
        let items = value
            .as_list()
            .ok_or_else(|| unrepresentable(self.name(), value))?;
        let rendered = items
            .iter()
            .map(|item| self.element.parse_object(item))
            .collect::<TypeResult<Vec<_>>>()?;
        if let Some(item) = rendered.iter().find(|r| r.contains(self.separator.as_str())) {
            return Err(TypeError::Unrepresentable {
                reason: format!("list item {item:?} contains separator {:?}", self.separator),
            });
        }
        // A lone empty item would render as "", which reads back as the empty list.
        if let [only] = rendered.as_slice() {
            if only.is_empty() {
                return Err(TypeError::Unrepresentable {
                    reason: "a list holding one empty item has no text form".to_string(),
                });
            }
        }
        Ok(rendered.join(self.separator.as_str()))
    }
}

/// JSON scalars and arrays, via `serde_json`.
///
/// `null` and objects have no [`ParsedValue`] counterpart and fail to parse.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonParser;

impl ValueParser for JsonParser {
    fn name(&self) -> &str {
        "json"
    }

    fn parse_value(&self, text: &str) -> TypeResult<ParsedValue> {
        serde_json::from_str(text).map_err(|e| parse_error(text, e))
    }

    fn parse_object(&self, value: &ParsedValue) -> TypeResult<String> {
        // serde_json writes non-finite floats as `null`, which does not parse back.
        if has_non_finite(value) {
            return Err(TypeError::Unrepresentable {
                reason: "JSON has no representation for NaN or infinite numbers".to_string(),
            });
        }
        serde_json::to_string(value).map_err(|e| TypeError::Unrepresentable {
            reason: e.to_string(),
        })
    }
}

fn has_non_finite(value: &ParsedValue) -> bool {
    match value {
        ParsedValue::Float(f) => !f.is_finite(),
        ParsedValue::List(items) => items.iter().any(has_non_finite),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_parser() {
        assert_eq!(IntegerParser.parse_value("9090"), Ok(ParsedValue::Int(9090)));
        assert!(matches!(
            IntegerParser.parse_value("90x"),
            Err(TypeError::Parse { .. })
        ));
        assert_eq!(
            IntegerParser.parse_object(&ParsedValue::Int(-7)).unwrap(),
            "-7"
        );
        assert!(matches!(
            IntegerParser.parse_object(&ParsedValue::Bool(true)),
            Err(TypeError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn boolean_parser_normalizes_case() {
        assert_eq!(BooleanParser.parse_value("TRUE"), Ok(ParsedValue::Bool(true)));
        assert_eq!(
            BooleanParser.parse_object(&ParsedValue::Bool(false)).unwrap(),
            "false"
        );
        assert!(BooleanParser.parse_value("1").is_err());
    }

    #[test]
    fn float_parser_renders_integers() {
        assert_eq!(FloatParser.parse_value("0.5"), Ok(ParsedValue::Float(0.5)));
        assert_eq!(FloatParser.parse_object(&ParsedValue::Int(2)).unwrap(), "2");
    }

    #[test]
    fn list_parser_uses_element_parser() {
        let parser = ListParser::comma(Arc::new(IntegerParser));
        assert_eq!(
            parser.parse_value("1,2,3").unwrap(),
            ParsedValue::from(vec![1i64, 2, 3])
        );
        assert_eq!(parser.parse_value("").unwrap(), ParsedValue::List(vec![]));
        assert!(parser.parse_value("1,,3").is_err());
        assert_eq!(
            parser
                .parse_object(&ParsedValue::from(vec![4i64, 5]))
                .unwrap(),
            "4,5"
        );
        assert!(parser.parse_object(&ParsedValue::Int(4)).is_err());
    }

    #[test]
    fn json_parser() {
        assert_eq!(JsonParser.parse_value("42").unwrap(), ParsedValue::Int(42));
        assert_eq!(
            JsonParser.parse_value("\"hi\"").unwrap(),
            ParsedValue::Text("hi".into())
        );
        assert!(JsonParser.parse_value("null").is_err());
        assert!(JsonParser.parse_value("{\"a\":1}").is_err());
        assert_eq!(
            JsonParser
                .parse_object(&ParsedValue::from(vec!["a", "b"]))
                .unwrap(),
            "[\"a\",\"b\"]"
        );
    }

    #[test]
    fn list_render_refuses_ambiguous_text() {
        let parser = ListParser::comma(Arc::new(TextParser));
        let with_separator = ParsedValue::from(vec!["a,b"]);
        assert!(matches!(
            parser.parse_object(&with_separator),
            Err(TypeError::Unrepresentable { .. })
        ));
        let lone_empty = ParsedValue::from(vec![""]);
        assert!(matches!(
            parser.parse_object(&lone_empty),
            Err(TypeError::Unrepresentable { .. })
        ));

        let fine = ParsedValue::from(vec!["a", ""]);
        let text = parser.parse_object(&fine).unwrap();
        assert_eq!(text, "a,");
        assert_eq!(parser.parse_value(&text).unwrap(), fine);
        let empty = ParsedValue::List(vec![]);
        assert_eq!(parser.parse_value(&parser.parse_object(&empty).unwrap()).unwrap(), empty);
    }

    #[test]
    fn json_render_refuses_non_finite_floats() {
        for value in [
            ParsedValue::Float(f64::NAN),
            ParsedValue::Float(f64::INFINITY),
            ParsedValue::List(vec![ParsedValue::Int(1), ParsedValue::Float(f64::NEG_INFINITY)]),
        ] {
            assert!(matches!(
                JsonParser.parse_object(&value),
                Err(TypeError::Unrepresentable { .. })
            ));
        }
        assert_eq!(JsonParser.parse_object(&ParsedValue::Float(1.5)).unwrap(), "1.5");
    }

    #[test]
    fn text_parser_only_renders_text() {
        assert_eq!(TextParser.parse_object(&"x".into()).unwrap(), "x");
        assert!(TextParser.parse_object(&ParsedValue::Int(1)).is_err());
    }
}
