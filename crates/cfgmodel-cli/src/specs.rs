//! Parsing of the small command-line specs for checkers and parsers.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};

use cfgmodel_types::{
    AnyValue, BooleanParser, BooleanValue, FloatParser, FloatRange, IntegerParser, IntegerRange,
    JsonParser, ListParser, NonEmpty, Not, OneOf, SharedChecker, SharedParser, TextParser,
};

/// Split `NAME=VALUE` at the first `=`.
pub fn parse_assignment(arg: &str) -> anyhow::Result<(&str, &str)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got {arg:?}"))?;
    if name.trim().is_empty() {
        bail!("missing key name in {arg:?}");
    }
    Ok((name, value))
}

pub fn parse_checker(spec: &str) -> anyhow::Result<SharedChecker> {
    let (kind, arg) = match spec.split_once(':') {
        Some((kind, arg)) => (kind, Some(arg)),
        None => (spec, None),
    };
    let checker: SharedChecker = match (kind, arg) {
        ("any", None) => Arc::new(AnyValue),
        ("nonempty", None) => Arc::new(NonEmpty),
        ("bool", None) => Arc::new(BooleanValue),
        ("int", None) => Arc::new(IntegerRange::any()),
        ("port", None) => Arc::new(IntegerRange::port()),
        ("range", Some(bounds)) => {
            let (min, max) = parse_bounds::<i64>(bounds)?;
            Arc::new(IntegerRange::new(min, max))
        }
        ("float", None) => Arc::new(FloatRange::new(f64::MIN, f64::MAX)),
        ("float", Some(bounds)) => {
            let (min, max) = parse_bounds::<f64>(bounds)?;
            Arc::new(FloatRange::new(min, max))
        }
        ("oneof", Some(values)) => Arc::new(OneOf::new(values.split('|'))),
        ("not", Some(inner)) => Arc::new(Not(parse_checker(inner)?)),
        _ => bail!("unknown checker spec {spec:?}"),
    };
    Ok(checker)
}

pub fn parse_parser(spec: &str) -> anyhow::Result<SharedParser> {
    let parser: SharedParser = match spec.split_once(':') {
        Some(("list", element)) => Arc::new(ListParser::comma(parse_parser(element)?)),
        Some(_) => bail!("unknown parser spec {spec:?}"),
        None => match spec {
            "text" => Arc::new(TextParser),
            "int" => Arc::new(IntegerParser),
            "float" => Arc::new(FloatParser),
            "bool" => Arc::new(BooleanParser),
            "json" => Arc::new(JsonParser),
            _ => bail!("unknown parser spec {spec:?}"),
        },
    };
    Ok(parser)
}

fn parse_bounds<T>(bounds: &str) -> anyhow::Result<(T, T)>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let (min, max) = bounds
        .split_once("..")
        .ok_or_else(|| anyhow!("expected MIN..MAX, got {bounds:?}"))?;
    let min = min
        .trim()
        .parse()
        .with_context(|| format!("bad lower bound in {bounds:?}"))?;
    let max = max
        .trim()
        .parse()
        .with_context(|| format!("bad upper bound in {bounds:?}"))?;
    Ok((min, max))
}
