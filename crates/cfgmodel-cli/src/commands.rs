use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::bail;
use colored::Colorize;
use serde::Serialize;

use cfgmodel_core::{
    ConfigError, ConfigModel, ConfigObserver, DefaultConfigModel, ExconfigModel, Loader,
    MapLoader, ObserverResult,
};
use cfgmodel_types::{
    AnyValue, ConfigEntry, ConfigFirmProps, ConfigKey, ParsedValue, SharedChecker, SharedParser,
};
use cfgmodel_util::unmodifiable;

use crate::cli::*;
use crate::specs::{parse_assignment, parse_checker, parse_parser};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Inspect(args) => cmd_inspect(args, cli.format),
        Command::Check(args) => cmd_check(args, cli.format),
    }
}

/// Remembers value changes so `inspect` can list what `--set` did.
#[derive(Default)]
struct ChangeLog {
    changes: Mutex<Vec<(String, String, String)>>,
}

impl ConfigObserver for ChangeLog {
    fn current_value_changed(
        &self,
        key: &ConfigKey,
        old: &str,
        new: &str,
        _valid: &str,
    ) -> ObserverResult {
        if let Ok(mut changes) = self.changes.lock() {
            changes.push((key.to_string(), old.to_string(), new.to_string()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct KeyReport {
    key: String,
    default: String,
    current: String,
    valid_value: String,
    current_valid: bool,
    checker: String,
    parser: Option<String>,
    parsed: Option<ParsedValue>,
}

fn build_model(args: &InspectArgs) -> anyhow::Result<DefaultConfigModel> {
    let mut checkers: BTreeMap<&str, SharedChecker> = BTreeMap::new();
    let mut parsers: BTreeMap<&str, SharedParser> = BTreeMap::new();
    let mut defaults: BTreeMap<&str, &str> = BTreeMap::new();

    for arg in &args.keys {
        let (name, default) = parse_assignment(arg)?;
        if defaults.insert(name, default).is_some() {
            bail!("key {name} defined twice");
        }
    }
    for arg in &args.checkers {
        let (name, spec) = parse_assignment(arg)?;
        if !defaults.contains_key(name) {
            return Err(ConfigError::KeyNotFound(ConfigKey::new(name)).into());
        }
        checkers.insert(name, parse_checker(spec)?);
    }
    for arg in &args.parsers {
        let (name, spec) = parse_assignment(arg)?;
        if !defaults.contains_key(name) {
            return Err(ConfigError::KeyNotFound(ConfigKey::new(name)).into());
        }
        parsers.insert(name, parse_parser(spec)?);
    }

    let mut entries = Vec::with_capacity(defaults.len());
    for (name, default) in defaults {
        let key = ConfigKey::parse(name)?;
        let checker = checkers
            .remove(name)
            .unwrap_or_else(|| Arc::new(AnyValue));
        let mut entry = ConfigEntry::new(key, ConfigFirmProps::new(default, checker)?);
        if let Some(parser) = parsers.remove(name) {
            entry = entry.with_parser(parser);
        }
        entries.push(entry);
    }
    Ok(DefaultConfigModel::from_entries(entries))
}

fn report<M: ExconfigModel>(model: &M) -> Vec<KeyReport> {
    model
        .key_set()
        .iter()
        .filter_map(|key| model.record(key))
        .map(|record| KeyReport {
            key: record.key().to_string(),
            default: record.firm_props().default_value().to_string(),
            current: record.current_value().to_string(),
            valid_value: record.valid_value().to_string(),
            current_valid: record.is_current_value_valid(),
            checker: record.firm_props().checker().describe(),
            parser: record.parser().map(|p| p.name().to_string()),
            parsed: model.parsed_value(record.key()).ok().flatten(),
        })
        .collect()
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut model = build_model(&args)?;
    let changes = Arc::new(ChangeLog::default());
    model.subscribe(changes.clone())?;

    let mut values = BTreeMap::new();
    for arg in &args.sets {
        let (name, value) = parse_assignment(arg)?;
        values.insert(name.to_string(), value.to_string());
    }
    let mut loader = MapLoader::new(values);
    if args.strict {
        loader = loader.require_valid();
    }
    let errors = loader.continuous_load(&mut model);

    let reports = report(&unmodifiable(&model));
    match format {
        OutputFormat::Json => {
            let errors: Vec<String> = errors.iter().map(ToString::to_string).collect();
            let out = serde_json::json!({ "keys": reports, "errors": errors });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            if reports.is_empty() {
                println!("No keys defined.");
            }
            for r in &reports {
                let current = if r.current_valid {
                    r.current.green()
                } else {
                    r.current.red()
                };
                println!("{} = {}", r.key.bold(), current);
                if !r.current_valid {
                    println!("  {} invalid, using default {}", "✗".red(), r.valid_value.yellow());
                }
                println!("  default: {}  checker: {}", r.default, r.checker.cyan());
                if let Some(parser) = &r.parser {
                    let parsed = r
                        .parsed
                        .as_ref()
                        .map_or_else(|| "(unparseable)".dimmed().to_string(), |v| v.to_string());
                    println!("  parser: {}  parsed: {}", parser.cyan(), parsed);
                }
            }
            let changes = changes.changes.lock().map(|c| c.clone()).unwrap_or_default();
            if !changes.is_empty() {
                println!();
                for (key, old, new) in &changes {
                    println!("{} {}: {} → {}", "✓".green(), key.bold(), old.dimmed(), new);
                }
            }
            for e in &errors {
                println!("{} {}", "✗".red().bold(), e);
            }
        }
    }

    if !errors.is_empty() {
        bail!("{} value(s) could not be applied", errors.len());
    }
    Ok(())
}

fn cmd_check(args: CheckArgs, format: OutputFormat) -> anyhow::Result<()> {
    let checker = parse_checker(&args.checker)?;
    let valid = checker.is_valid(&args.value);
    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "value": args.value,
                "checker": checker.describe(),
                "valid": valid,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text if valid => {
            println!("{} {:?} is {}", "✓".green().bold(), args.value, checker.describe().cyan());
        }
        OutputFormat::Text => {
            println!(
                "{} {:?} is not {}",
                "✗".red().bold(),
                args.value,
                checker.describe().cyan()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inspect(keys: &[&str], checkers: &[&str], parsers: &[&str]) -> InspectArgs {
        let owned =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        InspectArgs {
            keys: owned(keys),
            checkers: owned(checkers),
            parsers: owned(parsers),
            sets: Vec::new(),
            strict: false,
        }
    }

    #[test]
    fn builds_model_from_args() {
        let args = inspect(
            &["server.port=8080", "log.level=info"],
            &["server.port=port", "log.level=oneof:debug|info"],
            &["server.port=int"],
        );
        let mut model = build_model(&args).unwrap();
        assert_eq!(model.len(), 2);
        model.set_current_value("server.port", "99999").unwrap();

        let reports = report(&model);
        let port = reports.iter().find(|r| r.key == "server.port").unwrap();
        assert_eq!(port.valid_value, "8080");
        assert!(!port.current_valid);
        assert_eq!(port.parsed, Some(ParsedValue::Int(8080)));
        let level = reports.iter().find(|r| r.key == "log.level").unwrap();
        assert_eq!(level.parser, None);
        assert_eq!(level.checker, "one of [debug, info]");
    }

    #[test]
    fn invalid_default_is_rejected() {
        let args = inspect(&["server.port=http"], &["server.port=port"], &[]);
        assert!(build_model(&args).is_err());
    }

    #[test]
    fn checker_for_undefined_key_is_rejected() {
        let args = inspect(&["a=1"], &["b=int"], &[]);
        let err = build_model(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::KeyNotFound(_))
        ));
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let args = inspect(&["a=1", "a=2"], &[], &[]);
        assert!(build_model(&args).is_err());
    }
}
