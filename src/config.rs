//! JSON option-table declarations.
//!
//! A [`TableConfig`] describes the options; [`SlotStorage`] owns one slot per
//! option name; [`TableConfig::bind`] ties the two into an [`OptionTable`]
//! the parser can run on.

use crate::table::{BoundValue, OptionDescriptor, OptionTable};
use serde::Deserialize;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during config parsing and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON table: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("option #{0} has no short or long name")]
    NoOptionSpecified(usize),

    #[error("invalid short option '{0}': must be a single visible character other than '-', '+' or '='")]
    InvalidShortOption(char),

    #[error("invalid long option '{0}'")]
    InvalidLongOption(String),

    #[error("options named '{0}' disagree on whether they take a value")]
    ConflictingKinds(String),

    #[error("no slot for option '{0}'")]
    MissingSlot(String),
}

/// Whether an option takes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    /// A flag
    #[default]
    None,
    /// The value may be omitted
    Optional,
    /// The value must be given
    Required,
}

/// Configuration for a single option.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionConfig {
    /// Key for the option's slot; options sharing a name share a slot
    pub name: Option<String>,
    /// Short option character (e.g., 'c' for -c)
    pub short: Option<char>,
    /// Long option name (e.g., "command" for --command)
    pub long: Option<String>,
    #[serde(default)]
    pub arg: ArgKind,
    /// Accept `+c` to unset
    #[serde(default)]
    pub negatable: bool,
    /// Placeholder for the value in usage text
    pub value_name: Option<String>,
    /// Help text; `$` stands for the value name
    pub help: Option<String>,
}

impl OptionConfig {
    /// The slot key: explicit name, else long name, else short name.
    pub fn effective_name(&self) -> Option<String> {
        self.name
            .clone()
            .or_else(|| self.long.clone())
            .or_else(|| self.short.map(String::from))
    }

    fn takes_value(&self) -> bool {
        self.arg != ArgKind::None
    }

    fn to_descriptor<'s>(&self, cell: &'s SlotCell) -> Option<OptionDescriptor<'s>> {
        let mut descriptor = match (self.arg, cell) {
            (ArgKind::None, SlotCell::Flag(flag)) => OptionDescriptor::flag(flag),
            (ArgKind::Optional, SlotCell::Value(value)) => OptionDescriptor::optional(value),
            (ArgKind::Required, SlotCell::Value(value)) => OptionDescriptor::required(value),
            _ => return None,
        };

        if let Some(short) = self.short {
            descriptor = descriptor.short(short);
        }
        if let Some(ref long) = self.long {
            descriptor = descriptor.long(long.clone());
        }
        if self.negatable {
            descriptor = descriptor.negatable();
        }
        if let Some(ref value_name) = self.value_name {
            descriptor = descriptor.value_name(value_name.clone());
        }
        if let Some(ref help) = self.help {
            descriptor = descriptor.description(help.clone());
        }
        Some(descriptor)
    }
}

/// Top-level table declaration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TableConfig {
    /// First line of the usage text
    pub header: Option<String>,
    /// Last line of the usage text
    pub footer: Option<String>,
    /// Placeholders for required positionals, shown after `[options]`
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub options: Vec<OptionConfig>,
}

impl TableConfig {
    /// Parse a JSON string into a TableConfig.
    pub fn from_json(json: &str) -> Result<TableConfig, ConfigError> {
        let config: TableConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Read and parse a JSON file.
    pub fn from_file(path: &Path) -> Result<TableConfig, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Validate the declaration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut kinds: HashMap<String, bool> = HashMap::new();

        for (index, option) in self.options.iter().enumerate() {
            let Some(name) = option.effective_name() else {
                return Err(ConfigError::NoOptionSpecified(index));
            };

            if let Some(short) = option.short {
                if !short.is_ascii_graphic() || matches!(short, '-' | '+' | '=') {
                    return Err(ConfigError::InvalidShortOption(short));
                }
            }

            if let Some(ref long) = option.long {
                if long.is_empty()
                    || long.starts_with('-')
                    || long.contains('=')
                    || long.chars().any(char::is_whitespace)
                {
                    return Err(ConfigError::InvalidLongOption(long.clone()));
                }
            }

            if option.short.is_none() && option.long.is_none() {
                return Err(ConfigError::NoOptionSpecified(index));
            }

            if let Some(takes_value) = kinds.insert(name.clone(), option.takes_value()) {
                if takes_value != option.takes_value() {
                    return Err(ConfigError::ConflictingKinds(name));
                }
            }
        }

        Ok(())
    }

    /// Build an option table whose slots live in `storage`.
    pub fn bind<'s>(&self, storage: &'s SlotStorage) -> Result<OptionTable<'s>, ConfigError> {
        let mut table = OptionTable::default();

        for (index, option) in self.options.iter().enumerate() {
            let name = option
                .effective_name()
                .ok_or(ConfigError::NoOptionSpecified(index))?;
            let cell = storage
                .get(&name)
                .ok_or_else(|| ConfigError::MissingSlot(name.clone()))?;
            let descriptor = option
                .to_descriptor(cell)
                .ok_or(ConfigError::ConflictingKinds(name))?;
            table.push(descriptor);
        }

        Ok(table)
    }
}

/// Owned storage for one option slot.
#[derive(Debug)]
pub enum SlotCell {
    Flag(Cell<bool>),
    Value(RefCell<Option<BoundValue>>),
}

/// Slots for every option name in a [`TableConfig`], in declaration order.
#[derive(Debug, Default)]
pub struct SlotStorage {
    slots: Vec<(String, SlotCell)>,
}

impl SlotStorage {
    /// Allocate one slot per distinct option name.
    pub fn for_config(config: &TableConfig) -> Self {
        let mut storage = Self::default();

        for option in &config.options {
            let Some(name) = option.effective_name() else {
                continue;
            };
            if storage.get(&name).is_some() {
                continue;
            }
            let cell = if option.takes_value() {
                SlotCell::Value(RefCell::new(None))
            } else {
                SlotCell::Flag(Cell::new(false))
            };
            storage.slots.push((name, cell));
        }

        storage
    }

    pub fn get(&self, name: &str) -> Option<&SlotCell> {
        self.slots
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cell)| cell)
    }

    /// Current value of a flag slot.
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            SlotCell::Flag(flag) => Some(flag.get()),
            SlotCell::Value(_) => None,
        }
    }

    /// Current value of a value slot.
    pub fn value(&self, name: &str) -> Option<BoundValue> {
        match self.get(name)? {
            SlotCell::Value(value) => value.borrow().clone(),
            SlotCell::Flag(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SlotCell)> {
        self.slots.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ArgPolicy;

    const SHELL: &str = r#"{
        "header": "example shell, version 0.0.1",
        "footer": "Home page : https://example.com/shell",
        "required": ["output_file"],
        "options": [
            {"short": "i", "long": "interactive", "help": "Start an interactive shell"},
            {"short": "c", "long": "command", "arg": "required", "value_name": "line",
             "help": "Execute $ as a command"},
            {"short": "a", "negatable": true, "help": "Always export variables on assignment"},
            {"name": "print_options", "short": "o", "arg": "optional", "negatable": true,
             "value_name": "option"},
            {"name": "help", "long": "help", "help": "Show this help message"},
            {"name": "help", "long": "usage", "help": "Show this help message"}
        ]
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config = TableConfig::from_json(SHELL).unwrap();
        assert_eq!(config.header.as_deref(), Some("example shell, version 0.0.1"));
        assert_eq!(config.required, vec!["output_file"]);
        assert_eq!(config.options.len(), 6);

        let command = &config.options[1];
        assert_eq!(command.short, Some('c'));
        assert_eq!(command.arg, ArgKind::Required);
        assert_eq!(command.value_name.as_deref(), Some("line"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = TableConfig::from_json("{}").unwrap();
        assert!(config.options.is_empty());
        assert!(config.header.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_arg_defaults_to_none() {
        let config = TableConfig::from_json(r#"{"options":[{"short":"v"}]}"#).unwrap();
        assert_eq!(config.options[0].arg, ArgKind::None);
        assert!(!config.options[0].negatable);
    }

    #[test]
    fn test_effective_name_fallback() {
        let config = TableConfig::from_json(SHELL).unwrap();
        assert_eq!(config.options[0].effective_name().as_deref(), Some("interactive"));
        assert_eq!(config.options[2].effective_name().as_deref(), Some("a"));
        assert_eq!(config.options[3].effective_name().as_deref(), Some("print_options"));
    }

    #[test]
    fn test_error_on_invalid_json() {
        assert!(matches!(
            TableConfig::from_json("{"),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            TableConfig::from_json(r#"{"options":[{"short":"ab"}]}"#),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            TableConfig::from_json(r#"{"options":[{"short":"a","arg":"sometimes"}]}"#),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_error_on_unnamed_option() {
        let config = TableConfig::from_json(r#"{"options":[{"help":"nothing"}]}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoOptionSpecified(0))
        ));

        let config = TableConfig::from_json(r#"{"options":[{"name":"x"}]}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoOptionSpecified(0))
        ));
    }

    #[test]
    fn test_error_on_invalid_short_option() {
        for short in ["-", "+", "=", " "] {
            let json = format!(r#"{{"options":[{{"short":"{}"}}]}}"#, short);
            let config = TableConfig::from_json(&json).unwrap();
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidShortOption(_))
            ));
        }
    }

    #[test]
    fn test_error_on_invalid_long_option() {
        let config = TableConfig::from_json(r#"{"options":[{"long":"a=b"}]}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLongOption(_))
        ));
    }

    #[test]
    fn test_error_on_conflicting_kinds() {
        let config = TableConfig::from_json(
            r#"{"options":[
                {"name":"x","long":"flag"},
                {"name":"x","long":"value","arg":"required"}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ConflictingKinds(ref name)) if name == "x"
        ));
    }

    #[test]
    fn test_storage_shares_slots_by_name() {
        let config = TableConfig::from_json(SHELL).unwrap();
        let storage = SlotStorage::for_config(&config);

        assert_eq!(storage.len(), 5);
        assert_eq!(storage.flag("help"), Some(false));
        assert_eq!(storage.value("command"), None);
        assert_eq!(storage.flag("command"), None);
        assert!(storage.get("usage").is_none());
    }

    #[test]
    fn test_bind_builds_table() {
        let config = TableConfig::from_json(SHELL).unwrap();
        let storage = SlotStorage::for_config(&config);
        let table = config.bind(&storage).unwrap();

        assert_eq!(table.len(), 6);
        assert!(table.validate().is_ok());

        let options = table.options();
        assert_eq!(options[0].policy(), ArgPolicy::None);
        assert_eq!(options[1].policy(), ArgPolicy::Required);
        assert_eq!(options[3].policy(), ArgPolicy::Optional);
        assert!(options[3].negatable);
        assert_eq!(options[1].description.as_deref(), Some("Execute $ as a command"));
    }

    #[test]
    fn test_bind_with_foreign_storage_fails() {
        let config = TableConfig::from_json(SHELL).unwrap();
        let storage = SlotStorage::default();
        assert!(matches!(
            config.bind(&storage),
            Err(ConfigError::MissingSlot(_))
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let result = TableConfig::from_file(Path::new("/nonexistent/dashopt/table.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
