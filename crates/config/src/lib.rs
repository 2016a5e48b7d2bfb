//! Configuration loading, validation, and management for NodeBuilder.
//!
//! Loads configuration from `nodebuilder.toml` (or the file named by
//! `NODEBUILDER_CONFIG`) with environment variable overrides. Validates all
//! settings at load time, so a misconfigured mapper fails at startup rather
//! than on the first mapped request.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use nodebuilder_core::AssociationKind;
use nodebuilder_core::DirectiveStrategy;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "nodebuilder.toml";

/// The root configuration structure.
///
/// Maps directly to `nodebuilder.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeBuilderConfig {
    /// Mapper settings
    #[serde(default)]
    pub mapper: MapperConfig,

    /// Entity schema definitions, in declaration order
    #[serde(default)]
    pub entities: Vec<EntityConfig>,

    /// Per-field directives: entity name -> field name -> directive
    #[serde(default)]
    pub directives: HashMap<String, HashMap<String, DirectiveConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Assignment strategy: "direct", "method" or "reflection"
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Prefix of derived setter method names
    #[serde(default = "default_setter_prefix")]
    pub setter_prefix: String,

    /// Maximum relation nesting depth when building entity graphs
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_strategy() -> String {
    "method".into()
}
fn default_setter_prefix() -> String {
    nodebuilder_core::naming::DEFAULT_SETTER_PREFIX.into()
}
fn default_max_depth() -> usize {
    32
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            setter_prefix: default_setter_prefix(),
            max_depth: default_max_depth(),
        }
    }
}

impl MapperConfig {
    /// Resolve into typed settings.
    pub fn settings(&self) -> Result<MapperSettings, ConfigError> {
        Ok(MapperSettings {
            strategy: self.strategy.parse()?,
            setter_prefix: self.setter_prefix.clone(),
            max_depth: self.max_depth,
        })
    }
}

/// Which assignment strategy binds setters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Write public fields directly.
    Direct,
    /// Call a named setter method.
    #[default]
    Method,
    /// Write any field under scoped privileged access.
    Reflection,
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "method" => Ok(Self::Method),
            "reflection" => Ok(Self::Reflection),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Direct => "direct",
            Self::Method => "method",
            Self::Reflection => "reflection",
        };
        f.write_str(s)
    }
}

/// Typed mapper settings, passed to the engine at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperSettings {
    pub strategy: StrategyKind,
    pub setter_prefix: String,
    pub max_depth: usize,
}

impl MapperSettings {
    pub fn with_strategy(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            setter_prefix: default_setter_prefix(),
            max_depth: default_max_depth(),
        }
    }
}

/// One entity type of the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,

    /// Scalar field names, in declaration order
    #[serde(default)]
    pub fields: Vec<String>,

    /// Primary-key field names; each must also be a scalar field
    #[serde(default)]
    pub primary_key: Vec<String>,

    /// Associations, in declaration order
    #[serde(default)]
    pub associations: Vec<AssociationConfig>,

    /// Seed rows for the in-memory store, as inline tables
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationConfig {
    pub name: String,
    pub target: String,
    pub kind: AssociationKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectiveConfig {
    /// Explicit setter method name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setter: Option<String>,

    /// Transform names, applied in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middleware: Vec<String>,

    #[serde(default)]
    pub strategy: DirectiveStrategy,
}

impl NodeBuilderConfig {
    /// Load configuration from `NODEBUILDER_CONFIG` or `./nodebuilder.toml`.
    ///
    /// Environment overrides:
    /// - `NODEBUILDER_STRATEGY` replaces `mapper.strategy`
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

        tracing::debug!(
            path = %path.display(),
            entities = config.entities.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// The config file path used by [`load`](Self::load).
    pub fn default_path() -> PathBuf {
        std::env::var("NODEBUILDER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Apply environment overrides (`NODEBUILDER_STRATEGY`).
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(strategy) = std::env::var("NODEBUILDER_STRATEGY") {
            strategy.parse::<StrategyKind>()?;
            self.mapper.strategy = strategy;
        }
        Ok(())
    }

    /// Typed mapper settings.
    pub fn settings(&self) -> Result<MapperSettings, ConfigError> {
        self.mapper.settings()
    }

    pub fn entity(&self, name: &str) -> Option<&EntityConfig> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.mapper.settings()?;

        if self.mapper.max_depth == 0 {
            return Err(ConfigError::ValidationError(
                "mapper.max_depth must be at least 1".into(),
            ));
        }

        let mut names = HashSet::new();
        for entity in &self.entities {
            if !names.insert(entity.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "entity {} is declared more than once",
                    entity.name
                )));
            }
        }

        for entity in &self.entities {
            let assoc_names = entity.associations.iter().map(|a| &a.name);
            for (list, names) in [
                ("fields", first_duplicate(entity.fields.iter())),
                ("primary_key", first_duplicate(entity.primary_key.iter())),
                ("associations", first_duplicate(assoc_names)),
            ] {
                if let Some(name) = names {
                    return Err(ConfigError::ValidationError(format!(
                        "{name} is listed more than once in {}.{list}",
                        entity.name
                    )));
                }
            }

            let fields: HashSet<&str> = entity.fields.iter().map(String::as_str).collect();

            if let Some(pk) = entity.primary_key.iter().find(|pk| !fields.contains(pk.as_str())) {
                return Err(ConfigError::ValidationError(format!(
                    "primary key {pk} of {} is not a declared field",
                    entity.name
                )));
            }

            for assoc in &entity.associations {
                if fields.contains(assoc.name.as_str()) {
                    return Err(ConfigError::ValidationError(format!(
                        "{}.{} is declared both as a field and an association",
                        entity.name, assoc.name
                    )));
                }
                if !names.contains(assoc.target.as_str()) {
                    return Err(ConfigError::ValidationError(format!(
                        "association {}.{} targets undeclared entity {}",
                        entity.name, assoc.name, assoc.target
                    )));
                }
            }
        }

        for (entity_name, fields) in &self.directives {
            let Some(entity) = self.entity(entity_name) else {
                return Err(ConfigError::ValidationError(format!(
                    "directives declared for undeclared entity {entity_name}"
                )));
            };
            for field in fields.keys() {
                let known = entity.fields.contains(field)
                    || entity.associations.iter().any(|a| &a.name == field);
                if !known {
                    return Err(ConfigError::ValidationError(format!(
                        "directive for unknown member {entity_name}.{field}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Generate an example config TOML string.
    pub fn example_toml() -> String {
        let config = Self {
            mapper: MapperConfig::default(),
            entities: vec![EntityConfig {
                name: "Invoice".into(),
                fields: vec!["id".into(), "total".into()],
                primary_key: vec!["id".into()],
                associations: vec![],
                rows: vec![],
            }],
            directives: HashMap::new(),
        };
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a String>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.map(String::as_str).find(|name| !seen.insert(*name))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Unknown assignment strategy: {0} (expected direct, method or reflection)")]
    UnknownStrategy(String),
}

impl From<ConfigError> for nodebuilder_core::Error {
    fn from(err: ConfigError) -> Self {
        nodebuilder_core::Error::Config {
            message: err.to_string(),
        }
    }
}
