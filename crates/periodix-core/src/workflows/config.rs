use crate::core::models::atoms::{ATYPE_KEY, POS_KEY};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Default length unit of exported box dimensions.
pub const DEFAULT_BOX_UNIT: &str = "angstrom";

/// Unit name that selects fractional positions.
pub const SCALED_UNIT: &str = "scaled";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error in '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("TOML parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Atom property '{0}' is always exported and cannot be requested")]
    ReservedProperty(String),

    #[error("Atom property '{0}' is requested more than once")]
    DuplicateProperty(String),

    #[error("Unit for '{0}' must not be empty")]
    EmptyUnit(String),
}

/// How exported atom positions are expressed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PositionUnit {
    /// Fractional coordinates of the box.
    #[default]
    Scaled,
    /// Absolute coordinates converted to the named length unit.
    Unit(String),
}

impl PositionUnit {
    pub fn as_str(&self) -> &str {
        match self {
            PositionUnit::Scaled => SCALED_UNIT,
            PositionUnit::Unit(unit) => unit,
        }
    }
}

impl FromStr for PositionUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(ConfigError::EmptyUnit(POS_KEY.to_string())),
            SCALED_UNIT => Ok(PositionUnit::Scaled),
            unit => Ok(PositionUnit::Unit(unit.to_string())),
        }
    }
}

impl fmt::Display for PositionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An extra per-atom property to include in an exported model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomPropertySpec {
    pub name: String,
    /// Unit to convert the value to; `None` exports the stored value unchanged.
    pub unit: Option<String>,
}

/// Options of a cell model export.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub box_unit: String,
    /// One symbol per atom type, indexed by `atype - 1`.
    pub symbols: Option<Vec<String>>,
    pub position_unit: PositionUnit,
    /// Extra properties, exported in this order after the position.
    pub atom_properties: Vec<AtomPropertySpec>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            box_unit: DEFAULT_BOX_UNIT.to_string(),
            symbols: None,
            position_unit: PositionUnit::Scaled,
            atom_properties: Vec::new(),
        }
    }
}

impl ModelConfig {
    pub fn builder() -> ModelConfigBuilder {
        ModelConfigBuilder::new()
    }

    /// Parses a configuration from TOML text.
    ///
    /// ```toml
    /// box-unit = "nm"
    /// symbols = ["Fe", "Ni"]
    /// position-unit = "scaled"
    ///
    /// [[atom-property]]
    /// name = "charge"
    /// unit = "e"
    /// ```
    ///
    /// Every key is optional; omitted keys take their default values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ModelConfigFile = toml::from_str(content)?;
        file.into_builder()?.build()
    }

    /// Loads a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: ModelConfigFile = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        file.into_builder()?.build()
    }
}

#[derive(Debug, Default, Clone)]
pub struct ModelConfigBuilder {
    box_unit: Option<String>,
    symbols: Option<Vec<String>>,
    position_unit: Option<PositionUnit>,
    atom_properties: Vec<AtomPropertySpec>,
}

impl ModelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn box_unit(mut self, unit: &str) -> Self {
        self.box_unit = Some(unit.to_string());
        self
    }
    pub fn symbols<S: Into<String>>(mut self, symbols: impl IntoIterator<Item = S>) -> Self {
        self.symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }
    pub fn position_unit(mut self, unit: PositionUnit) -> Self {
        self.position_unit = Some(unit);
        self
    }
    pub fn atom_property(mut self, name: &str, unit: Option<&str>) -> Self {
        self.atom_properties.push(AtomPropertySpec {
            name: name.to_string(),
            unit: unit.map(str::to_string),
        });
        self
    }

    /// Validates the options and fills in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty unit, a reserved (`atype`, `pos`)
    /// or repeated extra property.
    pub fn build(self) -> Result<ModelConfig, ConfigError> {
        let box_unit = self
            .box_unit
            .unwrap_or_else(|| DEFAULT_BOX_UNIT.to_string());
        if box_unit.trim().is_empty() {
            return Err(ConfigError::EmptyUnit("box".to_string()));
        }
        if let Some(PositionUnit::Unit(unit)) = &self.position_unit {
            if unit.trim().is_empty() {
                return Err(ConfigError::EmptyUnit(POS_KEY.to_string()));
            }
        }

        let mut seen = HashSet::new();
        for spec in &self.atom_properties {
            if spec.name == ATYPE_KEY || spec.name == POS_KEY {
                return Err(ConfigError::ReservedProperty(spec.name.clone()));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateProperty(spec.name.clone()));
            }
            if spec.unit.as_deref().is_some_and(|unit| unit.trim().is_empty()) {
                return Err(ConfigError::EmptyUnit(spec.name.clone()));
            }
        }

        Ok(ModelConfig {
            box_unit,
            symbols: self.symbols,
            position_unit: self.position_unit.unwrap_or_default(),
            atom_properties: self.atom_properties,
        })
    }
}

impl From<ModelConfig> for ModelConfigBuilder {
    fn from(config: ModelConfig) -> Self {
        Self {
            box_unit: Some(config.box_unit),
            symbols: config.symbols,
            position_unit: Some(config.position_unit),
            atom_properties: config.atom_properties,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ModelConfigFile {
    box_unit: Option<String>,
    symbols: Option<Vec<String>>,
    position_unit: Option<String>,
    #[serde(default)]
    atom_property: Vec<AtomPropertyFile>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct AtomPropertyFile {
    name: String,
    unit: Option<String>,
}

impl ModelConfigFile {
    fn into_builder(self) -> Result<ModelConfigBuilder, ConfigError> {
        let mut builder = ModelConfigBuilder::new();
        if let Some(unit) = &self.box_unit {
            builder = builder.box_unit(unit);
        }
        if let Some(symbols) = self.symbols {
            builder = builder.symbols(symbols);
        }
        if let Some(unit) = &self.position_unit {
            builder = builder.position_unit(unit.parse()?);
        }
        for property in &self.atom_property {
            builder = builder.atom_property(&property.name, property.unit.as_deref());
        }
        Ok(builder)
    }
}
