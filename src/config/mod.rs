//! Configuration for Mima runs (mima.toml)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::interpreter::{
    Environment, InstructionSet, InterpreterConfig, Memory, RuntimeError, StackGuard, Value,
};
use crate::parser::include::{FsResolver, DEFAULT_EXTENSIONS};
use crate::parser::Keyword;

/// Name of the configuration file looked up by [`Config::discover`]
pub const CONFIG_FILE: &str = "mima.toml";

/// Mima configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Machine model
    #[serde(default)]
    pub machine: MachineConfig,

    /// Interpreter behavior
    #[serde(default)]
    pub interpreter: InterpreterSection,

    /// Include resolution
    #[serde(default)]
    pub include: IncludeConfig,

    /// Global constants visible to every program
    #[serde(default)]
    pub constants: BTreeMap<String, i64>,

    /// Directory of the file this configuration was loaded from
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// `[machine]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MachineConfig {
    #[serde(default)]
    pub instruction_set: InstructionSet,

    /// Word length in bits; defaults to the instruction set's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_length: Option<u32>,

    /// Constant length in bits; defaults to the instruction set's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant_word_length: Option<u32>,

    /// Addresses `0..memory-capacity` start out as zero
    #[serde(default)]
    pub memory_capacity: usize,
}

/// `[interpreter]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterpreterSection {
    #[serde(default = "default_stack_budget")]
    pub stack_budget: usize,

    /// Log every executed instruction
    #[serde(default)]
    pub trace: bool,
}

impl Default for InterpreterSection {
    fn default() -> Self {
        Self {
            stack_budget: default_stack_budget(),
            trace: false,
        }
    }
}

fn default_stack_budget() -> usize {
    StackGuard::DEFAULT_BUDGET
}

/// `[include]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IncludeConfig {
    /// Directories searched after the including file's own directory
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Extensions tried for requests without one
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        let mut config = Self::parse(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate a configuration from TOML
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Find `mima.toml` in `start` or one of its ancestors
    pub fn discover(start: &Path) -> Result<Option<Self>, ConfigError> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Self::load(&candidate).map(Some);
            }
        }
        Ok(None)
    }

    /// Serialize the configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let word = self.word_length();
        if !(1..=63).contains(&word) {
            return Err(ConfigError::Validation(format!(
                "word-length must be between 1 and 63, got {word}"
            )));
        }
        let constant = self.constant_word_length();
        if constant == 0 || constant > word {
            return Err(ConfigError::Validation(format!(
                "constant-word-length must be between 1 and word-length ({word}), got {constant}"
            )));
        }
        if self.interpreter.stack_budget == 0 {
            return Err(ConfigError::Validation(
                "stack-budget must be at least 1".to_string(),
            ));
        }
        if self.include.extensions.iter().any(String::is_empty) {
            return Err(ConfigError::Validation(
                "include extensions must not be empty".to_string(),
            ));
        }
        for name in self.constants.keys() {
            if !is_identifier(name) {
                return Err(ConfigError::Validation(format!(
                    "`{name}` is not a valid constant name"
                )));
            }
        }
        Ok(())
    }

    pub fn word_length(&self) -> u32 {
        self.machine
            .word_length
            .unwrap_or_else(|| self.machine.instruction_set.word_length())
    }

    pub fn constant_word_length(&self) -> u32 {
        self.machine
            .constant_word_length
            .unwrap_or_else(|| self.machine.instruction_set.constant_word_length())
    }

    pub fn interpreter_config(&self) -> InterpreterConfig {
        InterpreterConfig {
            instruction_set: self.machine.instruction_set,
            word_length: self.word_length(),
            constant_word_length: self.constant_word_length(),
            stack_budget: self.interpreter.stack_budget,
            trace: self.interpreter.trace,
        }
    }

    /// Environment whose root scope holds the configured constants
    pub fn environment(&self) -> Result<Environment, RuntimeError> {
        Environment::with_globals(
            self.constants
                .iter()
                .map(|(name, value)| (name.clone(), Value::Number(*value))),
        )
    }

    pub fn memory(&self) -> Memory {
        Memory::with_capacity(self.machine.memory_capacity)
    }

    /// Filesystem resolver; relative search paths start at the config's directory
    pub fn include_resolver(&self) -> FsResolver {
        let search_paths = self
            .include
            .search_paths
            .iter()
            .map(|path| match &self.base_dir {
                Some(base) if path.is_relative() => base.join(path),
                _ => path.clone(),
            })
            .collect();
        FsResolver::new(search_paths, self.include.extensions.clone())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c == '_' || unicode_xid::UnicodeXID::is_xid_start(c));
    starts_well
        && chars.all(unicode_xid::UnicodeXID::is_xid_continue)
        && Keyword::lookup(name).is_none()
}

#[cfg(test)]
mod tests;
