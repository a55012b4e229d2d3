pub mod bits;
pub mod code;
mod level;
mod toggle;

pub use level::OptLevel;
pub use toggle::{Toggle, Toggles};

use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("empty configuration code")]
    Empty,
    #[error("unknown optimization level code '{0}'")]
    UnknownLevel(char),
    #[error("unknown toggle code '{0}'")]
    UnknownToggle(char),
    #[error("toggle '{0}' appears more than once")]
    DuplicateToggle(char),
    #[error("expected {expected} flag bits, found {found}")]
    BitLength { expected: usize, found: usize },
    #[error("invalid flag bit '{0}'")]
    InvalidBit(char),
    #[error("more than one optimization level is set")]
    ConflictingLevels,
}

/// Arity of a configuration. Genetic operators never change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Level,
    Paired,
    Combined,
}

/// One optimization level plus a set of independent toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Configuration {
    level: OptLevel,
    toggles: Toggles,
}

impl Configuration {
    pub fn new(level: OptLevel, toggles: Toggles) -> Self {
        Configuration { level, toggles }
    }

    pub fn pure(level: OptLevel) -> Self {
        Configuration::new(level, Toggles::default())
    }

    pub fn paired(level: OptLevel, toggle: Toggle) -> Self {
        Configuration::new(level, Toggles::single(toggle))
    }

    /// Every representable configuration in canonical order: levels major,
    /// toggle subsets minor.
    pub fn all() -> impl Iterator<Item = Configuration> {
        OptLevel::ALL.into_iter().flat_map(|level| {
            Toggles::subsets().map(move |toggles| Configuration::new(level, toggles))
        })
    }

    #[inline]
    pub fn level(&self) -> OptLevel {
        self.level
    }

    #[inline]
    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    pub fn shape(&self) -> Shape {
        match self.toggles.len() {
            0 => Shape::Level,
            1 => Shape::Paired,
            _ => Shape::Combined,
        }
    }

    /// Exactly one level flag followed by the toggle flags in canonical order.
    pub fn compiler_arguments(&self) -> Vec<&'static str> {
        let mut arguments = Vec::with_capacity(1 + self.toggles.len());
        arguments.push(self.level.flag());
        arguments.extend(self.toggles.iter().map(Toggle::flag));
        arguments
    }

    /// The full compiler invocation this configuration stands for, as a user
    /// would type it.
    pub fn command_line(
        &self,
        compiler: &str,
        source: &Path,
        output: &Path,
        extra: &[String],
    ) -> String {
        let mut words = vec![compiler.to_string()];
        words.extend(self.compiler_arguments().into_iter().map(String::from));
        words.push(source.display().to_string());
        words.push("-o".to_string());
        words.push(output.display().to_string());
        words.extend(extra.iter().cloned());
        words.join(" ")
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", code::encode(self))
    }
}

impl FromStr for Configuration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        code::decode(s)
    }
}

impl TryFrom<String> for Configuration {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        code::decode(&value)
    }
}

impl From<Configuration> for String {
    fn from(configuration: Configuration) -> Self {
        code::encode(&configuration)
    }
}
