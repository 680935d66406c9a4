//! Highlight engine registry
//!
//! Maps a language name (the value of the language attribute on a code element) to the
//! engine that tags its blocks. Engines are either a list of [`HighlightRule`]s or an
//! arbitrary procedure over a [`HighlightView`].
//!
//! Rule lists can also be registered from JSON or YAML documents: a sequence of
//! `{pattern, classes}` objects (`styleClasses` is accepted for `classes`). A definition
//! that cannot be turned into an engine still registers one, a no-op, so later lookups of
//! that language always succeed; the error is logged and returned.

use crate::notex::rules::{highlight_with_rules, HighlightRule, RuleDefinition};
use crate::notex::view::HighlightView;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Signature of procedural engines.
pub type Procedure = dyn Fn(&mut HighlightView<'_>) + Send + Sync;

/// Something that tags a code block.
pub enum Engine {
    Rules(Vec<HighlightRule>),
    Procedure(Box<Procedure>),
    /// Stand-in for engines that failed to register
    Noop,
}

impl Engine {
    pub fn procedure<F>(f: F) -> Self
    where
        F: Fn(&mut HighlightView<'_>) + Send + Sync + 'static,
    {
        Engine::Procedure(Box::new(f))
    }

    pub fn run(&self, view: &mut HighlightView<'_>) {
        match self {
            Engine::Rules(rules) => highlight_with_rules(view, rules),
            Engine::Procedure(procedure) => procedure(view),
            Engine::Noop => {}
        }
    }
}

impl From<Vec<HighlightRule>> for Engine {
    fn from(rules: Vec<HighlightRule>) -> Self {
        Engine::Rules(rules)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Rules(rules) => f.debug_tuple("Rules").field(rules).finish(),
            Engine::Procedure(_) => f.write_str("Procedure(..)"),
            Engine::Noop => f.write_str("Noop"),
        }
    }
}

/// Error type for engine registration and lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    UnknownEngine(String),
    /// A definition that is not a sequence of rules
    InvalidEngineType { language: String, found: String },
    InvalidPattern {
        language: String,
        pattern: String,
        reason: String,
    },
    /// A document that could not be read, or a malformed rule
    Definition { language: String, reason: String },
}

impl RegistryError {
    pub fn log(&self) {
        tracing::error!("{}", self);
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::UnknownEngine(language) => {
                write!(f, "Can't find '{}' syntax highlighter", language)
            }
            RegistryError::InvalidEngineType { language, found } => write!(
                f,
                "Expected '{}' syntax highlighter to be a list of rules, found {}",
                language, found
            ),
            RegistryError::InvalidPattern {
                language,
                pattern,
                reason,
            } => write!(
                f,
                "Invalid pattern {:?} in '{}' syntax highlighter: {}",
                pattern, language, reason
            ),
            RegistryError::Definition { language, reason } => write!(
                f,
                "Can't read '{}' syntax highlighter: {}",
                language, reason
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Registry of highlight engines
///
/// # Examples
///
/// ```ignore
/// let mut registry = EngineRegistry::new();
/// registry.add("js", vec![HighlightRule::new(r"\bconst\b", ["kw"])?]);
/// registry.add_yaml("sh", "- pattern: '#.*'\n  classes: [comment]\n")?;
///
/// let engine = registry.try_find("js")?;
/// ```
#[derive(Debug, Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Engine>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        EngineRegistry {
            engines: HashMap::new(),
        }
    }

    /// Register an engine, replacing any engine already registered for `language`.
    pub fn add(&mut self, language: impl Into<String>, engine: impl Into<Engine>) {
        self.engines.insert(language.into(), engine.into());
    }

    /// Register a rule list from an already parsed document.
    pub fn add_definition(&mut self, language: &str, definition: &Value) -> Result<(), RegistryError> {
        match compile_definition(language, definition) {
            Ok(rules) => {
                tracing::debug!(language, rules = rules.len(), "registered highlight rules");
                self.add(language, rules);
                Ok(())
            }
            Err(error) => self.reject(language, error),
        }
    }

    pub fn add_json(&mut self, language: &str, source: &str) -> Result<(), RegistryError> {
        match serde_json::from_str::<Value>(source) {
            Ok(definition) => self.add_definition(language, &definition),
            Err(e) => self.reject(language, definition_error(language, e)),
        }
    }

    pub fn add_yaml(&mut self, language: &str, source: &str) -> Result<(), RegistryError> {
        match serde_yaml::from_str::<Value>(source) {
            Ok(definition) => self.add_definition(language, &definition),
            Err(e) => self.reject(language, definition_error(language, e)),
        }
    }

    pub fn find(&self, language: &str) -> Option<&Engine> {
        self.engines.get(language)
    }

    pub fn try_find(&self, language: &str) -> Result<&Engine, RegistryError> {
        self.find(language)
            .ok_or_else(|| RegistryError::UnknownEngine(language.to_string()))
    }

    pub fn has(&self, language: &str) -> bool {
        self.engines.contains_key(language)
    }

    /// Registered languages (sorted)
    pub fn languages(&self) -> Vec<String> {
        let mut names: Vec<_> = self.engines.keys().cloned().collect();
        names.sort();
        names
    }

    fn reject(&mut self, language: &str, error: RegistryError) -> Result<(), RegistryError> {
        error.log();
        self.add(language, Engine::Noop);
        Err(error)
    }
}

fn compile_definition(language: &str, definition: &Value) -> Result<Vec<HighlightRule>, RegistryError> {
    let Value::Array(items) = definition else {
        return Err(RegistryError::InvalidEngineType {
            language: language.to_string(),
            found: value_kind(definition).to_string(),
        });
    };

    items
        .iter()
        .map(|item| {
            let rule = RuleDefinition::deserialize(item)
                .map_err(|e| definition_error(language, e))?;
            HighlightRule::new(&rule.pattern, rule.classes).map_err(|e| {
                RegistryError::InvalidPattern {
                    language: language.to_string(),
                    pattern: rule.pattern.clone(),
                    reason: e.to_string(),
                }
            })
        })
        .collect()
}

fn definition_error(language: &str, error: impl fmt::Display) -> RegistryError {
    RegistryError::Definition {
        language: language.to_string(),
        reason: error.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
