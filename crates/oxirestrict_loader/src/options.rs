use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use oxirestrict_core::{
    AsyncDecider, climbing_above, inside_directories, matching_package, outside_directories,
};

/// Intro line used when a rule carries no `info` of its own.
pub const DEFAULT_INFO: &str = "Found restricted imports:";

/// What happens when a rule matches. Serialized lowercase; anything else is
/// rejected while the options are read, long before a scan runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Abort the whole scan of the file; later rules are not reported.
    Fatal,
    /// Register a blocking diagnostic and keep going.
    Error,
    /// Register an advisory diagnostic and keep going.
    Warning,
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("`rules` must contain at least one rule")]
    EmptyRules,
    #[error("invalid `restricted` pattern {pattern:?}: {source}")]
    InvalidPattern { pattern: String, source: regex::Error },
}

/// On-disk shape of the options, e.g. a JSON rule file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OptionsConfig {
    pub severity: Severity,
    /// Include the faulty import statement when printing a report (default:
    /// true). If disabled, only the import path and line are included.
    #[serde(default)]
    pub detailed_error_messages: Option<bool>,
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub restricted: RestrictedSpec,
    /// Severity for this specific rule, overriding the file-level one.
    #[serde(default)]
    pub severity: Option<Severity>,
    /// Intro line to show above this rule's matches.
    #[serde(default)]
    pub info: Option<String>,
}

/// Configurable forms of "which imports are restricted", mapping onto the
/// decider constructors.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestrictedSpec {
    /// Regular expression tested against the import path verbatim.
    Pattern(String),
    /// A package name and all of its submodule paths.
    Package(String),
    /// Paths climbing upwards more than the given number of levels.
    ClimbingAbove(usize),
    InsideDirectories(Vec<PathBuf>),
    OutsideDirectories(Vec<PathBuf>),
}

impl RestrictedSpec {
    fn into_decider(self) -> Result<AsyncDecider, OptionsError> {
        Ok(match self {
            RestrictedSpec::Pattern(pattern) => {
                let re = Regex::new(&pattern)
                    .map_err(|source| OptionsError::InvalidPattern { pattern, source })?;
                AsyncDecider::from(re)
            }
            RestrictedSpec::Package(name) => AsyncDecider::from(matching_package(&name)),
            RestrictedSpec::ClimbingAbove(levels) => AsyncDecider::from(climbing_above(levels)),
            RestrictedSpec::InsideDirectories(dirs) => inside_directories(dirs),
            RestrictedSpec::OutsideDirectories(dirs) => outside_directories(dirs),
        })
    }
}

/// One rule: a decider plus optional severity and intro overrides.
pub struct Rule {
    pub restricted: AsyncDecider,
    pub severity: Option<Severity>,
    pub info: Option<String>,
}

impl Rule {
    pub fn new(restricted: impl Into<AsyncDecider>) -> Self {
        Self { restricted: restricted.into(), severity: None, info: None }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    fn from_config(config: RuleConfig) -> Result<Self, OptionsError> {
        Ok(Self {
            restricted: config.restricted.into_decider()?,
            severity: config.severity,
            info: config.info,
        })
    }
}

/// Validated options, ready to run. Construction is the validation point:
/// a scan never starts with a malformed rule set.
pub struct LoaderOptions {
    pub severity: Severity,
    pub detailed_error_messages: bool,
    pub rules: Vec<Rule>,
}

impl LoaderOptions {
    pub fn new(severity: Severity, rules: Vec<Rule>) -> Result<Self, OptionsError> {
        if rules.is_empty() {
            return Err(OptionsError::EmptyRules);
        }
        Ok(Self { severity, detailed_error_messages: true, rules })
    }

    pub fn with_details(mut self, detailed: bool) -> Self {
        self.detailed_error_messages = detailed;
        self
    }

    pub fn from_config(config: OptionsConfig) -> Result<Self, OptionsError> {
        if config.rules.is_empty() {
            return Err(OptionsError::EmptyRules);
        }
        let rules = config
            .rules
            .into_iter()
            .map(Rule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            severity: config.severity,
            detailed_error_messages: config.detailed_error_messages.unwrap_or(true),
            rules,
        })
    }
}
