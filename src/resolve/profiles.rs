//! Extraction profile configuration.
//!
//! A profile names the regex patterns (and the strategy for applying them)
//! used to pull a document code out of extracted text. Profiles are data: a
//! JSON document maps profile id to patterns, and a built-in set covers the
//! report layouts the pipeline was written for.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a profile's patterns are applied to the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// First pattern that matches anywhere wins; capture group 1 is used
    /// when the pattern has one.
    #[default]
    FirstMatch,
    /// All matches of all patterns compete; the longest candidate wins and
    /// short category tokens are discarded.
    LongestMatch,
}

/// One profile as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub patterns: Vec<String>,
    #[serde(default)]
    pub strategy: MatchStrategy,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfilesFile {
    profiles: HashMap<String, ProfileConfig>,
}

/// A profile with its patterns compiled (case-insensitive, multi-line).
#[derive(Debug)]
pub struct Profile {
    pub strategy: MatchStrategy,
    pub patterns: Vec<Regex>,
}

#[derive(Debug)]
pub struct ExtractionProfiles {
    profiles: HashMap<String, Profile>,
}

impl ExtractionProfiles {
    /// The profile set shipped with the tool.
    pub fn builtin() -> Self {
        Self::from_configs(builtin_configs()).expect("builtin profiles compile")
    }

    /// Reads a profile configuration file (JSON, `{"profiles": {...}}`).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let parsed: ProfilesFile = serde_json::from_str(&raw).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            detail: format!("invalid profile configuration: {e}"),
        })?;
        Self::from_configs(parsed.profiles).map_err(|detail| Error::FileRead {
            path: path.to_path_buf(),
            detail,
        })
    }

    /// The per-user configuration file, when the platform has a config dir.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("doclot").join("profiles.json"))
    }

    /// Loads the per-user configuration if present, falling back to the
    /// built-in set (also on a broken user file, with a warning).
    pub fn load_default_or_builtin() -> Self {
        match Self::default_config_path().filter(|path| path.is_file()) {
            Some(path) => match Self::load(&path) {
                Ok(profiles) => {
                    tracing::info!(path = %path.display(), "loaded extraction profiles");
                    profiles
                }
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring broken profile configuration");
                    Self::builtin()
                }
            },
            None => Self::builtin(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub(crate) fn from_configs(
        configs: HashMap<String, ProfileConfig>,
    ) -> std::result::Result<Self, String> {
        let mut profiles = HashMap::with_capacity(configs.len());
        for (id, config) in configs {
            let mut patterns = Vec::with_capacity(config.patterns.len());
            for pattern in &config.patterns {
                let compiled = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
                    .map_err(|e| format!("profile '{id}', pattern '{pattern}': {e}"))?;
                patterns.push(compiled);
            }
            profiles.insert(
                id,
                Profile {
                    strategy: config.strategy,
                    patterns,
                },
            );
        }
        Ok(Self { profiles })
    }
}

fn builtin_configs() -> HashMap<String, ProfileConfig> {
    HashMap::from([
        (
            "RIR".to_string(),
            ProfileConfig {
                patterns: vec![
                    // labeled code, at least 4 chars so the bare category
                    // token never qualifies
                    r"Relatório:\s*([A-Z0-9_\.\-]{4,}(?:_[A-Z0-9_\.\-]+)*)".to_string(),
                    // structural fallback for unlabeled occurrences
                    r"([A-Z0-9]+_[A-Z0-9]+_[A-Z0-9]+_[\d\.]+_[A-Z]+_RIR_[A-Z0-9\-]+)".to_string(),
                ],
                strategy: MatchStrategy::LongestMatch,
            },
        ),
        (
            "GENERIC".to_string(),
            ProfileConfig {
                patterns: vec![
                    r"Código:\s*([A-Z0-9_\.\-]+)".to_string(),
                    r"Relatório:\s*([A-Z0-9_\.\-]+)".to_string(),
                ],
                strategy: MatchStrategy::FirstMatch,
            },
        ),
    ])
}
