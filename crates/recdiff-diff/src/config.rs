use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};

/// How two sequences of the same field are compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayStrategy {
    /// Position-by-position comparison plus trailing adds/removes.
    #[default]
    Ordinal,
    /// Longest-common-subsequence alignment.
    Lcs,
}

/// Which record access strategy generates change entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Field values read through the record descriptor's accessors.
    #[default]
    Accessor,
    /// Records serialized to JSON token trees and compared token-wise.
    Token,
}

/// What to do when a field switches between scalar and sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeChangePolicy {
    /// Emit the old shape as removed and the new shape as added.
    #[default]
    Decompose,
    /// Fail the key with an unsupported-shape-change error.
    Reject,
}

/// How the engine treats a key whose diff fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicyKind {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Record the failure in the report and continue.
    Skip,
}

/// Configuration for a diff run.
///
/// Every setting is fixed for the whole run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Sequence comparison strategy.
    pub array_strategy: ArrayStrategy,
    /// Skip full diffing of record pairs whose digests match. Only applies
    /// when both catalogs have identical schemas.
    pub digest_shortcut: bool,
    /// Record access strategy.
    pub generator: GeneratorKind,
    /// Handling of scalar/sequence shape changes.
    pub shape_change: ShapeChangePolicy,
    /// Handling of per-key failures.
    pub error_policy: ErrorPolicyKind,
    /// Worker threads; `0` uses one per available core.
    pub threads: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            array_strategy: ArrayStrategy::Ordinal,
            digest_shortcut: true,
            generator: GeneratorKind::Accessor,
            shape_change: ShapeChangePolicy::Decompose,
            error_policy: ErrorPolicyKind::Abort,
            threads: 0,
        }
    }
}

impl DiffConfig {
    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> DiffResult<Self> {
        toml::from_str(text).map_err(|e| DiffError::Config(e.to_string()))
    }

    /// Read a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> DiffResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| DiffError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
