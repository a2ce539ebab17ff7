//! Diff engine for recdiff.
//!
//! Compares two versions of a keyed record catalog and reports added keys,
//! removed keys, and per-key field changes.
//!
//! # Key Types
//!
//! - [`FieldPlan`] -- common/added/removed partition of two schemas
//! - [`Digester`] -- fast equality digests for skipping unchanged pairs
//! - [`align`] / [`EditScript`] -- LCS alignment of token sequences
//! - [`DiffGenerator`] -- per-record change generation ([`AccessorGenerator`], [`TokenGenerator`])
//! - [`DiffEngine`] -- parallel orchestration of a whole run
//! - [`DiffConfig`] -- run configuration, loadable from TOML

pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
pub mod generator;
pub mod lcs;
pub mod plan;
pub mod policy;
pub mod sequence;

pub use config::{ArrayStrategy, DiffConfig, ErrorPolicyKind, GeneratorKind, ShapeChangePolicy};
pub use digest::{digest, Digester};
pub use engine::DiffEngine;
pub use error::{DiffError, DiffResult, Side};
pub use generator::{build_generator, AccessorGenerator, DiffGenerator, TokenGenerator};
pub use lcs::{align, EditScript, EditStep};
pub use plan::FieldPlan;
pub use policy::{policy_for, AbortOnError, KeyErrorPolicy, SkipFailures};
