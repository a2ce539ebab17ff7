//! Per-key error policies.
//!
//! When one key's diff fails the engine hands the error to a
//! [`KeyErrorPolicy`], which either aborts the run or turns the error into a
//! [`KeyFailure`] recorded in the report. Failures are presented in ascending
//! key order, so an aborting policy always reports the lowest failing key.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use recdiff_types::{KeyFailure, RecordKey};

use crate::config::ErrorPolicyKind;
use crate::error::{DiffError, DiffResult};

/// Decides the fate of a run when a key fails.
pub trait KeyErrorPolicy: Send + Sync + fmt::Debug {
    /// Return `Err` to abort the run, or the failure to record.
    fn handle(&self, key: RecordKey, error: DiffError) -> DiffResult<KeyFailure>;
}

/// Any failing key aborts the run.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbortOnError;

impl KeyErrorPolicy for AbortOnError {
    fn handle(&self, key: RecordKey, error: DiffError) -> DiffResult<KeyFailure> {
        Err(DiffError::key_failed(key, error))
    }
}

/// Failing keys are logged and recorded; the run continues.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkipFailures;

impl KeyErrorPolicy for SkipFailures {
    fn handle(&self, key: RecordKey, error: DiffError) -> DiffResult<KeyFailure> {
        warn!(key, error = %error, "skipping key whose diff failed");
        Ok(KeyFailure {
            key,
            reason: error.to_string(),
        })
    }
}

/// The built-in policy for `kind`.
pub fn policy_for(kind: ErrorPolicyKind) -> Arc<dyn KeyErrorPolicy> {
    match kind {
        ErrorPolicyKind::Abort => Arc::new(AbortOnError),
        ErrorPolicyKind::Skip => Arc::new(SkipFailures),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Side;

    #[test]
    fn abort_wraps_the_key() {
        let err = AbortOnError
            .handle(7, DiffError::NullRecord(Side::Current))
            .unwrap_err();
        match err {
            DiffError::KeyFailed { key, source } => {
                assert_eq!(key, 7);
                assert!(matches!(*source, DiffError::NullRecord(Side::Current)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn skip_records_the_reason() {
        let failure = SkipFailures
            .handle(3, DiffError::SchemaMismatch("x".into()))
            .unwrap();
        assert_eq!(failure.key, 3);
        assert_eq!(failure.reason, "schema mismatch: x");
    }

    #[test]
    fn policy_for_kind() {
        let policy = policy_for(ErrorPolicyKind::Skip);
        assert!(policy.handle(1, DiffError::Config("bad".into())).is_ok());
        let policy = policy_for(ErrorPolicyKind::Abort);
        assert!(policy.handle(1, DiffError::Config("bad".into())).is_err());
    }
}
