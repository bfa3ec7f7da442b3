use thiserror::Error;

/// Failures internal to the behavior layer.
///
/// These never escape to kernel callers: the rule-based path cannot fail,
/// and generator failures are recovered by fallback (surfaced only through
/// the response's `fallback_used` flag).
#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("generator backend timed out")]
    GeneratorTimeout,

    #[error("generator backend failed: {0}")]
    GeneratorFailed(String),
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
