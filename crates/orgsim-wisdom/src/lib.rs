//! `orgsim-wisdom` — wisdom-of-the-crowd aggregation.
//!
//! Consumes the stream of responses to a communication (or to every
//! communication sharing a strategic-goal tag) and maintains a streaming
//! aggregate: consensus level (entropy-based), confidence distribution,
//! hesitation counts, detected priority conflicts, and a recommended-action
//! rule table.  Updates are incremental per response; snapshots are
//! query-only.
//!
//! | Module        | Contents                                             |
//! |---------------|------------------------------------------------------|
//! | [`aggregate`] | `Aggregate`, `WisdomOfTheCrowd`, conflicts, actions  |
//! | [`engine`]    | `WisdomEngine`, `TopicKey`                           |

pub mod aggregate;
pub mod engine;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use aggregate::{
    Aggregate, ConfidenceDistribution, ConflictKind, PriorityConflict, RecommendedAction,
    WisdomOfTheCrowd,
};
pub use engine::{TopicKey, WisdomEngine};
