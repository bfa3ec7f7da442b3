//! Strongly typed identifier wrappers.
//!
//! All entity IDs are stable strings (agents arrive with caller-chosen IDs
//! such as `"vp-engineering"`; kernel-minted IDs are sequential, e.g.
//! `"comm-7"`).  Wrapping them in distinct newtypes keeps a `CommId` from
//! ever being passed where a `ThreadId` belongs, at zero runtime cost beyond
//! the `String` itself.
//!
//! Kernel-minted IDs come from [`IdSequence`]: a plain counter, so a seeded
//! run always produces the identical ID sequence.

use std::borrow::Borrow;
use std::fmt;

/// Generate a typed ID wrapper around a `String`.
macro_rules! typed_str_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        // Allows `FxHashMap<$name, _>` lookups keyed by a plain `&str`.
        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

typed_str_id! {
    /// Stable identifier of an agent (employee). Caller-chosen.
    pub struct AgentId;
}

typed_str_id! {
    /// Identifier of a communication. Kernel-minted (`comm-N`).
    pub struct CommId;
}

typed_str_id! {
    /// Identifier of a response. Kernel-minted (`resp-N`).
    pub struct ResponseId;
}

typed_str_id! {
    /// Identifier of a communication thread: an original communication plus
    /// any escalations or follow-ups. Kernel-minted (`thread-N`).
    pub struct ThreadId;
}

// ── IdSequence ────────────────────────────────────────────────────────────────

/// Mints sequential IDs with a fixed prefix: `comm-1`, `comm-2`, …
///
/// Counters start at 1 so that an ID of `…-0` never appears in logs — a zero
/// suffix almost always means an uninitialized value leaked somewhere.
#[derive(Debug)]
pub struct IdSequence {
    prefix: &'static str,
    next:   u64,
}

impl IdSequence {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, next: 1 }
    }

    /// Mint the next ID in the sequence.
    pub fn mint(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }

    /// How many IDs have been minted so far.
    pub fn minted(&self) -> u64 {
        self.next - 1
    }
}
