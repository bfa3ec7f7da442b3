//! `orgsim-comms` — communication, response, and delivery types.
//!
//! The data model of the message layer, shared by every engine-side crate.
//! All unions are explicit sum types with exhaustive handling downstream;
//! none of these types holds references to live agents — everything is
//! ID-keyed.
//!
//! | Module            | Contents                                            |
//! |-------------------|-----------------------------------------------------|
//! | [`communication`] | `Communication`, `CommunicationKind`, `Priority`    |
//! | [`response`]      | `Response`, `ResponseKind`, `HesitationMarker`, `ActionStatus` |
//! | [`delivery`]      | `DeliveryRecord`, `DeliveryStatus`                  |

pub mod communication;
pub mod delivery;
pub mod response;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use communication::{Communication, CommunicationKind, Priority};
pub use delivery::{DeliveryRecord, DeliveryStatus};
pub use response::{ActionStatus, HesitationMarker, Response, ResponseKind};
