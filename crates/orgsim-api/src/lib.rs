//! `orgsim-api` — the typed control-protocol contract.
//!
//! The wire transport (HTTP server, JSON framing) is the embedding
//! application's job; this crate defines the request/response shapes, the
//! stable error codes, and a stateless adapter that translates protocol
//! calls into kernel calls:
//!
//! | Endpoint                          | Handler                              |
//! |-----------------------------------|--------------------------------------|
//! | `GET  /status`                    | [`ApiAdapter::handle_status`]        |
//! | `GET  /organizations`             | [`ApiAdapter::handle_organizations`] |
//! | `GET  /organizations/{id}`        | [`ApiAdapter::handle_organization`]  |
//! | `GET  /organizations/{id}/employees` | [`ApiAdapter::handle_organization_employees`] |
//! | `POST /simulation/start`          | [`ApiAdapter::handle_start`]         |
//! | `POST /simulation/stop`           | [`ApiAdapter::handle_stop`]          |
//! | `POST /communications`            | [`ApiAdapter::handle_send`]          |
//! | `GET  /wisdom`                    | [`ApiAdapter::handle_wisdom`]        |
//! | `GET  /employees`                 | [`ApiAdapter::handle_employees`]     |

pub mod adapter;
pub mod error;
pub mod requests;
pub mod views;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use adapter::{ApiAdapter, OrganizationSource, StaticOrganizations};
pub use error::{ApiError, ApiResult};
pub use requests::{CommunicationRequest, PriorityLabel, StartRequest};
pub use views::{AgentView, CommunicationView, OrganizationInfo, StartResponse, StopResponse};
