//! HTTP surface for the AskDesk knowledge-base assistant.
//!
//! Wires the answering pipeline and quality gate behind `POST /ask`, with
//! the transport-side collaborators: the requester [`AllowList`], the
//! append-only [`AuditLog`], and the CRM [`SupportWebhook`] for escalations.

pub mod access;
pub mod audit;
pub mod server;
pub mod support;

pub use access::AllowList;
pub use audit::{AuditLog, AuditRecord};
pub use server::{AppState, AskRequest, AskResponse, ServerConfig, SupportRequest, app_router,
    run_server};
pub use support::SupportWebhook;
