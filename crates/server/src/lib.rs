//! Orchestrator server
//!
//! Ties the whole pipeline together: the REST API for the dashboard, the
//! Twilio webhook flow that drives conversations, the fire-and-forget
//! CRM pushes and the periodic follow-up sweep.

pub mod calls;
pub mod http;
pub mod state;
pub mod sweep;
pub mod sync;
pub mod webhooks;

#[cfg(test)]
mod testutil;

pub use http::create_router;
pub use state::AppState;
