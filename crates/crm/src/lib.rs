//! Zoho CRM sink
//!
//! Strictly fire-and-forget from the caller's perspective: the server
//! spawns these calls off the request path and only logs failures. Local
//! records never depend on CRM state; the link back is a note marker
//! (`Zoho Lead ID: ...` / `Zoho Event ID: ...`) appended to the local
//! row once a push succeeds.

mod markers;
mod zoho;

pub use markers::{extract_marker, marker_note, EVENT_ID_MARKER, LEAD_ID_MARKER};
pub use zoho::{ZohoClient, ZohoCredentials};

use thiserror::Error;

/// CRM sink errors. Callers log these; they never fail a request.
#[derive(Error, Debug)]
pub enum CrmError {
    #[error("CRM credentials not configured")]
    Unconfigured,

    #[error("CRM network error: {0}")]
    Network(String),

    #[error("CRM API error: {0}")]
    Api(String),

    #[error("CRM returned an unusable response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CrmError {
    fn from(err: reqwest::Error) -> Self {
        CrmError::Network(err.to_string())
    }
}
