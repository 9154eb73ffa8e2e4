//! Conversation core: admission gate, dialogue engine, follow-up recommender
//!
//! Everything in this crate is deterministic given its inputs; the single
//! oracle call inside [`ConversationEngine::advance`] is the only I/O.
//! The orchestrator owns all persistence and telephony side effects.

pub mod admission;
mod classify;
mod engine;
mod extract;
mod followup;
mod stage;

pub use admission::{has_call_in_progress, is_within_call_hours, should_allow_call};
pub use classify::classify;
pub use engine::{ConversationEngine, TurnOutcome};
pub use extract::{appointment_date_time, employee_count, mobile_usage};
pub use followup::{recommend, Recommendation};
pub use stage::{stage_for, system_prompt, Stage};
