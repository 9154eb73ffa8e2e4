//! Conversation engine
//!
//! One `advance` call per inbound utterance. The engine is pure except
//! for the single oracle call; persistence of the returned history and
//! result belongs to the orchestrator.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use leadcall_core::{
    ConversationResult, Error, GenerateRequest, LanguageModel, Lead, Result, Turn,
};

use crate::classify::classify;
use crate::extract;
use crate::followup::{recommend, Recommendation};
use crate::stage::{stage_for, system_prompt};

/// Everything one conversation turn produces
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The next utterance to speak
    pub utterance: String,
    /// History including the new user and assistant turns
    pub history: Vec<Turn>,
    pub result: ConversationResult,
    /// Present only when the conversation concluded without booking
    pub follow_up: Option<Recommendation>,
}

/// Drives the scripted sales dialogue against the text-generation oracle
pub struct ConversationEngine {
    oracle: Arc<dyn LanguageModel>,
    /// Degrade oracle failures to canned per-stage replies
    test_mode: bool,
}

impl ConversationEngine {
    pub fn new(oracle: Arc<dyn LanguageModel>, test_mode: bool) -> Self {
        Self { oracle, test_mode }
    }

    /// Process one spoken utterance from the lead.
    ///
    /// Oracle failures propagate unless test mode is active, in which
    /// case the stage's canned reply keeps the call coherent.
    pub async fn advance(
        &self,
        speech_text: &str,
        lead: &Lead,
        history: Vec<Turn>,
        now: DateTime<Utc>,
    ) -> Result<TurnOutcome> {
        let stage = stage_for(&history);
        let system = system_prompt(stage, lead.industry_context());

        let mut turns = history;
        let user_turn = Turn::user(speech_text);

        let mut request_turns = turns.clone();
        request_turns.push(user_turn.clone());

        let utterance = match self
            .oracle
            .generate(GenerateRequest { system, turns: request_turns })
            .await
        {
            Ok(text) => text,
            Err(err) if self.test_mode => {
                tracing::warn!(
                    lead_id = lead.id,
                    stage = stage.as_str(),
                    error = %err,
                    "oracle failed, using canned reply"
                );
                stage.canned_reply().to_string()
            }
            Err(err) => {
                return Err(Error::Conversation(format!(
                    "oracle failed at stage {}: {err}",
                    stage.as_str()
                )))
            }
        };

        turns.push(user_turn);
        turns.push(Turn::assistant(utterance.clone()));

        let mut result = classify(&utterance);
        // Qualification signals come from the lead's own words.
        result.uses_mobile = extract::mobile_usage(speech_text);
        result.employee_count = extract::employee_count(speech_text);

        let follow_up = if result.is_complete() {
            recommend(&result, lead, &turns, now)
        } else {
            None
        };

        Ok(TurnOutcome {
            utterance,
            history: turns,
            result,
            follow_up,
        })
    }
}
