//! Conversation stages and the oracle prompt
//!
//! Stage is recomputed from history length every turn rather than stored;
//! one completed exchange is a (bot, lead) pair, so the pair count drives
//! the script position. Odd-length or empty histories count their full
//! pairs only, which safely lands a fresh call in the introduction.
//!
//! The system prompt instructs the oracle to use the exact closing
//! phrasings the classifier matches on. Prompt wording and the phrase
//! constants in `classify` must be updated together.

use leadcall_core::Turn;

/// Script position within the sales call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Introduction,
    Qualification,
    ValueProposition,
    AppointmentSetting,
    ObjectionHandling,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Introduction => "introduction",
            Self::Qualification => "qualification",
            Self::ValueProposition => "value_proposition",
            Self::AppointmentSetting => "appointment_setting",
            Self::ObjectionHandling => "objection_handling",
        }
    }

    /// Stage-specific instruction appended to the persona prompt
    fn guidance(&self) -> &'static str {
        match self {
            Self::Introduction => {
                "Open the call: confirm who you are speaking with, introduce yourself in one sentence, and ask whether their field crews use mobile phones or tablets for work."
            }
            Self::Qualification => {
                "Qualify the business: ask how many employees work in the field and how they handle job information today."
            }
            Self::ValueProposition => {
                "Present the value briefly: one or two sentences on cutting downtime and paperwork for field crews. No feature lists."
            }
            Self::AppointmentSetting => {
                "Ask directly for a short 15 minute appointment this week, offering a specific day and time."
            }
            Self::ObjectionHandling => {
                "Handle the objection: acknowledge it in one sentence, then redirect to the value and ask again for a brief appointment."
            }
        }
    }

    /// Fixed degraded-mode reply used when the oracle is unavailable in
    /// test mode. Keeps the call coherent without any generation.
    pub fn canned_reply(&self) -> &'static str {
        match self {
            Self::Introduction => {
                "Hello, this is Ava with Mobile Solutions. I'll be brief. Do your field crews use mobile phones or tablets for work?"
            }
            Self::Qualification => {
                "That's helpful to know. Roughly how many employees do you have out in the field?"
            }
            Self::ValueProposition => {
                "We help businesses like yours cut device downtime and paperwork with managed mobile tools for field crews."
            }
            Self::AppointmentSetting => {
                "Could we set up a quick 15 minute call this week to walk through it? Would Tuesday morning work?"
            }
            Self::ObjectionHandling => {
                "I completely understand. Many of our customers said the same before they saw the time savings. Would a brief call next week work better?"
            }
        }
    }
}

/// Stage as a pure function of completed (bot, lead) pair count
pub fn stage_for(history: &[Turn]) -> Stage {
    match history.len() / 2 {
        0 => Stage::Introduction,
        1 => Stage::Qualification,
        2 => Stage::ValueProposition,
        3 => Stage::AppointmentSetting,
        _ => Stage::ObjectionHandling,
    }
}

/// Persona and method instructions for the oracle, parameterized by stage
/// and the lead's industry context.
pub fn system_prompt(stage: Stage, industry: Option<&str>) -> String {
    let industry_line = match industry {
        Some(industry) => format!("The lead runs a {industry} business."),
        None => "The lead's industry is unknown.".to_string(),
    };

    format!(
        "You are Ava with Mobile Solutions, making a brief outbound sales call \
to a small business. {industry_line} Your method: qualify the business, present \
a short value statement, ask for a brief 15 minute appointment, and handle \
objections by acknowledging then redirecting. Keep every reply to one or two \
spoken sentences.\n\
Current stage: {stage}. {guidance}\n\
When you conclude the call you must use these exact phrasings: if an \
appointment is agreed, say you have them 'confirmed' for an 'appointment' on \
<day> at <time>, ending the time with a period; if the business is not a \
match, say it is 'not a good fit'; to end without booking, say 'Thank you for \
your time' and 'Goodbye'.",
        stage = stage.as_str(),
        guidance = stage.guidance(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(n: usize) -> Vec<Turn> {
        let mut history = Vec::new();
        for i in 0..n {
            history.push(Turn::assistant(format!("bot {i}")));
            history.push(Turn::user(format!("lead {i}")));
        }
        history
    }

    #[test]
    fn stage_follows_the_pair_count_table() {
        assert_eq!(stage_for(&pairs(0)), Stage::Introduction);
        assert_eq!(stage_for(&pairs(1)), Stage::Qualification);
        assert_eq!(stage_for(&pairs(2)), Stage::ValueProposition);
        assert_eq!(stage_for(&pairs(3)), Stage::AppointmentSetting);
        assert_eq!(stage_for(&pairs(4)), Stage::ObjectionHandling);
        assert_eq!(stage_for(&pairs(9)), Stage::ObjectionHandling);
    }

    #[test]
    fn odd_length_history_counts_full_pairs_only() {
        let mut history = pairs(1);
        history.push(Turn::assistant("dangling"));
        assert_eq!(stage_for(&history), Stage::Qualification);
    }

    #[test]
    fn stage_ignores_content() {
        let mut a = pairs(2);
        let mut b = pairs(2);
        a[0].content = "completely".into();
        b[0].content = "different".into();
        assert_eq!(stage_for(&a), stage_for(&b));
    }

    #[test]
    fn prompt_names_the_stage_and_industry() {
        let prompt = system_prompt(Stage::Qualification, Some("plumbing"));
        assert!(prompt.contains("qualification"));
        assert!(prompt.contains("plumbing"));

        let prompt = system_prompt(Stage::Introduction, None);
        assert!(prompt.contains("industry is unknown"));
    }

    #[test]
    fn prompt_carries_the_closing_phrasing_contract() {
        let prompt = system_prompt(Stage::AppointmentSetting, None);
        assert!(prompt.contains("not a good fit"));
        assert!(prompt.contains("Thank you for your time"));
        assert!(prompt.contains("confirmed"));
    }
}
