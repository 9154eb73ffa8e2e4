//! Typed payloads for the webhook forms Twilio posts back.
//!
//! Field names mirror Twilio's PascalCase form keys. Everything beyond
//! the call SID is optional; Twilio varies the posted fields by event.

use serde::Deserialize;

/// Initial `POST /webhook/voice` when the call connects
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "To", default)]
    pub to: Option<String>,
    #[serde(rename = "CallStatus", default)]
    pub call_status: Option<String>,
    /// Present when synchronous machine detection ran
    #[serde(rename = "AnsweredBy", default)]
    pub answered_by: Option<String>,
}

/// `POST /webhook/response` after a `<Gather>` collects speech
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "SpeechResult", default)]
    pub speech_result: Option<String>,
    #[serde(rename = "Confidence", default)]
    pub confidence: Option<f64>,
}

impl ResponseWebhook {
    /// Recognized speech, or `None` when the gather timed out silent
    pub fn utterance(&self) -> Option<&str> {
        self.speech_result
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// `POST /webhook/status` on call lifecycle changes
#[derive(Debug, Clone, Deserialize)]
pub struct StatusWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "CallStatus")]
    pub call_status: String,
    #[serde(rename = "CallDuration", default)]
    pub call_duration: Option<String>,
}

impl StatusWebhook {
    /// Terminal statuses after which no more webhooks arrive
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.call_status.as_str(),
            "completed" | "failed" | "busy" | "no-answer" | "canceled"
        )
    }
}

/// Async answering-machine detection result
#[derive(Debug, Clone, Deserialize)]
pub struct AmdWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "AnsweredBy")]
    pub answered_by: String,
}

impl AmdWebhook {
    /// True for any machine_* or fax verdict
    pub fn is_machine(&self) -> bool {
        self.answered_by.starts_with("machine") || self.answered_by == "fax"
    }
}

/// Recording availability notification
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "RecordingUrl")]
    pub recording_url: String,
    #[serde(rename = "RecordingDuration", default)]
    pub recording_duration: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_form_parses_with_and_without_speech() {
        let with: ResponseWebhook =
            serde_urlencoded::from_str("CallSid=CA1&SpeechResult=Sounds%20good&Confidence=0.92")
                .unwrap();
        assert_eq!(with.utterance(), Some("Sounds good"));
        assert!(with.confidence.unwrap() > 0.9);

        let silent: ResponseWebhook = serde_urlencoded::from_str("CallSid=CA1").unwrap();
        assert_eq!(silent.utterance(), None);

        let blank: ResponseWebhook =
            serde_urlencoded::from_str("CallSid=CA1&SpeechResult=%20%20").unwrap();
        assert_eq!(blank.utterance(), None);
    }

    #[test]
    fn status_terminal_detection() {
        let status: StatusWebhook =
            serde_urlencoded::from_str("CallSid=CA1&CallStatus=no-answer").unwrap();
        assert!(status.is_terminal());

        let ringing: StatusWebhook =
            serde_urlencoded::from_str("CallSid=CA1&CallStatus=ringing").unwrap();
        assert!(!ringing.is_terminal());
    }

    #[test]
    fn amd_machine_verdicts() {
        for verdict in ["machine_start", "machine_end_beep", "fax"] {
            let hook = AmdWebhook {
                call_sid: "CA1".into(),
                answered_by: verdict.into(),
            };
            assert!(hook.is_machine(), "{verdict}");
        }
        let human = AmdWebhook {
            call_sid: "CA1".into(),
            answered_by: "human".into(),
        };
        assert!(!human.is_machine());
    }
}
