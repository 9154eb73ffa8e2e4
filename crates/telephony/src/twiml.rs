//! TwiML response builder
//!
//! Only the verbs the call flow uses. Text content is XML-escaped;
//! attribute values are built from our own URLs and numbers.

/// Builds a TwiML `<Response>` document verb by verb
#[derive(Debug, Default)]
pub struct TwimlBuilder {
    body: String,
}

impl TwimlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `text` with the gateway's built-in voice
    pub fn say(mut self, text: &str) -> Self {
        self.body
            .push_str(&format!("<Say voice=\"Polly.Matthew\">{}</Say>", escape(text)));
        self
    }

    /// Play pre-rendered audio from `url`
    pub fn play(mut self, url: &str) -> Self {
        self.body.push_str(&format!("<Play>{}</Play>", escape(url)));
        self
    }

    /// Play synthesized audio when available, else fall back to `<Say>`
    pub fn speak(self, audio_url: Option<&str>, text: &str) -> Self {
        match audio_url {
            Some(url) => self.play(url),
            None => self.say(text),
        }
    }

    pub fn pause(mut self, seconds: u32) -> Self {
        self.body.push_str(&format!("<Pause length=\"{seconds}\"/>"));
        self
    }

    /// Collect speech and post the result to `action`. The prompt plays
    /// inside the gather so the lead can answer over it.
    pub fn gather_speech<F>(mut self, action: &str, timeout_secs: u32, prompt: F) -> Self
    where
        F: FnOnce(TwimlBuilder) -> TwimlBuilder,
    {
        let inner = prompt(TwimlBuilder::new());
        self.body.push_str(&format!(
            "<Gather input=\"speech\" action=\"{}\" method=\"POST\" timeout=\"{timeout_secs}\" speechTimeout=\"auto\">{}</Gather>",
            escape(action),
            inner.body,
        ));
        self
    }

    pub fn redirect(mut self, url: &str) -> Self {
        self.body
            .push_str(&format!("<Redirect method=\"POST\">{}</Redirect>", escape(url)));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.body.push_str("<Hangup/>");
        self
    }

    pub fn build(self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>{}</Response>",
            self.body
        )
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
