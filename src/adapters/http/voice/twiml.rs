//! Minimal TwiML rendering for the verbs the assistant uses.

use super::VoiceSettings;

#[derive(Debug, Clone, PartialEq)]
enum Verb {
    Say(String),
    /// Speech gather posting to the transcription webhook, with an optional
    /// prompt spoken while listening.
    Gather(Option<String>),
    Hangup,
}

/// A TwiML `<Response>` under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say(text.into()));
        self
    }

    pub fn gather(mut self, prompt: Option<String>) -> Self {
        self.verbs.push(Verb::Gather(prompt));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn render(&self, settings: &VoiceSettings) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
        for verb in &self.verbs {
            match verb {
                Verb::Say(text) => push_say(&mut xml, settings, text),
                Verb::Gather(prompt) => {
                    xml.push_str(&format!(
                        r#"<Gather input="speech" action="{}" method="POST" language="{}" speechTimeout="{}">"#,
                        escape_attr(&settings.transcription_url()),
                        escape_attr(&settings.language),
                        escape_attr(&settings.speech_timeout),
                    ));
                    if let Some(prompt) = prompt {
                        push_say(&mut xml, settings, prompt);
                    }
                    xml.push_str("</Gather>");
                }
                Verb::Hangup => xml.push_str("<Hangup/>"),
            }
        }
        xml.push_str("</Response>");
        xml
    }
}

fn push_say(xml: &mut String, settings: &VoiceSettings, text: &str) {
    xml.push_str(&format!(
        r#"<Say voice="{}" language="{}">{}</Say>"#,
        escape_attr(&settings.voice),
        escape_attr(&settings.language),
        escape_text(text),
    ));
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_say_gather_and_hangup_in_order() {
        let xml = VoiceResponse::new()
            .say("Hello")
            .gather(Some("Go ahead.".into()))
            .hangup()
            .render(&VoiceSettings::default());

        let say = xml.find("<Say").unwrap();
        let gather = xml.find("<Gather").unwrap();
        let hangup = xml.find("<Hangup/>").unwrap();
        assert!(say < gather && gather < hangup);
        assert!(xml.contains(r#"action="/voice/transcription""#));
        assert!(xml.contains(r#"input="speech""#));
        assert!(xml.contains("Go ahead.</Say></Gather>"));
        assert!(xml.ends_with("</Response>"));
    }

    #[test]
    fn text_is_escaped() {
        let xml = VoiceResponse::new()
            .say("Tom & Jerry <3")
            .render(&VoiceSettings::default());
        assert!(xml.contains("Tom &amp; Jerry &lt;3"));
    }

    #[test]
    fn gather_action_uses_public_base_url() {
        let settings = VoiceSettings {
            public_base_url: Some("https://voice.example.com/".into()),
            ..VoiceSettings::default()
        };
        let xml = VoiceResponse::new().gather(None).render(&settings);
        assert!(xml.contains(r#"action="https://voice.example.com/voice/transcription""#));
        assert!(xml.contains("></Gather>"));
    }
}
