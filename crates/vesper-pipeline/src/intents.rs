//! Fast-path intent classification.
//!
//! Shallow matching over the post-wake remainder: a handful of inline
//! command phrases are recognized before anything falls through to the
//! conversational handler. No NLU here; first-verb matching is deliberate.

/// A recognized fast-path command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandIntent {
    /// Start or resume music playback, optionally with a query.
    Play(Option<String>),
    Pause,
    Skip,
    /// Speak the given text verbatim.
    Say(String),
    /// Queue a bare test tone.
    TestTone,
    /// Weather report; the location may need slot-filling.
    Weather(Option<String>),
}

impl CommandIntent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Play(_) => "play",
            Self::Pause => "pause",
            Self::Skip => "skip",
            Self::Say(_) => "say",
            Self::TestTone => "test_tone",
            Self::Weather(_) => "weather",
        }
    }
}

/// Matches the utterance against the fast-path set. Returns `None` for
/// anything that should go to the conversational handler.
pub fn parse_fast_path(text: &str) -> Option<CommandIntent> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_lowercase();
    let mut words = lower.split_whitespace();
    let first = words.next()?;
    let rest_lower: Vec<&str> = words.collect();

    // Original casing for payloads ("say Hello There" keeps its shape).
    let rest_original = trimmed
        .split_whitespace()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");

    match first {
        "play" => {
            if rest_lower.is_empty() {
                Some(CommandIntent::Play(None))
            } else {
                Some(CommandIntent::Play(Some(rest_original)))
            }
        }
        "pause" | "stop" => Some(CommandIntent::Pause),
        "skip" | "next" => Some(CommandIntent::Skip),
        "say" => {
            if rest_original.is_empty() {
                None
            } else {
                Some(CommandIntent::Say(rest_original))
            }
        }
        "test" if rest_lower.first() == Some(&"tone") => Some(CommandIntent::TestTone),
        "beep" => Some(CommandIntent::TestTone),
        "weather" => {
            // "weather", "weather in tokyo", "weather for tokyo"
            let location = match rest_lower.split_first() {
                Some((&"in", _)) | Some((&"for", _)) => {
                    let loc = rest_original
                        .split_whitespace()
                        .skip(1)
                        .collect::<Vec<_>>()
                        .join(" ");
                    non_empty(loc)
                }
                Some(_) => Some(rest_original),
                None => None,
            };
            Some(CommandIntent::Weather(location))
        }
        _ => {
            // "whats the weather", "what is the weather like in tokyo"
            if lower.contains("weather") {
                let location = lower
                    .split_once(" in ")
                    .or_else(|| lower.split_once(" for "))
                    .map(|(_, loc)| loc.trim().to_string())
                    .and_then(non_empty);
                return Some(CommandIntent::Weather(location));
            }
            None
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
