use serde::Serialize;

/// A voice persona users can pick for their activity titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoiceOption {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

pub const VOICE_OPTIONS: &[VoiceOption] = &[
    VoiceOption {
        id: "data-driven",
        label: "Data-driven",
        description: "Focuses on metrics, performance data, and workout statistics",
    },
    VoiceOption {
        id: "funny-witty",
        label: "Funny and Witty",
        description: "Adds humor and clever wordplay to your activity titles",
    },
    VoiceOption {
        id: "christopher-walken",
        label: "Christopher Walken",
        description: "Titles with distinctive pauses and unexpected emphasis",
    },
];
