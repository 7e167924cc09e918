//! Plain-text transcript of a conversation, for copying out of the app.

use serde::{Deserialize, Serialize};

use crate::message::{Conversation, Sender};

/// Speaker names used in transcripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptLabels {
    pub user: String,
    pub system: String,
}

impl Default for TranscriptLabels {
    fn default() -> Self {
        Self {
            user: "You".into(),
            system: "N.I.D.A.M".into(),
        }
    }
}

impl TranscriptLabels {
    fn label(&self, sender: Sender) -> &str {
        match sender {
            Sender::User => &self.user,
            Sender::System => &self.system,
        }
    }
}

/// `"<speaker>: <text>"` per message, separated by a blank line.
pub fn render_transcript(conversation: &Conversation, labels: &TranscriptLabels) -> String {
    conversation
        .messages()
        .iter()
        .map(|m| format!("{}: {}", labels.label(m.sender), m.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
