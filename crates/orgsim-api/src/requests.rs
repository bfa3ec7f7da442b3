//! Request DTOs of the control protocol.

use orgsim_core::SimulationParameters;
use orgsim_comms::{CommunicationKind, Priority};
use serde::{Deserialize, Serialize};

/// Protocol priority labels; the kernel works on the 1–5 scale.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLabel {
    Low,
    Medium,
    High,
    Critical,
}

impl From<PriorityLabel> for Priority {
    fn from(label: PriorityLabel) -> Self {
        Priority::new(match label {
            PriorityLabel::Low => 2,
            PriorityLabel::Medium => 3,
            PriorityLabel::High => 4,
            PriorityLabel::Critical => 5,
        })
    }
}

/// `POST /simulation/start`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StartRequest {
    pub organization_id: String,
    /// Partial parameter objects are fine; every knob has a default.
    #[serde(default)]
    pub parameters:      SimulationParameters,
}

/// `POST /communications`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommunicationRequest {
    pub sender_id:          String,
    pub recipient_ids:      Vec<String>,
    pub communication_type: CommunicationKind,
    pub content:            String,
    /// Optional explicit subject; defaults to a content excerpt.
    #[serde(default)]
    pub subject:            Option<String>,
    #[serde(default)]
    pub priority:           Option<PriorityLabel>,
    #[serde(default)]
    pub strategic_goal:     Option<String>,
}

impl CommunicationRequest {
    /// The subject line: explicit, or the first line of the content capped
    /// at 60 characters.
    pub fn subject_line(&self) -> String {
        if let Some(subject) = &self.subject {
            return subject.clone();
        }
        let first_line = self.content.lines().next().unwrap_or("");
        let mut subject: String = first_line.chars().take(60).collect();
        if first_line.chars().count() > 60 {
            subject.push('…');
        }
        subject
    }
}
