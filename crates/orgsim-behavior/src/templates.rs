//! Response content templates.
//!
//! Default-mode responses are template text, not generated language: the
//! kernel performs no natural-language understanding.  One table per
//! response kind; the agent's RNG stream picks the phrasing so transcripts
//! vary without losing determinism.

use orgsim_core::AgentRng;
use orgsim_comms::{Communication, ResponseKind};

const IGNORE: &[&str] = &[
    "(no reply)",
    "(left unread)",
    "(acknowledged silently, no action)",
];

const TAKE_ACTION: &[&str] = &[
    "On it — I'll fold \"{subject}\" into this week's plan.",
    "Understood. Starting on \"{subject}\" today.",
    "Will do. I've scheduled work on \"{subject}\".",
    "Picking this up now; expect progress on \"{subject}\" shortly.",
];

const SEEK_CLARIFICATION: &[&str] = &[
    "Before I commit on \"{subject}\": what does success look like, concretely?",
    "Can you clarify the scope of \"{subject}\" relative to current priorities?",
    "Who else is involved in \"{subject}\"? I want to avoid duplicating effort.",
];

const PROVIDE_FEEDBACK: &[&str] = &[
    "Some context from my side on \"{subject}\": the constraint is capacity, not intent.",
    "Feedback on \"{subject}\": the timeline looks optimistic from where I sit.",
    "On \"{subject}\": supportive of the direction, but we should sequence it after current commitments.",
];

const ESCALATE: &[&str] = &[
    "Raising \"{subject}\" with my manager — this conflicts with standing priorities.",
    "I need a decision above my level before acting on \"{subject}\".",
];

const DELEGATE: &[&str] = &[
    "Handing \"{subject}\" to my team with context; I'll track completion.",
    "Delegating \"{subject}\" — it sits squarely in my reports' area.",
];

/// Fill a template for `kind`, drawing the phrasing from `rng`.
pub fn content_for(kind: ResponseKind, comm: &Communication, rng: &mut AgentRng) -> String {
    let table = match kind {
        ResponseKind::Ignore => IGNORE,
        ResponseKind::TakeAction => TAKE_ACTION,
        ResponseKind::SeekClarification => SEEK_CLARIFICATION,
        ResponseKind::ProvideFeedback => PROVIDE_FEEDBACK,
        ResponseKind::Escalate => ESCALATE,
        ResponseKind::Delegate => DELEGATE,
    };
    let template = rng.choose(table).copied().unwrap_or("");
    template.replace("{subject}", &comm.subject)
}
