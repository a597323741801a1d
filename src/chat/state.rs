use crate::api::SendOutcome;
use crate::models::{Message, Role};
use uuid::Uuid;

pub const GREETING: &str = "Hi. I'm here with you. What worries you most right now?";
pub const CONNECTING_STATUS: &str = "Opening the conversation…";
pub const THINKING_STATUS: &str = "Thinking…";
pub const BUSY_STATUS: &str = "Still waiting for the previous reply.";
pub const NO_SESSION_STATUS: &str = "Choose an assistant first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    Connecting,
    Ready,
    Sending,
}

/// Lifecycle of an optimistically rendered user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub delivery: Delivery,
}

impl ChatEntry {
    fn confirmed(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            delivery: Delivery::Confirmed,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ChatAction {
    Open {
        assistant_slug: String,
        title: String,
    },
    SessionReady {
        session_id: String,
    },
    SessionFailed {
        reason: String,
    },
    HistoryLoaded {
        messages: Vec<Message>,
    },
    HistoryFailed {
        reason: String,
    },
    SendStarted {
        id: Uuid,
        text: String,
    },
    SendConfirmed {
        id: Uuid,
        outcome: SendOutcome,
    },
    SendFailed {
        id: Uuid,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    pub phase: ChatPhase,
    pub assistant_slug: Option<String>,
    pub title: Option<String>,
    pub session_id: Option<String>,
    pub entries: Vec<ChatEntry>,
    pub status: Option<String>,
}

impl Default for ChatView {
    fn default() -> Self {
        Self {
            phase: ChatPhase::Idle,
            assistant_slug: None,
            title: None,
            session_id: None,
            entries: Vec::new(),
            status: None,
        }
    }
}

impl ChatView {
    pub fn is_open(&self) -> bool {
        self.session_id.is_some() && matches!(self.phase, ChatPhase::Ready | ChatPhase::Sending)
    }

    pub fn pending(&self) -> Option<&ChatEntry> {
        self.entries
            .iter()
            .find(|e| e.delivery == Delivery::Pending)
    }

    /// Pure state transition. Actions that do not fit the current phase leave
    /// the entries alone.
    pub fn apply(mut self, action: ChatAction) -> Self {
        match action {
            ChatAction::Open {
                assistant_slug,
                title,
            } => ChatView {
                phase: ChatPhase::Connecting,
                assistant_slug: Some(assistant_slug),
                title: Some(title),
                session_id: None,
                entries: vec![ChatEntry::confirmed(Role::Assistant, CONNECTING_STATUS)],
                status: Some(CONNECTING_STATUS.to_string()),
            },
            ChatAction::SessionReady { session_id } => {
                self.session_id = Some(session_id);
                self
            }
            ChatAction::SessionFailed { reason } => ChatView {
                status: Some(format!("Could not start the conversation: {reason}")),
                ..ChatView::default()
            },
            ChatAction::HistoryLoaded { messages } => {
                self.entries = transcript_entries(&messages);
                self.phase = ChatPhase::Ready;
                self.status = None;
                self
            }
            ChatAction::HistoryFailed { reason } => {
                // Only the connecting placeholder is replaced; a rendered
                // conversation stays as it was.
                if self.phase == ChatPhase::Connecting {
                    self.entries = transcript_entries(&[]);
                }
                self.phase = ChatPhase::Ready;
                self.status = Some(format!("Could not load the history: {reason}"));
                self
            }
            ChatAction::SendStarted { id, text } => {
                if self.phase != ChatPhase::Ready {
                    if self.phase == ChatPhase::Sending {
                        self.status = Some(BUSY_STATUS.to_string());
                    }
                    return self;
                }
                self.entries.push(ChatEntry {
                    id,
                    role: Role::User,
                    text,
                    delivery: Delivery::Pending,
                });
                self.phase = ChatPhase::Sending;
                self.status = Some(THINKING_STATUS.to_string());
                self
            }
            ChatAction::SendConfirmed { id, outcome } => {
                match outcome {
                    SendOutcome::Transcript(messages) => {
                        self.entries = transcript_entries(&messages);
                    }
                    SendOutcome::Reply(reply) => {
                        self.set_delivery(id, Delivery::Confirmed);
                        self.entries.push(ChatEntry::confirmed(Role::Assistant, reply));
                    }
                }
                self.phase = ChatPhase::Ready;
                self.status = None;
                self
            }
            ChatAction::SendFailed { id, reason } => {
                self.set_delivery(id, Delivery::Failed);
                self.phase = ChatPhase::Ready;
                self.status = Some(format!("Could not get a reply: {reason}"));
                self
            }
        }
    }

    fn set_delivery(&mut self, id: Uuid, delivery: Delivery) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.delivery = delivery;
        }
    }
}

/// Server messages as confirmed entries; an empty conversation shows the
/// greeting instead of an empty view.
fn transcript_entries(messages: &[Message]) -> Vec<ChatEntry> {
    let entries: Vec<ChatEntry> = messages
        .iter()
        .filter(|m| m.is_visible())
        .map(|m| ChatEntry::confirmed(m.role, m.content.clone()))
        .collect();
    if entries.is_empty() {
        vec![ChatEntry::confirmed(Role::Assistant, GREETING)]
    } else {
        entries
    }
}
