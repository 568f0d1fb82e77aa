//! Session Management
//!
//! The state of the single active chat session: the transcript, the files
//! staged for the next submission, and the in-flight guard.
//!
//! # Design Philosophy
//!
//! A session is plain data plus the atomic mutations the controller needs.
//! It does no I/O and knows nothing about backends. Every method leaves the
//! session in a consistent state, so whoever holds the lock can publish a
//! snapshot right after any call.

use serde::{Deserialize, Serialize};

use crate::messages::{now_ms, AttachedFile, Message, SessionId};

/// Session metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// When the session was created (Unix timestamp ms)
    pub created_at: u64,
    /// When the session was last mutated (Unix timestamp ms)
    pub last_active_at: u64,
    /// Submissions resolved in this session
    pub submissions: u32,
}

impl SessionMetadata {
    fn new() -> Self {
        let now = now_ms();
        Self {
            created_at: now,
            last_active_at: now,
            submissions: 0,
        }
    }

    /// Update last active timestamp
    pub fn touch(&mut self) {
        self.last_active_at = now_ms();
    }
}

/// A chat session
#[derive(Clone, Debug)]
pub struct Session {
    id: SessionId,
    greeting: String,
    metadata: SessionMetadata,
    messages: Vec<Message>,
    pending_files: Vec<AttachedFile>,
    analyzing: bool,
}

/// Immutable view of a session published to surfaces
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session ID
    pub id: SessionId,
    /// Transcript in order
    pub messages: Vec<Message>,
    /// Files staged for the next submission
    pub pending_files: Vec<AttachedFile>,
    /// Whether a submission is in flight
    pub analyzing: bool,
}

impl Session {
    /// Create a session holding only the greeting
    pub fn new(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        Self {
            id: SessionId::new(),
            messages: vec![Message::assistant(greeting.clone())],
            greeting,
            metadata: SessionMetadata::new(),
            pending_files: Vec::new(),
            analyzing: false,
        }
    }

    /// Start over: one greeting, nothing staged, not analyzing
    pub fn reset(&mut self) {
        self.id = SessionId::new();
        self.metadata = SessionMetadata::new();
        self.messages = vec![Message::assistant(self.greeting.clone())];
        self.pending_files.clear();
        self.analyzing = false;
    }

    /// Session ID
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Session metadata
    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    /// Transcript in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Files staged for the next submission
    pub fn pending_files(&self) -> &[AttachedFile] {
        &self.pending_files
    }

    /// Whether a submission is in flight
    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    /// Set the in-flight guard
    pub fn set_analyzing(&mut self, analyzing: bool) {
        self.analyzing = analyzing;
        self.metadata.touch();
    }

    /// Append files to the staging area, keeping their order
    pub fn stage(&mut self, files: impl IntoIterator<Item = AttachedFile>) {
        self.pending_files.extend(files);
        self.metadata.touch();
    }

    /// Remove the staged file at `index`
    ///
    /// Returns the removed file, or `None` when the index is out of range.
    pub fn remove_staged(&mut self, index: usize) -> Option<AttachedFile> {
        if index >= self.pending_files.len() {
            return None;
        }
        self.metadata.touch();
        Some(self.pending_files.remove(index))
    }

    /// Take every staged file, leaving the staging area empty
    pub fn take_pending(&mut self) -> Vec<AttachedFile> {
        std::mem::take(&mut self.pending_files)
    }

    /// Append a message to the transcript
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.metadata.touch();
    }

    /// Swap the last message for `message` in one step
    ///
    /// The last element is removed by position: whatever was appended last
    /// goes, placeholder or not.
    pub fn replace_last(&mut self, message: Message) -> Option<Message> {
        let removed = self.messages.pop();
        self.messages.push(message);
        self.metadata.submissions += 1;
        self.metadata.touch();
        removed
    }

    /// Copy the session into a snapshot for surfaces
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            messages: self.messages.clone(),
            pending_files: self.pending_files.clone(),
            analyzing: self.analyzing,
        }
    }
}

impl SessionSnapshot {
    /// The last message in the transcript
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Whether the transcript currently shows the placeholder
    pub fn has_placeholder(&self) -> bool {
        self.messages.iter().any(|m| m.pending)
    }
}
