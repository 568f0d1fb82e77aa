//! Transcript Messages
//!
//! The data carried by a chat session: transcript messages, the files a
//! user attached to them, and the classifier verdicts reported back.
//!
//! # Design Philosophy
//!
//! Surfaces never mutate these types. The controller builds them, appends
//! them to the transcript, and publishes snapshots. A surface only reads
//! snapshots and renders what it is told.

use serde::{Deserialize, Serialize};

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new unique session ID
    pub fn new() -> Self {
        Self(format!("session_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// The detection assistant
    Assistant,
}

/// A file accepted for analysis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    /// Original filename
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Decoded text content
    pub content: String,
}

impl AttachedFile {
    /// Create an attachment from already-decoded text
    pub fn new(name: impl Into<String>, size: u64, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            content: content.into(),
        }
    }

    /// Create an attachment whose size is the byte length of `content`
    pub fn from_text(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            content,
        }
    }
}

/// Classifier verdict
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prediction {
    /// Written by a person
    Human,
    /// Produced by a model
    Machine,
    /// The classifier reported neither a usable label nor a probability
    Unknown,
}

impl Prediction {
    /// Derive a verdict from the probability of class 1 (machine)
    #[must_use]
    pub fn from_probability(probability_machine_generated: f64, threshold: f64) -> Self {
        if probability_machine_generated >= threshold {
            Self::Machine
        } else {
            Self::Human
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Human => "Human-Written",
            Self::Machine => "Machine-Generated",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human => f.write_str("human"),
            Self::Machine => f.write_str("machine"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Classifier output attached to an assistant message
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The verdict
    pub prediction: Prediction,
    /// Probability in [0, 1] that the code is machine-generated, if reported
    pub probability_machine_generated: Option<f64>,
    /// Which classifier produced the result
    pub model: Option<String>,
}

impl AnalysisResult {
    /// Create a result from a machine probability, deriving the verdict
    #[must_use]
    pub fn from_probability(
        probability_machine_generated: f64,
        threshold: f64,
        model: Option<String>,
    ) -> Self {
        let probability = probability_machine_generated.clamp(0.0, 1.0);
        Self {
            prediction: Prediction::from_probability(probability, threshold),
            probability_machine_generated: Some(probability),
            model,
        }
    }

    /// Machine probability as a percentage in [0, 100]
    #[must_use]
    pub fn machine_percent(&self) -> Option<f64> {
        self.probability_machine_generated.map(|p| p * 100.0)
    }

    /// Confidence in the reported verdict as a percentage in [0, 100]
    ///
    /// For a `Machine` verdict this is the machine probability, for a
    /// `Human` verdict its complement. An `Unknown` verdict reports the
    /// machine probability as is.
    #[must_use]
    pub fn confidence_percent(&self) -> Option<f64> {
        self.probability_machine_generated.map(|p| match self.prediction {
            Prediction::Machine | Prediction::Unknown => p * 100.0,
            Prediction::Human => (1.0 - p) * 100.0,
        })
    }
}

/// One turn in the transcript
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub role: MessageRole,
    /// Display text
    pub content: String,
    /// Files submitted with this message (user messages only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachedFile>,
    /// Classifier verdict (assistant messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    /// Whether this is the transient placeholder shown while analyzing
    #[serde(default)]
    pub pending: bool,
    /// When the message was created (Unix timestamp ms)
    pub timestamp: u64,
}

impl Message {
    fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content,
            attachments: Vec::new(),
            analysis: None,
            pending: false,
            timestamp: now_ms(),
        }
    }

    /// A user message with its attachments
    pub fn user(content: impl Into<String>, attachments: Vec<AttachedFile>) -> Self {
        Self {
            attachments,
            ..Self::new(MessageRole::User, content.into())
        }
    }

    /// A plain assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content.into())
    }

    /// An assistant message reporting a verdict
    pub fn assistant_analysis(content: impl Into<String>, analysis: AnalysisResult) -> Self {
        Self {
            analysis: Some(analysis),
            ..Self::new(MessageRole::Assistant, content.into())
        }
    }

    /// The transient "Analyzing..." placeholder
    pub fn placeholder(content: impl Into<String>) -> Self {
        Self {
            pending: true,
            ..Self::new(MessageRole::Assistant, content.into())
        }
    }
}

/// Get current timestamp in milliseconds
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
