//! Mock Backend
//!
//! Offline classifier for demos and tests. It never touches the network.
//!
//! Text-only submissions that do not look like code are rejected with a
//! prompt to paste code instead, whatever the mode.

use async_trait::async_trait;
use rand::Rng;

use super::traits::{AnalysisBackend, AnalysisError, AnalysisRequest};
use crate::messages::{AnalysisResult, Prediction};

/// Model name reported by mock results
pub const MOCK_MODEL: &str = "mock";

/// Reply used when the submission is not code
pub const NOT_CODE_REPLY: &str =
    "Please paste a code snippet or upload code files for me to analyze.";

const CODE_MARKERS: &[&str] = &["function", "const", "class", "def"];

/// How the mock picks a verdict
#[derive(Clone, Debug, PartialEq)]
pub enum MockMode {
    /// Character-code checksum of the submission, modulo 100
    Checksum,
    /// Coin-flip verdict with 70-100% confidence
    Random,
    /// Always the same result
    Fixed(AnalysisResult),
}

/// Offline classifier
#[derive(Clone, Debug)]
pub struct MockBackend {
    mode: MockMode,
    threshold: f64,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(MockMode::Checksum)
    }
}

impl MockBackend {
    /// Create a mock in the given mode
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            threshold: super::http::DEFAULT_MACHINE_THRESHOLD,
        }
    }

    /// A mock that always returns `result`
    pub fn fixed(result: AnalysisResult) -> Self {
        Self::new(MockMode::Fixed(result))
    }

    /// Whether a submission looks like code worth classifying
    pub fn looks_like_code(request: &AnalysisRequest) -> bool {
        if !request.files.is_empty() {
            return true;
        }
        request
            .text
            .as_deref()
            .is_some_and(|t| CODE_MARKERS.iter().any(|m| t.contains(m)))
    }

    /// Deterministic machine probability for a text
    pub fn checksum_probability(text: &str) -> f64 {
        let sum: u64 = text.chars().map(|c| u64::from(u32::from(c))).sum();
        (sum % 100) as f64 / 100.0
    }

    fn classify(&self, request: &AnalysisRequest) -> AnalysisResult {
        match &self.mode {
            MockMode::Checksum => {
                let p = Self::checksum_probability(&request.combined_text());
                AnalysisResult::from_probability(p, self.threshold, Some(MOCK_MODEL.to_string()))
            }
            MockMode::Random => {
                let mut rng = rand::thread_rng();
                let machine = rng.gen_bool(0.5);
                let confidence = rng.gen_range(0.70..1.0);
                let (prediction, probability) = if machine {
                    (Prediction::Machine, confidence)
                } else {
                    (Prediction::Human, 1.0 - confidence)
                };
                AnalysisResult {
                    prediction,
                    probability_machine_generated: Some(probability),
                    model: Some(MOCK_MODEL.to_string()),
                }
            }
            MockMode::Fixed(result) => result.clone(),
        }
    }
}

#[async_trait]
impl AnalysisBackend for MockBackend {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn submit_for_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        if !Self::looks_like_code(request) {
            return Err(AnalysisError::Rejected(NOT_CODE_REPLY.to_string()));
        }
        Ok(self.classify(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::AttachedFile;

    #[test]
    fn test_checksum_probability() {
        // 'a' = 97, 'b' = 98 -> 195 % 100 = 95
        assert!((MockBackend::checksum_probability("ab") - 0.95).abs() < 1e-9);
        assert_eq!(MockBackend::checksum_probability(""), 0.0);
    }

    #[test]
    fn test_looks_like_code() {
        assert!(MockBackend::looks_like_code(&AnalysisRequest::new(
            "def foo(): pass",
            Vec::new()
        )));
        assert!(!MockBackend::looks_like_code(&AnalysisRequest::new(
            "hello there",
            Vec::new()
        )));
        assert!(MockBackend::looks_like_code(&AnalysisRequest::new(
            "",
            vec![AttachedFile::from_text("notes.py", "hello")]
        )));
    }

    #[tokio::test]
    async fn test_rejects_prose() {
        let backend = MockBackend::default();
        let err = backend
            .submit_for_analysis(&AnalysisRequest::new("just chatting", Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Rejected(_)));
        assert_eq!(err.to_string(), NOT_CODE_REPLY);
    }

    #[tokio::test]
    async fn test_checksum_is_deterministic() {
        let backend = MockBackend::default();
        let request = AnalysisRequest::new("class Foo {}", Vec::new());
        let a = backend.submit_for_analysis(&request).await.unwrap();
        let b = backend.submit_for_analysis(&request).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.model.as_deref(), Some(MOCK_MODEL));
    }

    #[tokio::test]
    async fn test_random_confidence_range() {
        let backend = MockBackend::new(MockMode::Random);
        let request = AnalysisRequest::new("const x = 1;", Vec::new());
        for _ in 0..50 {
            let result = backend.submit_for_analysis(&request).await.unwrap();
            let confidence = result.confidence_percent().unwrap();
            assert!((69.999..=100.0).contains(&confidence), "{confidence}");
        }
    }
}
