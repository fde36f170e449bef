// Score Request Dispatcher
// Sends one text to both scoring calls concurrently; both must succeed

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{AnalysisError, ScoringCall};
use crate::models::{AiAssessment, PlagiarismAssessment, RawScores};
use crate::services::providers::{unwrap_json_content, ChatBackend};
use crate::services::text_processor::preview;

const AI_DETECTION_SYSTEM_PROMPT: &str = r#"You are an AI detection expert. Analyze the given text and determine if it's AI-generated or human-written.
Look for patterns like:
- Overly formal or uniform sentence structure
- Lack of personal anecdotes or emotions
- Consistent vocabulary complexity
- Perfect grammar without natural imperfections
- Generic or template-like responses
- Lack of unique voice or personality

Respond with a JSON object containing:
- ai_score: percentage (0-100) indicating likelihood of AI generation
- human_score: percentage (0-100) indicating likelihood of human writing
- reasoning: brief explanation of your analysis
- ai_segments: array of text segments that appear AI-generated"#;

const PLAGIARISM_SYSTEM_PROMPT: &str = r#"You are a plagiarism detection expert. Analyze the given text for signs of plagiarism.
Look for:
- Common phrases or sentences that appear in well-known sources
- Academic or formal language that might be copied
- Inconsistent writing style suggesting multiple sources
- Direct quotes without attribution

Respond with a JSON object containing:
- plagiarism_score: percentage (0-100) indicating likelihood of plagiarism
- plagiarized_segments: array of text segments that appear plagiarized
- reasoning: brief explanation"#;

/// Reject input that is empty once whitespace is trimmed.
pub fn validate_text(text: &str) -> Result<(), AnalysisError> {
    if text.trim().is_empty() {
        return Err(AnalysisError::Validation("Text is required".to_string()));
    }
    Ok(())
}

fn parse_assessment<T: DeserializeOwned>(call: ScoringCall, content: &str) -> Result<T, AnalysisError> {
    serde_json::from_str::<T>(unwrap_json_content(content)).map_err(|e| AnalysisError::Parse {
        call,
        message: e.to_string(),
    })
}

pub struct ScoreRequestDispatcher {
    backend: Arc<dyn ChatBackend>,
}

impl ScoreRequestDispatcher {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    async fn score<T: DeserializeOwned>(
        &self,
        call: ScoringCall,
        system: &str,
        user: String,
    ) -> Result<T, AnalysisError> {
        let result = self
            .backend
            .complete_json(system, &user)
            .await
            .map_err(|e| AnalysisError::from_provider(call, e))?;

        info!(
            call = ?call,
            latency_ms = result.latency_ms,
            content_len = result.content.len(),
            "[DISPATCHER] scoring call finished"
        );

        parse_assessment(call, &result.content)
    }

    /// Run both scoring calls as one joined operation. The first failure aborts
    /// the whole dispatch; there is no partial result.
    pub async fn dispatch(&self, text: &str) -> Result<RawScores, AnalysisError> {
        validate_text(text)?;

        info!(chars = text.chars().count(), "[DISPATCHER] Analyzing text: {}", preview(text));
        let started = Instant::now();

        let ai_call = self.score::<AiAssessment>(
            ScoringCall::Ai,
            AI_DETECTION_SYSTEM_PROMPT,
            format!("Analyze this text:\n\n{}", text),
        );
        let plagiarism_call = self.score::<PlagiarismAssessment>(
            ScoringCall::Plagiarism,
            PLAGIARISM_SYSTEM_PROMPT,
            format!("Analyze this text for plagiarism:\n\n{}", text),
        );

        match tokio::try_join!(ai_call, plagiarism_call) {
            Ok((ai, plagiarism)) => {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    ai_segments = ai.ai_segments.as_ref().map_or(0, Vec::len),
                    plagiarized_segments = plagiarism.plagiarized_segments.as_ref().map_or(0, Vec::len),
                    "[DISPATCHER] both scoring calls succeeded"
                );
                Ok(RawScores { ai, plagiarism })
            }
            Err(e) => {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "[DISPATCHER] analysis aborted: {}",
                    e
                );
                Err(e)
            }
        }
    }
}
