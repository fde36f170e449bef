// Result Assembler
// Normalizes provider scores and packages the response; best-effort persistence

use tracing::{info, warn};

use crate::models::{AnalysisResult, HighlightSegment, NewAnalysisRecord, OwnerId, RawScores};
use crate::services::history_store::HistoryStore;

/// Round a provider percentage to an integer in [0, 100]. Non-finite values count as 0.
pub fn normalize_score(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u8
}

pub fn assemble(raw: &RawScores, segments: Vec<HighlightSegment>) -> AnalysisResult {
    let ai_score = normalize_score(raw.ai.ai_score.unwrap_or(0.0));
    let human_score = match raw.ai.human_score {
        Some(v) => normalize_score(v),
        None => 100 - ai_score,
    };
    let plagiarism_score = normalize_score(raw.plagiarism.plagiarism_score.unwrap_or(0.0));

    AnalysisResult {
        ai_score,
        human_score,
        plagiarism_score,
        highlighted_text: segments,
        ai_reasoning: raw.ai.reasoning.clone().unwrap_or_default(),
        plagiarism_reasoning: raw.plagiarism.reasoning.clone().unwrap_or_default(),
    }
}

/// Hand a finished analysis to the history store. Failures are logged, never returned.
pub async fn persist(store: &dyn HistoryStore, owner: OwnerId, text: &str, result: &AnalysisResult) {
    let record = NewAnalysisRecord::from_result(owner, text, result);
    match store.insert(record).await {
        Ok(saved) => info!(id = %saved.id, owner = %saved.owner_id, "[ASSEMBLER] analysis saved"),
        Err(e) => warn!("[ASSEMBLER] failed to save analysis: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AiAssessment, PlagiarismAssessment, SegmentKind};

    fn raw(ai: Option<f64>, human: Option<f64>, plagiarism: Option<f64>) -> RawScores {
        RawScores {
            ai: AiAssessment {
                ai_score: ai,
                human_score: human,
                reasoning: Some("why ai".to_string()),
                ai_segments: None,
            },
            plagiarism: PlagiarismAssessment {
                plagiarism_score: plagiarism,
                plagiarized_segments: None,
                reasoning: None,
            },
        }
    }

    #[test]
    fn test_normalize_score() {
        assert_eq!(normalize_score(72.5), 73);
        assert_eq!(normalize_score(72.4), 72);
        assert_eq!(normalize_score(-3.0), 0);
        assert_eq!(normalize_score(140.0), 100);
        assert_eq!(normalize_score(f64::NAN), 0);
    }

    #[test]
    fn test_human_score_defaults_to_complement() {
        let result = assemble(&raw(Some(64.6), None, Some(12.2)), vec![]);
        assert_eq!(result.ai_score, 65);
        assert_eq!(result.human_score, 35);
        assert_eq!(result.plagiarism_score, 12);
    }

    #[test]
    fn test_reported_human_score_is_used() {
        let result = assemble(&raw(Some(60.0), Some(10.0), None), vec![]);
        assert_eq!(result.human_score, 10);
        assert_eq!(result.plagiarism_score, 0);

        let result = assemble(&raw(Some(70.0), Some(0.0), None), vec![]);
        assert_eq!(result.human_score, 0);
    }

    #[test]
    fn test_missing_scores_and_reasoning() {
        let seg = HighlightSegment::new("abc", SegmentKind::Normal);
        let result = assemble(&raw(None, None, None), vec![seg.clone()]);
        assert_eq!(result.ai_score, 0);
        assert_eq!(result.human_score, 100);
        assert_eq!(result.ai_reasoning, "why ai");
        assert_eq!(result.plagiarism_reasoning, "");
        assert_eq!(result.highlighted_text, vec![seg]);
    }
}
