// Segment Extractor
// Turns the provider's flagged-substring arrays into tagged candidates

use crate::models::{FlaggedCandidate, RawScores};

/// All ai candidates in provider order, followed by all plagiarism candidates.
/// The merger relies on this order to break position ties in favor of ai.
pub fn extract(raw: &RawScores) -> Vec<FlaggedCandidate> {
    let ai = raw
        .ai
        .ai_segments
        .iter()
        .flatten()
        .map(|s| FlaggedCandidate::ai(s.as_str()));
    let plagiarism = raw
        .plagiarism
        .plagiarized_segments
        .iter()
        .flatten()
        .map(|s| FlaggedCandidate::plagiarism(s.as_str()));

    ai.chain(plagiarism).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AiAssessment, CandidateKind, PlagiarismAssessment};

    #[test]
    fn test_extract_orders_ai_first() {
        let raw = RawScores {
            ai: AiAssessment {
                ai_segments: Some(vec!["b".into(), "a".into()]),
                ..AiAssessment::default()
            },
            plagiarism: PlagiarismAssessment {
                plagiarized_segments: Some(vec!["a".into()]),
                ..PlagiarismAssessment::default()
            },
        };
        let out = extract(&raw);
        let kinds: Vec<_> = out.iter().map(|c| (c.text.as_str(), c.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("b", CandidateKind::Ai),
                ("a", CandidateKind::Ai),
                ("a", CandidateKind::Plagiarism),
            ]
        );
    }

    #[test]
    fn test_missing_arrays_yield_no_candidates() {
        assert!(extract(&RawScores::default()).is_empty());
    }
}
