// Analyzer
// End-to-end pipeline: dispatch -> extract -> merge -> assemble (-> persist)

use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::error::AnalysisError;
use crate::models::{AnalysisResult, OwnerId};
use crate::services::history_store::HistoryStore;

use super::assembler::{assemble, persist};
use super::dispatcher::ScoreRequestDispatcher;
use super::extractor::extract;
use super::merger::merge;

pub struct Analyzer {
    dispatcher: ScoreRequestDispatcher,
    history: Arc<dyn HistoryStore>,
}

impl Analyzer {
    pub fn new(dispatcher: ScoreRequestDispatcher, history: Arc<dyn HistoryStore>) -> Self {
        Self { dispatcher, history }
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    /// Analyze `text`. With an owner, the result is also recorded (best effort).
    pub async fn analyze(&self, text: &str, owner: Option<OwnerId>) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();

        let raw = self.dispatcher.dispatch(text).await?;
        let candidates = extract(&raw);
        let segments = merge(text, &candidates);
        let result = assemble(&raw, segments);

        info!(
            candidates = candidates.len(),
            segments = result.highlighted_text.len(),
            ai_score = result.ai_score,
            plagiarism_score = result.plagiarism_score,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "[ANALYZER] analysis complete"
        );

        if let Some(owner) = owner {
            persist(self.history.as_ref(), owner, text, &result).await;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HighlightSegment, NewAnalysisRecord, SegmentKind};
    use crate::services::detection::dispatcher::testing::ScriptedBackend;
    use crate::services::history_store::{MemoryHistoryStore, StoreError};
    use crate::models::AnalysisRecord;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct FailingStore;

    #[async_trait]
    impl HistoryStore for FailingStore {
        async fn insert(&self, _record: NewAnalysisRecord) -> Result<AnalysisRecord, StoreError> {
            Err(StoreError::Write(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        }

        async fn list_recent(&self, _owner: &OwnerId, _limit: usize) -> Result<Vec<AnalysisRecord>, StoreError> {
            Ok(Vec::new())
        }

        async fn delete(&self, _owner: &OwnerId, _id: Uuid) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    fn analyzer(ai: &str, plagiarism: &str, history: Arc<dyn HistoryStore>) -> Analyzer {
        let backend = Arc::new(ScriptedBackend::ok(ai, plagiarism));
        Analyzer::new(ScoreRequestDispatcher::new(backend), history)
    }

    #[tokio::test]
    async fn test_overlapping_candidates_end_to_end() {
        let history = Arc::new(MemoryHistoryStore::new());
        let analyzer = analyzer(
            r#"{"ai_score": 88, "reasoning": "templated", "ai_segments": ["Hello world"]}"#,
            r#"{"plagiarism_score": 40.4, "plagiarized_segments": ["world"], "reasoning": "common"}"#,
            history.clone(),
        );

        let result = analyzer.analyze("Hello world", None).await.unwrap();
        assert_eq!(
            result.highlighted_text,
            vec![HighlightSegment::new("Hello world", SegmentKind::Ai)]
        );
        assert_eq!(result.ai_score, 88);
        assert_eq!(result.human_score, 12);
        assert_eq!(result.plagiarism_score, 40);
        assert_eq!(result.ai_reasoning, "templated");
        assert_eq!(result.plagiarism_reasoning, "common");

        // Anonymous analyses are not recorded.
        let owner = OwnerId("anyone".to_string());
        assert!(history.list_recent(&owner, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_owner_analysis_is_recorded() {
        let history = Arc::new(MemoryHistoryStore::new());
        let analyzer = analyzer(
            r#"{"ai_score": 10, "human_score": 90, "ai_segments": ["xyz"]}"#,
            r#"{"plagiarism_score": 0}"#,
            history.clone(),
        );
        let owner = OwnerId("user-7".to_string());

        let result = analyzer.analyze("abc", Some(owner.clone())).await.unwrap();
        assert_eq!(
            result.highlighted_text,
            vec![HighlightSegment::new("abc", SegmentKind::Normal)]
        );

        let saved = history.list_recent(&owner, 10).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].text_content, "abc");
        assert_eq!(saved[0].human_score, 90);
        assert_eq!(saved[0].highlighted_text, result.highlighted_text);
    }

    #[tokio::test]
    async fn test_store_failure_does_not_fail_analysis() {
        let analyzer = analyzer(
            r#"{"ai_score": 50}"#,
            r#"{"plagiarism_score": 50}"#,
            Arc::new(FailingStore),
        );
        let result = analyzer
            .analyze("some text", Some(OwnerId("user-1".to_string())))
            .await
            .unwrap();
        assert_eq!(result.ai_score, 50);
    }
}
