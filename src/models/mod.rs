// TextLens Data Models
// Wire types for the HTTP surface and the domain types flowing through detection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============ Classification ============

/// Class a flagged substring was reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    Ai,
    Plagiarism,
}

/// Class of one segment of the highlight partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Ai,
    Plagiarism,
    Normal,
}

impl From<CandidateKind> for SegmentKind {
    fn from(kind: CandidateKind) -> Self {
        match kind {
            CandidateKind::Ai => SegmentKind::Ai,
            CandidateKind::Plagiarism => SegmentKind::Plagiarism,
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SegmentKind::Ai => "ai",
            SegmentKind::Plagiarism => "plagiarism",
            SegmentKind::Normal => "normal",
        };
        f.write_str(label)
    }
}

/// A substring the scoring provider reported as noteworthy.
/// Not guaranteed to occur in the analyzed text, nor to be unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedCandidate {
    pub text: String,
    pub kind: CandidateKind,
}

impl FlaggedCandidate {
    pub fn ai(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: CandidateKind::Ai }
    }

    pub fn plagiarism(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: CandidateKind::Plagiarism }
    }
}

// ============ Highlight Partition ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HighlightSegment {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SegmentKind,
}

impl HighlightSegment {
    pub fn new(text: impl Into<String>, kind: SegmentKind) -> Self {
        Self { text: text.into(), kind }
    }
}

// ============ Provider Assessments ============

/// Body the AI-likelihood call is asked to return.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiAssessment {
    #[serde(default)]
    pub ai_score: Option<f64>,
    #[serde(default)]
    pub human_score: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub ai_segments: Option<Vec<String>>,
}

/// Body the plagiarism-likelihood call is asked to return.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlagiarismAssessment {
    #[serde(default)]
    pub plagiarism_score: Option<f64>,
    #[serde(default)]
    pub plagiarized_segments: Option<Vec<String>>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Both provider results for one text; only ever built when both calls succeeded.
#[derive(Debug, Clone, Default)]
pub struct RawScores {
    pub ai: AiAssessment,
    pub plagiarism: PlagiarismAssessment,
}

// ============ Analysis Request / Response ============

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Normalized numeric scores, independent of segment placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub ai_score: u8,
    pub human_score: u8,
    pub plagiarism_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ai_score: u8,
    pub human_score: u8,
    pub plagiarism_score: u8,
    pub highlighted_text: Vec<HighlightSegment>,
    pub ai_reasoning: String,
    pub plagiarism_reasoning: String,
}

impl AnalysisResult {
    pub fn scores(&self) -> ScoreResult {
        ScoreResult {
            ai_score: self.ai_score,
            human_score: self.human_score,
            plagiarism_score: self.plagiarism_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub message: String,
}

// ============ History ============

/// Caller identity an analysis is recorded under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Write shape accepted by the history store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAnalysisRecord {
    pub owner_id: OwnerId,
    pub text_content: String,
    pub ai_score: u8,
    pub human_score: u8,
    pub plagiarism_score: u8,
    pub highlighted_text: Vec<HighlightSegment>,
}

impl NewAnalysisRecord {
    pub fn from_result(owner_id: OwnerId, text: &str, result: &AnalysisResult) -> Self {
        Self {
            owner_id,
            text_content: text.to_string(),
            ai_score: result.ai_score,
            human_score: result.human_score,
            plagiarism_score: result.plagiarism_score,
            highlighted_text: result.highlighted_text.clone(),
        }
    }
}

/// Persisted analysis row. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub text_content: String,
    pub ai_score: u8,
    pub human_score: u8,
    pub plagiarism_score: u8,
    pub highlighted_text: Vec<HighlightSegment>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn create(new: NewAnalysisRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            text_content: new.text_content,
            ai_score: new.ai_score,
            human_score: new.human_score,
            plagiarism_score: new.plagiarism_score,
            highlighted_text: new.highlighted_text,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryListResponse {
    pub items: Vec<AnalysisRecord>,
}
