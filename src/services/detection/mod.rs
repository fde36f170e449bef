// Detection Module
// Highlighting pipeline organized into specialized submodules:
// - dispatcher: joined AI-likelihood + plagiarism scoring calls
// - extractor: flagged substrings -> tagged candidates
// - merger: candidates -> gapless highlight partition
// - assembler: score normalization, response packaging, persistence hand-off
// - analyzer: wires the stages together

pub mod dispatcher;
pub mod extractor;
pub mod merger;
pub mod assembler;
pub mod analyzer;

pub use dispatcher::{validate_text, ScoreRequestDispatcher};
pub use extractor::extract;
pub use merger::{merge, merge_spans, HighlightSpan};
pub use assembler::{assemble, normalize_score, persist};
pub use analyzer::Analyzer;
