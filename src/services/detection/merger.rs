// Highlight Merger
// Folds the flagged candidates of both scoring calls into one gapless partition
//
// Policy:
// 1. Candidates are stable-sorted by where their text FIRST occurs anywhere in
//    the source (ai candidates come before plagiarism ones in the input, so
//    ties favor ai).
// 2. A single forward cursor walks the text. Each candidate is searched for
//    from the cursor on; if it does not occur there it is dropped.
// 3. Gaps between matches become `normal` segments, as does any tail.
//
// Overlapping candidates therefore lose to whichever sorts first, a repeated
// substring is highlighted once per candidate entry, and candidates the
// provider invented vanish. None of this is an error; the partition always
// concatenates back to the source text.

use crate::models::{FlaggedCandidate, HighlightSegment, SegmentKind};

/// Half-open byte range `[start, end)` of the source text with its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
    pub kind: SegmentKind,
}

#[derive(Debug, Default)]
struct MergeState {
    spans: Vec<HighlightSpan>,
    cursor: usize,
}

/// Order candidates by global first occurrence. `None` (never occurs) sorts
/// first, which is harmless: such a candidate cannot match after the cursor either.
fn order_by_first_occurrence<'a>(
    text: &str,
    candidates: &'a [FlaggedCandidate],
) -> Vec<&'a FlaggedCandidate> {
    let mut ordered: Vec<(Option<usize>, &FlaggedCandidate)> = candidates
        .iter()
        .map(|c| (text.find(c.text.as_str()), c))
        .collect();
    ordered.sort_by_key(|(pos, _)| *pos);
    ordered.into_iter().map(|(_, c)| c).collect()
}

fn step(text: &str, mut state: MergeState, candidate: &FlaggedCandidate) -> MergeState {
    if candidate.text.is_empty() {
        return state;
    }

    let Some(offset) = text[state.cursor..].find(candidate.text.as_str()) else {
        return state;
    };

    let start = state.cursor + offset;
    let end = start + candidate.text.len();

    if start > state.cursor {
        state.spans.push(HighlightSpan {
            start: state.cursor,
            end: start,
            kind: SegmentKind::Normal,
        });
    }
    state.spans.push(HighlightSpan {
        start,
        end,
        kind: candidate.kind.into(),
    });
    state.cursor = end;
    state
}

/// Compute the partition as byte spans over `text`.
pub fn merge_spans(text: &str, candidates: &[FlaggedCandidate]) -> Vec<HighlightSpan> {
    let ordered = order_by_first_occurrence(text, candidates);

    let MergeState { mut spans, cursor } = ordered
        .into_iter()
        .fold(MergeState::default(), |state, candidate| step(text, state, candidate));

    if cursor < text.len() {
        spans.push(HighlightSpan {
            start: cursor,
            end: text.len(),
            kind: SegmentKind::Normal,
        });
    }

    spans
}

/// Partition `text` into ordered, non-overlapping highlight segments.
pub fn merge(text: &str, candidates: &[FlaggedCandidate]) -> Vec<HighlightSegment> {
    merge_spans(text, candidates)
        .into_iter()
        .map(|span| HighlightSegment::new(&text[span.start..span.end], span.kind))
        .collect()
}
