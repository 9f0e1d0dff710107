use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::engine::{extract_answers, Clue, GridModel, Pos};

/// One submitted answer, keyed by the backend's clue identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    #[serde(rename = "clueID")]
    pub clue_id: u32,
    #[serde(rename = "clueText")]
    pub clue_text: String,
}

/// The `POST /submitcrossword` request body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub crossword_id: u32,
    pub answers: Vec<AnswerEntry>,
}

/// Assembles the wire payload from the grid's current letters. Every clue
/// appears in the answers array, with `""` for anything unfilled or
/// unresolvable.
pub fn build_payload(
    crossword_id: u32,
    grid: &GridModel,
    clues: &[Clue],
    numbering: &HashMap<Pos, u32>,
) -> SubmissionPayload {
    let answers = extract_answers(grid, clues, numbering)
        .into_iter()
        .map(|(clue_id, clue_text)| AnswerEntry { clue_id, clue_text })
        .collect();
    SubmissionPayload {
        crossword_id,
        answers,
    }
}

/// Single-flight guard for submission. The countdown's auto-submit and the
/// user's submit button may fire concurrently; whichever calls
/// [`SubmitGuard::try_begin`] first owns the one permitted attempt, and the
/// flag stays set whether that attempt later succeeds or fails.
#[derive(Debug, Default)]
pub struct SubmitGuard {
    attempted: AtomicBool,
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the submission attempt. Returns true exactly once.
    pub fn try_begin(&self) -> bool {
        !self.attempted.swap(true, Ordering::SeqCst)
    }

    pub fn attempted(&self) -> bool {
        self.attempted.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CrosswordBackend;
    use crate::engine::{derive_numbering, Direction};
    use crate::error::CrosswordError;
    use crate::model::{PuzzleDoc, SolutionDoc};
    use std::cell::Cell as StdCell;

    // Backend fake that counts submissions and answers with a canned result.
    struct RecordingBackend {
        calls: StdCell<u32>,
        outcome: Result<String, CrosswordError>,
    }

    impl RecordingBackend {
        fn succeeding() -> Self {
            Self {
                calls: StdCell::new(0),
                outcome: Ok("Answers received".to_string()),
            }
        }

        fn rejecting() -> Self {
            Self {
                calls: StdCell::new(0),
                outcome: Err(CrosswordError::Rejected("Already submitted".to_string())),
            }
        }
    }

    impl CrosswordBackend for RecordingBackend {
        async fn fetch_puzzle(&self) -> Result<PuzzleDoc, CrosswordError> {
            unreachable!("not exercised")
        }

        async fn submit_answers(
            &self,
            _payload: &SubmissionPayload,
        ) -> Result<String, CrosswordError> {
            self.calls.set(self.calls.get() + 1);
            self.outcome.clone()
        }

        async fn fetch_solution(&self, _crossword_id: u32) -> Result<SolutionDoc, CrosswordError> {
            unreachable!("not exercised")
        }
    }

    fn two_by_four() -> (GridModel, Vec<Clue>, HashMap<Pos, u32>) {
        let mask = vec![
            vec![false, false, true, false],
            vec![false, false, true, false],
        ];
        let grid = GridModel::from_mask(&mask).unwrap();
        let numbering = derive_numbering(&grid);
        let clues = vec![
            Clue {
                id: 1,
                text: "Two across".to_string(),
                dir: Direction::Across,
                anchor: Some((0, 0)),
                length: Some(2),
            },
            Clue {
                id: 3,
                text: "Two down".to_string(),
                dir: Direction::Down,
                anchor: None,
                length: None,
            },
        ];
        (grid, clues, numbering)
    }

    #[test]
    fn test_empty_grid_submits_empty_strings() {
        let (grid, clues, numbering) = two_by_four();
        let payload = build_payload(9, &grid, &clues, &numbering);
        assert_eq!(payload.crossword_id, 9);
        // Every clue is present, none omitted.
        assert_eq!(payload.answers.len(), 2);
        assert!(payload.answers.iter().all(|a| a.clue_text.is_empty()));
    }

    #[test]
    fn test_filled_grid_submits_words() {
        let (mut grid, clues, numbering) = two_by_four();
        grid.set_letter((0, 0), Some('A'));
        grid.set_letter((0, 1), Some('T'));
        grid.set_letter((0, 3), Some('G'));
        grid.set_letter((1, 3), Some('O'));

        let payload = build_payload(9, &grid, &clues, &numbering);
        assert_eq!(
            payload.answers,
            vec![
                AnswerEntry {
                    clue_id: 1,
                    clue_text: "AT".to_string()
                },
                AnswerEntry {
                    clue_id: 3,
                    clue_text: "GO".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_payload_wire_field_names() {
        let (grid, clues, numbering) = two_by_four();
        let payload = build_payload(1, &grid, &clues, &numbering);
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"crossword_id\":1"));
        assert!(json.contains("\"clueID\":1"));
        assert!(json.contains("\"clueText\":\"\""));
    }

    #[test]
    fn test_guard_admits_exactly_one_attempt() {
        let guard = SubmitGuard::new();
        assert!(!guard.attempted());
        assert!(guard.try_begin());
        assert!(guard.attempted());
        assert!(!guard.try_begin());
        assert!(!guard.try_begin());
    }

    #[tokio::test]
    async fn test_racing_submits_send_once() {
        let (grid, clues, numbering) = two_by_four();
        let payload = build_payload(1, &grid, &clues, &numbering);
        let backend = RecordingBackend::succeeding();
        let guard = SubmitGuard::new();

        // Timer auto-submit and a manual click in immediate succession: the
        // guard is decided before any request is in flight.
        for _ in 0..2 {
            if guard.try_begin() {
                backend.submit_answers(&payload).await.unwrap();
            }
        }
        assert_eq!(backend.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_guard_stays_claimed_after_failure() {
        let (grid, clues, numbering) = two_by_four();
        let payload = build_payload(1, &grid, &clues, &numbering);
        let backend = RecordingBackend::rejecting();
        let guard = SubmitGuard::new();

        assert!(guard.try_begin());
        let err = backend.submit_answers(&payload).await.unwrap_err();
        assert_eq!(
            err,
            CrosswordError::Rejected("Already submitted".to_string())
        );
        // A failed attempt still counts; no automatic retry may follow.
        assert!(!guard.try_begin());
    }
}
