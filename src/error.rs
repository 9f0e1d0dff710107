use thiserror::Error;

/// Failure modes of the crossword client, from puzzle load through submission.
///
/// `InvalidLayout` is fatal to rendering. `DegenerateSpan` indicates an
/// internal inconsistency between numbering and span resolution and is logged
/// rather than shown. `UnresolvableClue` is recovered per clue during answer
/// extraction. `Network` and `Rejected` are the two user-visible submission
/// outcomes; only `Network` is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrosswordError {
    #[error("could not load crossword: {0}")]
    InvalidLayout(String),

    #[error("entry anchored at ({0}, {1}) has no cells")]
    DegenerateSpan(usize, usize),

    #[error("no grid position found for clue {0}")]
    UnresolvableClue(u32),

    #[error("network failure: {0}")]
    Network(String),

    #[error("{0}")]
    Rejected(String),
}
