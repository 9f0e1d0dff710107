use std::collections::HashMap;

use leptos::logging::log;

use crate::error::CrosswordError;

/// 0-indexed (row, col) grid coordinate.
pub type Pos = (usize, usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Across,
    Down,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Cell {
    Blocked,
    Fillable(Option<char>),
}

/// The playing grid: an immutable blocked/fillable layout plus one mutable
/// uppercase letter per fillable cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridModel {
    cells: Vec<Vec<Cell>>,
}

impl GridModel {
    /// Builds a grid from a blocked-cell mask (`true` = blocked). The mask
    /// must be rectangular and non-empty.
    pub fn from_mask(blocked: &[Vec<bool>]) -> Result<Self, CrosswordError> {
        if blocked.is_empty() || blocked[0].is_empty() {
            return Err(CrosswordError::InvalidLayout(
                "grid has no cells".to_string(),
            ));
        }
        let cols = blocked[0].len();
        if blocked.iter().any(|row| row.len() != cols) {
            return Err(CrosswordError::InvalidLayout(
                "grid rows have unequal lengths".to_string(),
            ));
        }

        let cells = blocked
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&b| if b { Cell::Blocked } else { Cell::Fillable(None) })
                    .collect()
            })
            .collect();
        Ok(Self { cells })
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells[0].len()
    }

    /// False for blocked cells and for positions outside the grid.
    pub fn is_fillable(&self, (row, col): Pos) -> bool {
        matches!(
            self.cells.get(row).and_then(|r| r.get(col)),
            Some(Cell::Fillable(_))
        )
    }

    /// The letter held at `pos`, or `None` for empty, blocked, or
    /// out-of-bounds cells.
    pub fn letter_at(&self, (row, col): Pos) -> Option<char> {
        match self.cells.get(row).and_then(|r| r.get(col)) {
            Some(Cell::Fillable(letter)) => *letter,
            _ => None,
        }
    }

    /// Overwrites the letter at `pos`. A blocked or out-of-bounds target is a
    /// silent no-op.
    pub fn set_letter(&mut self, (row, col): Pos, letter: Option<char>) {
        if let Some(Cell::Fillable(slot)) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *slot = letter;
        }
    }

    /// Number of fillable cells currently holding a letter.
    pub fn filled_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| matches!(cell, Cell::Fillable(Some(_))))
            .count()
    }

    /// Snapshot of all cell letters, row by row, for persistence.
    pub fn letters(&self) -> Vec<Vec<Option<char>>> {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Cell::Fillable(letter) => *letter,
                        Cell::Blocked => None,
                    })
                    .collect()
            })
            .collect()
    }

    /// Restores a letter snapshot taken with [`GridModel::letters`]. A
    /// snapshot whose dimensions do not match this grid is ignored, as are
    /// letters recorded against cells that are blocked in this layout.
    pub fn restore_letters(&mut self, letters: &[Vec<Option<char>>]) {
        if letters.len() != self.rows() || letters.iter().any(|row| row.len() != self.cols()) {
            return;
        }
        for (r, row) in letters.iter().enumerate() {
            for (c, &letter) in row.iter().enumerate() {
                if letter.is_some() {
                    self.set_letter((r, c), letter);
                }
            }
        }
    }
}

/// Assigns display numbers to every cell that starts an across and/or down
/// entry, scanning in row-major order with a single counter starting at 1.
///
/// A cell starts an across entry when it has no fillable cell to its left and
/// a fillable cell to its right; down is the vertical analogue. A cell
/// qualifying in both directions still receives one number.
pub fn derive_numbering(grid: &GridModel) -> HashMap<Pos, u32> {
    let mut numbering = HashMap::new();
    let mut next = 1;
    for r in 0..grid.rows() {
        for c in 0..grid.cols() {
            if !grid.is_fillable((r, c)) {
                continue;
            }
            let starts_across =
                (c == 0 || !grid.is_fillable((r, c - 1))) && grid.is_fillable((r, c + 1));
            let starts_down =
                (r == 0 || !grid.is_fillable((r - 1, c))) && grid.is_fillable((r + 1, c));
            if starts_across || starts_down {
                numbering.insert((r, c), next);
                next += 1;
            }
        }
    }
    numbering
}

/// Walks from `anchor` rightward (across) or downward (down) through
/// consecutive fillable cells, returning the entry's cell positions in order.
///
/// A blocked or out-of-bounds anchor yields `DegenerateSpan`. Anchors taken
/// from [`derive_numbering`] are always fillable, so hitting that error means
/// the caller fed inconsistent data.
pub fn resolve_span(
    grid: &GridModel,
    anchor: Pos,
    dir: Direction,
) -> Result<Vec<Pos>, CrosswordError> {
    if !grid.is_fillable(anchor) {
        return Err(CrosswordError::DegenerateSpan(anchor.0, anchor.1));
    }
    let mut span = Vec::new();
    let (mut r, mut c) = anchor;
    while grid.is_fillable((r, c)) {
        span.push((r, c));
        match dir {
            Direction::Across => c += 1,
            Direction::Down => r += 1,
        }
    }
    Ok(span)
}

/// A keystroke the grid reacts to. Any other key is ignored by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKey {
    Letter(char),
    ArrowRight,
    ArrowLeft,
    ArrowDown,
    ArrowUp,
    Backspace,
}

impl InputKey {
    /// Maps a DOM `KeyboardEvent::key` string. Every single-character key
    /// maps to `Letter` so the grid can swallow it; `apply_key` then rejects
    /// anything that is not a letter.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowRight" => Some(Self::ArrowRight),
            "ArrowLeft" => Some(Self::ArrowLeft),
            "ArrowDown" => Some(Self::ArrowDown),
            "ArrowUp" => Some(Self::ArrowUp),
            "Backspace" => Some(Self::Backspace),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Some(Self::Letter(ch)),
                    _ => None,
                }
            }
        }
    }
}

/// Next fillable cell in row-major reading order: rightward in the current
/// row, then subsequent rows left to right.
pub fn next_fillable(grid: &GridModel, (row, col): Pos) -> Option<Pos> {
    for c in col + 1..grid.cols() {
        if grid.is_fillable((row, c)) {
            return Some((row, c));
        }
    }
    for r in row + 1..grid.rows() {
        for c in 0..grid.cols() {
            if grid.is_fillable((r, c)) {
                return Some((r, c));
            }
        }
    }
    None
}

/// Previous fillable cell in row-major reading order: leftward in the current
/// row, then previous rows right to left.
pub fn prev_fillable(grid: &GridModel, (row, col): Pos) -> Option<Pos> {
    for c in (0..col).rev() {
        if grid.is_fillable((row, c)) {
            return Some((row, c));
        }
    }
    for r in (0..row).rev() {
        for c in (0..grid.cols()).rev() {
            if grid.is_fillable((r, c)) {
                return Some((r, c));
            }
        }
    }
    None
}

/// Nearest fillable cell strictly below in the same column.
pub fn fillable_below(grid: &GridModel, (row, col): Pos) -> Option<Pos> {
    (row + 1..grid.rows()).find_map(|r| grid.is_fillable((r, col)).then_some((r, col)))
}

/// Nearest fillable cell strictly above in the same column.
pub fn fillable_above(grid: &GridModel, (row, col): Pos) -> Option<Pos> {
    (0..row).rev().find_map(|r| grid.is_fillable((r, col)).then_some((r, col)))
}

/// After a letter lands, the cursor jumps to the nearest fillable cell found
/// by growing an offset and testing rightward before downward at each step:
/// (r, c+1), (r+1, c), (r, c+2), (r+2, c), and so on.
pub fn nearest_right_or_down(grid: &GridModel, (row, col): Pos) -> Option<Pos> {
    for offset in 1..=grid.rows().max(grid.cols()) {
        if grid.is_fillable((row, col + offset)) {
            return Some((row, col + offset));
        }
        if grid.is_fillable((row + offset, col)) {
            return Some((row + offset, col));
        }
    }
    None
}

/// Applies one keystroke at the focused cell, mutating the grid as needed,
/// and returns the new focus position. Total for any in-grid focus: when no
/// move is possible the focus stays put.
pub fn apply_key(grid: &mut GridModel, focus: Pos, key: InputKey) -> Pos {
    match key {
        InputKey::Letter(ch) if ch.is_ascii_alphabetic() => {
            grid.set_letter(focus, Some(ch.to_ascii_uppercase()));
            nearest_right_or_down(grid, focus).unwrap_or(focus)
        }
        // Non-letter characters never touch the grid.
        InputKey::Letter(_) => focus,
        InputKey::ArrowRight => next_fillable(grid, focus).unwrap_or(focus),
        InputKey::ArrowLeft => prev_fillable(grid, focus).unwrap_or(focus),
        InputKey::ArrowDown => fillable_below(grid, focus).unwrap_or(focus),
        InputKey::ArrowUp => fillable_above(grid, focus).unwrap_or(focus),
        InputKey::Backspace => {
            if grid.letter_at(focus).is_some() {
                grid.set_letter(focus, None);
                focus
            } else if let Some(prev) = prev_fillable(grid, focus) {
                grid.set_letter(prev, None);
                prev
            } else {
                focus
            }
        }
    }
}

/// A clue as loaded from the backend: identified by `id`, with either an
/// explicit 0-indexed anchor or a number to recover through the numbering
/// map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clue {
    pub id: u32,
    pub text: String,
    pub dir: Direction,
    pub anchor: Option<Pos>,
    pub length: Option<usize>,
}

/// Reconstructs one clue's answer: the letters along its span, in order, with
/// unset cells contributing nothing. An entirely unfilled entry yields `""`.
pub fn clue_answer(
    grid: &GridModel,
    clue: &Clue,
    numbering: &HashMap<Pos, u32>,
) -> Result<String, CrosswordError> {
    let anchor = match clue.anchor {
        Some(pos) => pos,
        None => numbering
            .iter()
            .find(|&(_, &number)| number == clue.id)
            .map(|(&pos, _)| pos)
            .ok_or(CrosswordError::UnresolvableClue(clue.id))?,
    };
    let mut span = resolve_span(grid, anchor, clue.dir)?;
    if let Some(length) = clue.length {
        span.truncate(length);
    }
    Ok(span
        .iter()
        .filter_map(|&pos| grid.letter_at(pos))
        .map(|ch| ch.to_ascii_uppercase())
        .collect())
}

/// Builds the per-clue answer list for submission. A clue whose anchor cannot
/// be located contributes an empty answer rather than failing the batch;
/// partial answers are valid.
pub fn extract_answers(
    grid: &GridModel,
    clues: &[Clue],
    numbering: &HashMap<Pos, u32>,
) -> Vec<(u32, String)> {
    clues
        .iter()
        .map(|clue| {
            let answer = clue_answer(grid, clue, numbering).unwrap_or_else(|err| {
                log!("answer extraction for clue {} failed: {}", clue.id, err);
                String::new()
            });
            (clue.id, answer)
        })
        .collect()
}
