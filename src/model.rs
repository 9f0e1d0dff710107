use std::collections::HashMap;

use leptos::logging::log;
use serde::{Deserialize, Serialize};

use crate::engine::{derive_numbering, Clue, Direction, GridModel, Pos};
use crate::error::CrosswordError;

/// One cell of the backend's `Grid` array. `NumberAssociated` of 0 or absent
/// means "no display number"; `Letter` is only populated by the solution
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellDoc {
    #[serde(rename = "IsBlank")]
    pub is_blank: bool,
    #[serde(rename = "NumberAssociated", default)]
    pub number_associated: Option<u32>,
    #[serde(rename = "Letter", default)]
    pub letter: Option<String>,
}

/// A clue as the backend ships it. `Row`/`Col` are 1-indexed when present;
/// when the backend omits them, the clue's anchor is recovered by matching
/// `ClueID` against the numbering map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClueDoc {
    #[serde(rename = "ClueID")]
    pub id: u32,
    #[serde(rename = "ClueText")]
    pub text: String,
    #[serde(rename = "Row", default)]
    pub row: Option<u32>,
    #[serde(rename = "Col", default)]
    pub col: Option<u32>,
    #[serde(rename = "Length", default)]
    pub length: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClueGroupsDoc {
    #[serde(rename = "Across", default)]
    pub across: Vec<ClueDoc>,
    #[serde(rename = "Down", default)]
    pub down: Vec<ClueDoc>,
}

/// The `GET /crossword` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleDoc {
    #[serde(rename = "CrosswordID", default)]
    pub id: Option<u32>,
    #[serde(rename = "Grid")]
    pub grid: Vec<Vec<CellDoc>>,
    #[serde(rename = "Clues", default)]
    pub clues: ClueGroupsDoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionEntryDoc {
    #[serde(rename = "ClueID")]
    pub id: u32,
    #[serde(rename = "ClueText")]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolutionAnswersDoc {
    #[serde(rename = "sol", default)]
    pub sol: Vec<SolutionEntryDoc>,
}

/// The `POST /getsolution` response body: the published puzzle (its grid
/// cells carrying solution letters) plus the per-clue answer list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionDoc {
    #[serde(rename = "crossword")]
    pub crossword: PuzzleDoc,
    #[serde(rename = "solution", default)]
    pub solution: SolutionAnswersDoc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponseDoc {
    #[serde(default)]
    pub message: String,
}

/// A loaded puzzle, ready for play: the grid layout, the clue lists in
/// backend order (across then down), and both numbering maps.
///
/// `numbering` is what gets displayed and what anchor recovery consults:
/// backend-supplied numbers verbatim when any are present, the self-derived
/// map otherwise. `derived_numbering` is always the self-derived map.
#[derive(Clone, Debug)]
pub struct Puzzle {
    pub id: u32,
    pub grid: GridModel,
    pub clues: Vec<Clue>,
    pub numbering: HashMap<Pos, u32>,
    pub derived_numbering: HashMap<Pos, u32>,
}

impl Puzzle {
    /// Validates and converts a backend puzzle document. The grid must be
    /// rectangular and non-empty, and every clue either carries both of
    /// `Row`/`Col` (1-indexed) or neither.
    pub fn from_doc(doc: &PuzzleDoc) -> Result<Self, CrosswordError> {
        let mask: Vec<Vec<bool>> = doc
            .grid
            .iter()
            .map(|row| row.iter().map(|cell| cell.is_blank).collect())
            .collect();
        let grid = GridModel::from_mask(&mask)?;

        let derived_numbering = derive_numbering(&grid);
        let mut supplied = HashMap::new();
        for (r, row) in doc.grid.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell.number_associated {
                    Some(number) if number > 0 => {
                        supplied.insert((r, c), number);
                    }
                    _ => {}
                }
            }
        }
        let numbering = if supplied.is_empty() {
            derived_numbering.clone()
        } else {
            if supplied != derived_numbering {
                // Backend numbers win for display; the derived map stays
                // available as the fallback.
                log!("backend cell numbering disagrees with the derived numbering");
            }
            supplied
        };

        let mut clues = Vec::with_capacity(doc.clues.across.len() + doc.clues.down.len());
        for clue_doc in &doc.clues.across {
            clues.push(clue_from_doc(clue_doc, Direction::Across)?);
        }
        for clue_doc in &doc.clues.down {
            clues.push(clue_from_doc(clue_doc, Direction::Down)?);
        }

        Ok(Self {
            id: doc.id.unwrap_or(1),
            grid,
            clues,
            numbering,
            derived_numbering,
        })
    }

    pub fn across_clues(&self) -> impl Iterator<Item = &Clue> {
        self.clues.iter().filter(|c| c.dir == Direction::Across)
    }

    pub fn down_clues(&self) -> impl Iterator<Item = &Clue> {
        self.clues.iter().filter(|c| c.dir == Direction::Down)
    }
}

fn clue_from_doc(doc: &ClueDoc, dir: Direction) -> Result<Clue, CrosswordError> {
    let anchor = match (doc.row, doc.col) {
        (Some(row), Some(col)) if row >= 1 && col >= 1 => {
            Some(((row - 1) as usize, (col - 1) as usize))
        }
        (None, None) => None,
        _ => {
            return Err(CrosswordError::InvalidLayout(format!(
                "clue {} has malformed coordinates",
                doc.id
            )))
        }
    };
    Ok(Clue {
        id: doc.id,
        text: doc.text.clone(),
        dir,
        anchor,
        length: doc.length.map(|l| l as usize),
    })
}
