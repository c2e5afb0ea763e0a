use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StageError {
    #[error("unknown session stage: {0}")]
    Unknown(String),
    #[error("unknown record provenance: {0}")]
    UnknownProvenance(String),
}

//
// ─── STAGE ─────────────────────────────────────────────────────────────────────
//

/// The three rolling stages a page moves through.
///
/// - `Jadeed`: new material; a single advancing ending-page pointer
/// - `Juzhali`: the rolling window of the most recently learned pages
/// - `Murajaat`: pages that aged out of the window, reviewed long-term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Jadeed,
    Juzhali,
    Murajaat,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Jadeed, Stage::Juzhali, Stage::Murajaat];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Jadeed => "Jadeed",
            Stage::Juzhali => "Juzhali",
            Stage::Murajaat => "Murajaat",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = StageError;

    /// Case-insensitive; legacy sheets wrote both `Jadeed` and `jadeed`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jadeed" => Ok(Stage::Jadeed),
            "juzhali" => Ok(Stage::Juzhali),
            "murajaat" => Ok(Stage::Murajaat),
            _ => Err(StageError::Unknown(s.to_owned())),
        }
    }
}

//
// ─── PROVENANCE ────────────────────────────────────────────────────────────────
//

/// Which historical record family a reconciled record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Marks-only records (spreadsheet uploads). No mistake counts.
    Basic,
    /// Full mistake-tracking records entered session by session.
    Detailed,
}

impl Provenance {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Basic => "basic",
            Provenance::Detailed => "detailed",
        }
    }

    /// Whether records of this family carry mistake-count fields at all.
    #[must_use]
    pub fn tracks_mistakes(self) -> bool {
        matches!(self, Provenance::Detailed)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provenance {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "basic" | "upload" => Ok(Provenance::Basic),
            "detailed" | "session_entry" => Ok(Provenance::Detailed),
            other => Err(StageError::UnknownProvenance(other.to_owned())),
        }
    }
}

/// How many records of each family a student has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFormatInfo {
    pub basic_count: u64,
    pub detailed_count: u64,
}

impl DataFormatInfo {
    #[must_use]
    pub fn new(basic_count: u64, detailed_count: u64) -> Self {
        Self {
            basic_count,
            detailed_count,
        }
    }

    #[must_use]
    pub fn has_basic(&self) -> bool {
        self.basic_count > 0
    }

    /// Whether mistake analytics can be shown at all.
    #[must_use]
    pub fn has_detailed(&self) -> bool {
        self.detailed_count > 0
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.basic_count + self.detailed_count
    }
}
